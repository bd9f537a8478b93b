//! Creation contract, edge registration, removal, and the mutation API.

use std::collections::BTreeSet;

use nalgebra::{Matrix3, Vector3};
use tracing::{debug, trace};

use super::types::{ElementClass, ElementKind, Geometry, Graph, Node, NodeId, NodeState, Rule, Slot};
use crate::coords::{Coords, Viewport};
use crate::error::GraphError;
use crate::intersect::{branch_count, BranchCount};
use crate::locus::{Conic, Locus};

/// Parent class accepted at one position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Want {
    Point,
    Line,
    Circle,
    Locus,
}

impl Want {
    fn accepts(self, class: ElementClass) -> bool {
        match self {
            Want::Point => class == ElementClass::Point,
            Want::Line => class == ElementClass::Line,
            Want::Circle => class == ElementClass::Circle,
            Want::Locus => class != ElementClass::Point,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Want::Point => "point",
            Want::Line => "line",
            Want::Circle => "circle",
            Want::Locus => "line, circle, conic, arc or curve",
        }
    }
}

fn finite(v: f64, what: &str) -> Result<f64, GraphError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(GraphError::InvalidParam(format!("{what} must be finite, got {v}")))
    }
}

pub(crate) fn checked_viewport(vp: Viewport) -> Result<Viewport, GraphError> {
    if vp.is_valid() {
        Ok(vp)
    } else {
        Err(GraphError::InvalidParam(format!("viewport needs finite values and non-zero units, got {vp:?}")))
    }
}

impl Graph {
    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.slots
            .get(id.index())
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
            .ok_or(GraphError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
            .ok_or(GraphError::UnknownNode(id))
    }

    fn class_of(&self, id: NodeId) -> Result<ElementClass, GraphError> {
        self.node(id).map(|n| n.class)
    }

    /// Checks arity and parent classes; `wants` of `None` accepts any count of points.
    fn check_parents(&self, kind: &ElementKind, parents: &[NodeId], wants: Option<&[Want]>) -> Result<(), GraphError> {
        let name = kind.name();
        if let Some(wants) = wants {
            if wants.len() != parents.len() {
                return Err(GraphError::Arity {
                    kind: name,
                    expected: wants.len(),
                    got: parents.len(),
                });
            }
        }
        for (index, &p) in parents.iter().enumerate() {
            let want = wants.map_or(Want::Point, |w| w[index]);
            let found = self.class_of(p)?;
            if !want.accepts(found) {
                return Err(GraphError::ParentType {
                    kind: name,
                    index,
                    found,
                    expected: want.name(),
                });
            }
        }
        Ok(())
    }

    /// Validates `kind` against `parents` and turns it into a rule plus initial geometry.
    fn validate(&self, kind: &ElementKind, parents: &[NodeId]) -> Result<(Rule, Geometry), GraphError> {
        use Want as W;
        let point = Geometry::Point(None);
        let locus = Geometry::Locus(None);
        let wants: Option<&[Want]> = match kind {
            ElementKind::FreePoint { .. } | ElementKind::EvaluatedPoint { .. } | ElementKind::FreeConic(_) => Some(&[][..]),
            ElementKind::Midpoint | ElementKind::CircleThroughPoint | ElementKind::Line { .. } => {
                Some(&[W::Point, W::Point][..])
            }
            ElementKind::ProjectToLine => Some(&[W::Point, W::Line][..]),
            ElementKind::ProjectToCircle => Some(&[W::Point, W::Circle][..]),
            ElementKind::PointFunction(_) | ElementKind::Curve { .. } => None,
            ElementKind::Intersection { .. } => Some(&[W::Locus, W::Locus][..]),
            ElementKind::OtherIntersection { .. } => Some(&[W::Locus, W::Locus, W::Point][..]),
            ElementKind::CircleByRadius(_) => Some(&[W::Point][..]),
            ElementKind::Circumcircle | ElementKind::Arc => Some(&[W::Point, W::Point, W::Point][..]),
            ElementKind::ConicThroughFive => Some(&[W::Point, W::Point, W::Point, W::Point, W::Point][..]),
        };
        self.check_parents(kind, parents, wants)?;

        Ok(match kind.clone() {
            ElementKind::FreePoint { x, y } => {
                let c = Coords::from_xy(finite(x, "x")?, finite(y, "y")?, &self.viewport);
                (Rule::Free, Geometry::Point(Some(c)))
            }
            ElementKind::EvaluatedPoint { x, y } => (Rule::Evaluated { x, y }, point),
            ElementKind::Midpoint => (Rule::Midpoint, point),
            ElementKind::ProjectToLine => (Rule::ProjectToLine, point),
            ElementKind::ProjectToCircle => (Rule::ProjectToCircle, point),
            ElementKind::PointFunction(f) => (Rule::Function(f), point),
            ElementKind::Intersection {
                branch,
                always_intersect,
            } => {
                let (a, b) = (self.class_of(parents[0])?, self.class_of(parents[1])?);
                if let (Some(ca), Some(cb)) = (a.locus(), b.locus()) {
                    let count = branch_count(ca, cb);
                    if !count.admits(branch) {
                        let n = match count {
                            BranchCount::Fixed(n) => n,
                            BranchCount::Unbounded => usize::MAX,
                        };
                        return Err(GraphError::BranchOutOfRange {
                            i: branch.i,
                            j: branch.j,
                            count: n,
                        });
                    }
                }
                (
                    Rule::Intersection {
                        branch,
                        always_intersect,
                    },
                    point,
                )
            }
            ElementKind::OtherIntersection { always_intersect } => (Rule::OtherIntersection { always_intersect }, point),
            ElementKind::Line {
                straight_first,
                straight_last,
            } => (
                Rule::Line {
                    straight_first,
                    straight_last,
                },
                locus,
            ),
            ElementKind::CircleByRadius(r) => {
                if !(finite(r, "radius")? >= 0.0) {
                    return Err(GraphError::InvalidParam(format!("radius must be non-negative, got {r}")));
                }
                (Rule::CircleByRadius(r), locus)
            }
            ElementKind::CircleThroughPoint => (Rule::CircleThroughPoint, locus),
            ElementKind::Circumcircle => (Rule::Circumcircle, locus),
            ElementKind::FreeConic(m) => {
                if m.iter().any(|v| !v.is_finite()) {
                    return Err(GraphError::InvalidParam("conic matrix must be finite".into()));
                }
                (Rule::Free, Geometry::Locus(Some(Locus::Conic(Conic::new(m)))))
            }
            ElementKind::ConicThroughFive => (Rule::ConicThroughFive, locus),
            ElementKind::Arc => (Rule::Arc, locus),
            ElementKind::Curve { x, y, t_min, t_max } => {
                finite(t_min, "t_min")?;
                finite(t_max, "t_max")?;
                (Rule::Curve { x, y, t_min, t_max }, locus)
            }
        })
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.vacant.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId { index, generation: 0 }
            }
        }
    }

    /// Creates an element: validates parents, registers the parent → child
    /// edges, and computes the initial geometry.
    pub fn create(&mut self, kind: ElementKind, parents: &[NodeId]) -> Result<NodeId, GraphError> {
        let (rule, geometry) = self.validate(&kind, parents)?;
        let id = self.alloc(Node {
            class: kind.class(),
            rule,
            parents: parents.to_vec(),
            children: BTreeSet::new(),
            followers: BTreeSet::new(),
            state: NodeState::Dirty,
            geometry,
            touched: false,
            recomputes: 0,
        });
        for &p in parents {
            self.node_mut(p)?.children.insert(id);
        }
        self.recompute(id)?;
        self.redraw.push(id);
        debug!(?id, kind = kind.name(), parents = parents.len(), "created element");
        Ok(id)
    }

    /// Whether `to` is reachable from `from` along child edges.
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = BTreeSet::new();
        while let Some(n) = stack.pop() {
            if n == to {
                return true;
            }
            if !seen.insert(n) {
                continue;
            }
            if let Ok(node) = self.node(n) {
                stack.extend(node.successors());
            }
        }
        false
    }

    /// Adds an ordering edge `parent → child` on top of the edges the rules
    /// imply. Rejects edges that would close a cycle.
    ///
    /// When `child` does not read `parent`, the edge only orders walks: the
    /// child is not removed together with `parent`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        let reads = self.node(child)?.parents.contains(&parent);
        self.node(parent)?;
        if self.reaches(child, parent) {
            return Err(GraphError::Cycle { at: child });
        }
        let node = self.node_mut(parent)?;
        if reads {
            node.children.insert(child);
        } else {
            node.followers.insert(child);
        }
        Ok(())
    }

    /// Inserts an edge without the cycle check.
    #[cfg(test)]
    pub(crate) fn link_unchecked(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        self.node_mut(parent)?.children.insert(child);
        Ok(())
    }

    /// `roots` and every node a walk from them visits.
    pub(crate) fn descendants(&self, roots: &[NodeId]) -> Result<BTreeSet<NodeId>, GraphError> {
        self.closure(roots, true)
    }

    fn closure(&self, roots: &[NodeId], with_followers: bool) -> Result<BTreeSet<NodeId>, GraphError> {
        let mut closure = BTreeSet::new();
        let mut stack: Vec<NodeId> = roots.to_vec();
        while let Some(n) = stack.pop() {
            let node = self.node(n)?;
            if closure.insert(n) {
                stack.extend(node.children.iter().copied());
                if with_followers {
                    stack.extend(node.followers.iter().copied());
                }
            }
        }
        Ok(closure)
    }

    /// Removes `id` together with every element that reads it, directly or
    /// through other elements; returns the removed ids.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        let doomed = self.closure(&[id], false)?;
        for &d in &doomed {
            let slot = &mut self.slots[d.index()];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.vacant.push(d.index);
        }
        for slot in &mut self.slots {
            if let Some(node) = slot.node.as_mut() {
                node.children.retain(|c| !doomed.contains(c));
                node.followers.retain(|c| !doomed.contains(c));
            }
        }
        self.dirty.retain(|d| !doomed.contains(d));
        self.redraw.retain(|d| !doomed.contains(d));
        debug!(?id, removed = doomed.len(), "removed element");
        Ok(doomed.into_iter().collect())
    }

    fn free_node_mut(&mut self, id: NodeId, class: ElementClass) -> Result<&mut Node, GraphError> {
        let node = self.node_mut(id)?;
        if !node.is_free() || node.class != class {
            return Err(GraphError::NotFree(id));
        }
        Ok(node)
    }

    fn place(&mut self, id: NodeId, coords: Coords) -> Result<(), GraphError> {
        if !(coords.x().is_finite() && coords.y().is_finite()) {
            return Err(GraphError::InvalidParam(format!("position of {id:?} is not finite")));
        }
        let node = self.free_node_mut(id, ElementClass::Point)?;
        node.geometry = Geometry::Point(Some(coords));
        node.touched = true;
        trace!(?id, x = coords.x(), y = coords.y(), "moved free point");
        self.mark_dirty(id)
    }

    /// Moves a free point (user coordinates) and queues it for the next walk.
    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<(), GraphError> {
        let c = Coords::from_xy(finite(x, "x")?, finite(y, "y")?, &self.viewport);
        self.place(id, c)
    }

    /// Moves a free point to homogeneous user coordinates `[w, x, y]`.
    ///
    /// Free points are always finite, so `w ≈ 0` is rejected.
    pub fn set_user_position(&mut self, id: NodeId, u: Vector3<f64>) -> Result<(), GraphError> {
        let (w, x, y) = (finite(u[0], "w")?, finite(u[1], "x")?, finite(u[2], "y")?);
        let c = Coords::from_user(w, x, y, &self.viewport, self.cfg.eps);
        if c.is_ideal() {
            return Err(GraphError::InvalidParam(format!("free point {id:?} cannot be ideal")));
        }
        self.place(id, c)
    }

    /// Moves a free point to a screen position (pixels).
    pub fn set_screen_position(&mut self, id: NodeId, sx: f64, sy: f64) -> Result<(), GraphError> {
        let c = Coords::from_screen(finite(sx, "sx")?, finite(sy, "sy")?, &self.viewport);
        self.place(id, c)
    }

    /// Replaces the matrix of a free conic (symmetrized) and queues it.
    pub fn set_matrix(&mut self, id: NodeId, m: Matrix3<f64>) -> Result<(), GraphError> {
        if m.iter().any(|v| !v.is_finite()) {
            return Err(GraphError::InvalidParam("conic matrix must be finite".into()));
        }
        let node = self.free_node_mut(id, ElementClass::Conic)?;
        node.geometry = Geometry::Locus(Some(Locus::Conic(Conic::new(m))));
        node.touched = true;
        self.mark_dirty(id)
    }

    /// Switches the viewport: every point is reprojected and queued for redraw.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), GraphError> {
        let viewport = checked_viewport(viewport)?;
        self.viewport = viewport;
        let mut points = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(node) = slot.node.as_mut() {
                if node.class == ElementClass::Point {
                    node.geometry.reproject(&viewport);
                    points.push(NodeId {
                        index: index as u32,
                        generation: slot.generation,
                    });
                }
            }
        }
        for id in points {
            if !self.redraw.contains(&id) {
                self.redraw.push(id);
            }
        }
        debug!(?viewport, "viewport changed");
        Ok(())
    }

    /// Marks `id` dirty and queues it for `update_dirty`.
    pub fn mark_dirty(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.node_mut(id)?.state = NodeState::Dirty;
        self.dirty.insert(id);
        Ok(())
    }
}
