//! Topological update walk, per-rule recomputation, and queries.

use std::collections::{BTreeMap, VecDeque};

use nalgebra::Vector2;
use tracing::{debug, trace};

use super::types::{Diagnostics, ElementClass, Geometry, Graph, NodeId, NodeState, Rule};
use crate::cfg::GeomCfg;
use crate::coords::{CoordSpace, Coords, Viewport};
use crate::error::GraphError;
use crate::intersect::{meet, other_intersection};
use crate::locus::{Circle, CircleArc, Conic, Curve, Line, Locus};

/// Finite position of every point parent, or `None` if any is missing.
fn points(parents: &[Geometry]) -> Option<Vec<Vector2<f64>>> {
    parents.iter().map(Geometry::point).collect()
}

fn loci(parents: &[Geometry]) -> Option<(&Locus, &Locus)> {
    Some((parents.first()?.locus()?, parents.get(1)?.locus()?))
}

/// Output of one rule evaluation.
struct Computed {
    geometry: Geometry,
    converged: bool,
}

impl Computed {
    fn point(p: Option<Vector2<f64>>, vp: &Viewport) -> Self {
        let p = p.filter(|p| p.x.is_finite() && p.y.is_finite());
        Self {
            geometry: Geometry::Point(p.map(|p| Coords::from_point(p, vp))),
            converged: true,
        }
    }

    fn locus(l: Option<Locus>) -> Self {
        Self {
            geometry: Geometry::Locus(l),
            converged: true,
        }
    }
}

/// Evaluates `rule` over the current parent geometries.
fn evaluate(rule: &Rule, current: &Geometry, parents: &[Geometry], cfg: &GeomCfg, vp: &Viewport) -> Computed {
    let eps = cfg.eps;
    match rule {
        Rule::Free => Computed {
            geometry: current.clone(),
            converged: true,
        },
        Rule::Evaluated { x, y } => Computed::point(Some(Vector2::new(x(), y())), vp),
        Rule::Midpoint => Computed::point(points(parents).map(|p| (p[0] + p[1]) * 0.5), vp),
        Rule::ProjectToLine => {
            let p = parents[0].point();
            let l = match parents[1].locus() {
                Some(Locus::Line(l)) => Some(l),
                _ => None,
            };
            Computed::point(p.zip(l).map(|(p, l)| l.project(p)), vp)
        }
        Rule::ProjectToCircle => {
            let p = parents[0].point();
            let c = match parents[1].locus() {
                Some(Locus::Circle(c)) => Some(c),
                _ => None,
            };
            Computed::point(p.zip(c).and_then(|(p, c)| c.project(p, eps)), vp)
        }
        Rule::Function(f) => Computed::point(points(parents).and_then(|p| f(&p)), vp),
        Rule::Intersection {
            branch,
            always_intersect,
        } => match loci(parents) {
            Some((a, b)) => {
                let m = meet(a, b, *branch, *always_intersect, cfg);
                Computed {
                    converged: m.converged,
                    ..Computed::point(m.point, vp)
                }
            }
            None => Computed::point(None, vp),
        },
        Rule::OtherIntersection { always_intersect } => match (loci(parents), parents.get(2).and_then(Geometry::point)) {
            (Some((a, b)), Some(reference)) => {
                let m = other_intersection(a, b, reference, *always_intersect, cfg);
                Computed {
                    converged: m.converged,
                    ..Computed::point(m.point, vp)
                }
            }
            _ => Computed::point(None, vp),
        },
        Rule::Line {
            straight_first,
            straight_last,
        } => Computed::locus(points(parents).and_then(|p| {
            Line::through(p[0], p[1], eps).map(|l| Locus::Line(l.with_bounds(*straight_first, *straight_last)))
        })),
        Rule::CircleByRadius(r) => Computed::locus(points(parents).map(|p| Locus::Circle(Circle::new(p[0], *r)))),
        Rule::CircleThroughPoint => Computed::locus(
            points(parents).map(|p| Locus::Circle(Circle::new(p[0], (p[1] - p[0]).norm()))),
        ),
        Rule::Circumcircle => {
            Computed::locus(points(parents).and_then(|p| Circle::through_three(p[0], p[1], p[2], eps).map(Locus::Circle)))
        }
        Rule::ConicThroughFive => Computed::locus(points(parents).and_then(|p| {
            let five = [p[0], p[1], p[2], p[3], p[4]];
            Conic::through_five(&five, eps).map(Locus::Conic)
        })),
        Rule::Arc => Computed::locus(
            points(parents).and_then(|p| CircleArc::from_points(p[0], p[1], p[2], eps).map(Locus::Arc)),
        ),
        Rule::Curve { x, y, t_min, t_max } => Computed::locus(
            points(parents).map(|p| Locus::Curve(Curve::new(x.clone(), y.clone(), *t_min, *t_max, p))),
        ),
    }
}

impl Graph {
    /// Recomputes one node from its parents; returns whether its geometry changed.
    pub(crate) fn recompute(&mut self, id: NodeId) -> Result<bool, GraphError> {
        let node = self.node(id)?;
        let parents: Vec<Geometry> = node
            .parents
            .iter()
            .map(|&p| self.node(p).map(|n| n.geometry.clone()))
            .collect::<Result<_, _>>()?;
        let computed = evaluate(&node.rule, &node.geometry, &parents, &self.cfg, &self.viewport);
        if !computed.converged {
            self.diagnostics.non_converged += 1;
        }
        self.diagnostics.recomputations += 1;

        let node = self.node_mut(id)?;
        let changed = node.geometry != computed.geometry || std::mem::take(&mut node.touched);
        node.geometry = computed.geometry;
        node.state = NodeState::Clean;
        node.recomputes += 1;
        trace!(?id, changed, exists = node.geometry.exists(), "recomputed");
        Ok(changed)
    }

    /// Visit order for the descendant closure of `roots` (Kahn's algorithm).
    ///
    /// In-degrees only count edges inside the closure. Fails with `Cycle` when
    /// the order cannot cover the closure.
    pub(crate) fn walk_order(&self, roots: &[NodeId]) -> Result<Vec<NodeId>, GraphError> {
        let closure = self.descendants(roots)?;
        let mut indegree: BTreeMap<NodeId, usize> = closure.iter().map(|&n| (n, 0)).collect();
        for &n in &closure {
            for c in self.node(n)?.successors() {
                if let Some(d) = indegree.get_mut(&c) {
                    *d += 1;
                }
            }
        }
        let mut queue: VecDeque<NodeId> = indegree.iter().filter(|(_, &d)| d == 0).map(|(&n, _)| n).collect();
        let mut order = Vec::with_capacity(closure.len());
        while let Some(n) = queue.pop_front() {
            order.push(n);
            for c in self.node(n)?.successors() {
                if let Some(d) = indegree.get_mut(&c) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(c);
                    }
                }
            }
        }
        if order.len() < closure.len() {
            let stuck = indegree
                .iter()
                .find(|(_, &d)| d > 0)
                .map(|(&n, _)| n)
                .unwrap_or(roots[0]);
            return Err(GraphError::Cycle { at: stuck });
        }
        Ok(order)
    }

    /// Recomputes `roots` and all of their descendants in dependency order.
    ///
    /// Each node is visited at most once. Nodes whose geometry changed are
    /// returned in visit order and appended to the redraw list. On a cycle
    /// nothing is recomputed.
    pub fn update(&mut self, roots: &[NodeId]) -> Result<Vec<NodeId>, GraphError> {
        if roots.is_empty() {
            return Ok(Vec::new());
        }
        let order = self.walk_order(roots)?;
        debug!(roots = roots.len(), visited = order.len(), "update walk");
        let mut changed = Vec::new();
        for &id in &order {
            if self.recompute(id)? {
                changed.push(id);
            }
            self.dirty.remove(&id);
        }
        for &id in &changed {
            if !self.redraw.contains(&id) {
                self.redraw.push(id);
            }
        }
        self.diagnostics.walks += 1;
        debug!(changed = changed.len(), "update walk finished");
        Ok(changed)
    }

    /// Walks from every node queued by `mark_dirty`.
    pub fn update_dirty(&mut self) -> Result<Vec<NodeId>, GraphError> {
        let roots: Vec<NodeId> = self.dirty.iter().copied().collect();
        self.update(&roots)
    }

    /// Marks `nodes` dirty and walks; returns the nodes whose geometry changed.
    pub fn notify_changed(&mut self, nodes: &[NodeId]) -> Result<Vec<NodeId>, GraphError> {
        for &n in nodes {
            self.mark_dirty(n)?;
        }
        self.update_dirty()
    }

    /// Drains the list of nodes to redraw.
    pub fn take_redraw(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.redraw)
    }

    pub fn class(&self, id: NodeId) -> Result<ElementClass, GraphError> {
        self.node(id).map(|n| n.class)
    }

    pub fn parents(&self, id: NodeId) -> Result<&[NodeId], GraphError> {
        self.node(id).map(|n| n.parents.as_slice())
    }

    /// Elements that read `id` in their rule.
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.node(id).map(|n| n.children.iter().copied().collect())
    }

    /// Ordering-only successors added by `add_child`.
    pub fn followers(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.node(id).map(|n| n.followers.iter().copied().collect())
    }

    pub fn state(&self, id: NodeId) -> Result<NodeState, GraphError> {
        self.node(id).map(|n| n.state)
    }

    pub fn geometry(&self, id: NodeId) -> Result<&Geometry, GraphError> {
        self.node(id).map(|n| &n.geometry)
    }

    pub fn recompute_count(&self, id: NodeId) -> Result<u64, GraphError> {
        self.node(id).map(|n| n.recomputes)
    }

    /// Position of a point; `None` when it does not exist.
    pub fn coords(&self, id: NodeId) -> Result<Option<Coords>, GraphError> {
        match self.node(id)?.geometry {
            Geometry::Point(c) => Ok(c),
            Geometry::Locus(_) => Err(GraphError::InvalidParam(format!("{id:?} is not a point"))),
        }
    }

    /// User x of a point; `None` when it does not exist.
    pub fn x(&self, id: NodeId) -> Result<Option<f64>, GraphError> {
        Ok(self.coords(id)?.map(|c| c.x()))
    }

    pub fn y(&self, id: NodeId) -> Result<Option<f64>, GraphError> {
        Ok(self.coords(id)?.map(|c| c.y()))
    }

    /// Current locus of a line, circle, conic, arc or curve.
    pub fn locus(&self, id: NodeId) -> Result<Option<&Locus>, GraphError> {
        match &self.node(id)?.geometry {
            Geometry::Locus(l) => Ok(l.as_ref()),
            Geometry::Point(_) => Err(GraphError::InvalidParam(format!("{id:?} is not a locus"))),
        }
    }

    /// Distance between two points; `+∞` when either is missing or ideal.
    pub fn distance(&self, a: NodeId, b: NodeId, space: CoordSpace) -> Result<f64, GraphError> {
        Ok(match (self.coords(a)?, self.coords(b)?) {
            (Some(p), Some(q)) => p.distance(&q, space),
            _ => f64::INFINITY,
        })
    }

    /// Whether `id` is live and its geometry exists.
    pub fn exists(&self, id: NodeId) -> bool {
        self.node(id).map_or(false, |n| n.geometry.exists())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Live node ids in arena order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, s)| {
            s.node.as_ref().map(|_| NodeId {
                index: index as u32,
                generation: s.generation,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn cfg(&self) -> &GeomCfg {
        &self.cfg
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }
}
