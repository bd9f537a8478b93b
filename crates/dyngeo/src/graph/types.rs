//! Data types for the dependency graph: ids, element kinds, update rules, nodes.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use nalgebra::{Matrix3, Vector2};

use super::build::checked_viewport;
use crate::cfg::GeomCfg;
use crate::coords::{Coords, Viewport};
use crate::error::GraphError;
use crate::intersect::Branch;
use crate::locus::{CurveFn, Locus, LocusClass};

/// User function computing a point from its parent points (in parent order).
pub type PointFn = Arc<dyn Fn(&[Vector2<f64>]) -> Option<Vector2<f64>> + Send + Sync>;
/// Opaque scalar producer for evaluated points; re-read on every recomputation.
pub type Evaluator = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Generation-checked handle into the graph arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// Element class of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementClass {
    Point,
    Line,
    Circle,
    Conic,
    Arc,
    Curve,
}

impl ElementClass {
    /// Locus class for intersection dispatch; `None` for points.
    pub fn locus(&self) -> Option<LocusClass> {
        match self {
            ElementClass::Point => None,
            ElementClass::Line => Some(LocusClass::Line),
            ElementClass::Circle => Some(LocusClass::Circle),
            ElementClass::Conic => Some(LocusClass::Conic),
            ElementClass::Arc => Some(LocusClass::Arc),
            ElementClass::Curve => Some(LocusClass::Curve),
        }
    }
}

/// Creation input: what to build and from which parents.
///
/// Parent arity and classes are listed per variant; `Graph::create` checks
/// them before anything is inserted.
#[derive(Clone)]
pub enum ElementKind {
    /// No parents.
    FreePoint { x: f64, y: f64 },
    /// No parents; coordinates come from the evaluators.
    EvaluatedPoint { x: Evaluator, y: Evaluator },
    /// Two points.
    Midpoint,
    /// Point, line.
    ProjectToLine,
    /// Point, circle.
    ProjectToCircle,
    /// Any number of points.
    PointFunction(PointFn),
    /// Two loci.
    Intersection { branch: Branch, always_intersect: bool },
    /// Two loci, then the point to avoid.
    OtherIntersection { always_intersect: bool },
    /// Two points. `straight_first`/`straight_last` extend past the first and
    /// second point respectively.
    Line { straight_first: bool, straight_last: bool },
    /// Center point.
    CircleByRadius(f64),
    /// Center, point on the circle.
    CircleThroughPoint,
    /// Three points.
    Circumcircle,
    /// No parents; symmetric matrix, settable with `Graph::set_matrix`.
    FreeConic(Matrix3<f64>),
    /// Five points.
    ConicThroughFive,
    /// Center, start point (fixes the radius), end-direction point.
    Arc,
    /// Any number of points, passed to the coordinate functions.
    Curve { x: CurveFn, y: CurveFn, t_min: f64, t_max: f64 },
}

impl ElementKind {
    pub fn infinite_line() -> Self {
        ElementKind::Line {
            straight_first: true,
            straight_last: true,
        }
    }

    pub fn segment() -> Self {
        ElementKind::Line {
            straight_first: false,
            straight_last: false,
        }
    }

    pub fn ray() -> Self {
        ElementKind::Line {
            straight_first: false,
            straight_last: true,
        }
    }

    pub fn intersection(i: usize) -> Self {
        ElementKind::Intersection {
            branch: Branch::new(i),
            always_intersect: false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::FreePoint { .. } => "free point",
            ElementKind::EvaluatedPoint { .. } => "evaluated point",
            ElementKind::Midpoint => "midpoint",
            ElementKind::ProjectToLine => "projection onto line",
            ElementKind::ProjectToCircle => "projection onto circle",
            ElementKind::PointFunction(_) => "point function",
            ElementKind::Intersection { .. } => "intersection",
            ElementKind::OtherIntersection { .. } => "other intersection",
            ElementKind::Line { .. } => "line",
            ElementKind::CircleByRadius(_) => "circle by radius",
            ElementKind::CircleThroughPoint => "circle through point",
            ElementKind::Circumcircle => "circumcircle",
            ElementKind::FreeConic(_) => "free conic",
            ElementKind::ConicThroughFive => "conic through five points",
            ElementKind::Arc => "arc",
            ElementKind::Curve { .. } => "curve",
        }
    }

    pub fn class(&self) -> ElementClass {
        match self {
            ElementKind::FreePoint { .. }
            | ElementKind::EvaluatedPoint { .. }
            | ElementKind::Midpoint
            | ElementKind::ProjectToLine
            | ElementKind::ProjectToCircle
            | ElementKind::PointFunction(_)
            | ElementKind::Intersection { .. }
            | ElementKind::OtherIntersection { .. } => ElementClass::Point,
            ElementKind::Line { .. } => ElementClass::Line,
            ElementKind::CircleByRadius(_) | ElementKind::CircleThroughPoint | ElementKind::Circumcircle => {
                ElementClass::Circle
            }
            ElementKind::FreeConic(_) | ElementKind::ConicThroughFive => ElementClass::Conic,
            ElementKind::Arc => ElementClass::Arc,
            ElementKind::Curve { .. } => ElementClass::Curve,
        }
    }
}

impl fmt::Debug for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a node recomputes its geometry from its parents.
#[derive(Clone)]
pub enum Rule {
    /// Geometry is authoritative and only changed through the mutation API.
    Free,
    Evaluated { x: Evaluator, y: Evaluator },
    Midpoint,
    ProjectToLine,
    ProjectToCircle,
    Function(PointFn),
    Intersection { branch: Branch, always_intersect: bool },
    OtherIntersection { always_intersect: bool },
    Line { straight_first: bool, straight_last: bool },
    CircleByRadius(f64),
    CircleThroughPoint,
    Circumcircle,
    ConicThroughFive,
    Arc,
    Curve { x: CurveFn, y: CurveFn, t_min: f64, t_max: f64 },
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Free => f.write_str("Free"),
            Rule::Evaluated { .. } => f.write_str("Evaluated"),
            Rule::Midpoint => f.write_str("Midpoint"),
            Rule::ProjectToLine => f.write_str("ProjectToLine"),
            Rule::ProjectToCircle => f.write_str("ProjectToCircle"),
            Rule::Function(_) => f.write_str("Function"),
            Rule::Intersection {
                branch,
                always_intersect,
            } => f
                .debug_struct("Intersection")
                .field("branch", branch)
                .field("always_intersect", always_intersect)
                .finish(),
            Rule::OtherIntersection { always_intersect } => f
                .debug_struct("OtherIntersection")
                .field("always_intersect", always_intersect)
                .finish(),
            Rule::Line {
                straight_first,
                straight_last,
            } => f
                .debug_struct("Line")
                .field("straight_first", straight_first)
                .field("straight_last", straight_last)
                .finish(),
            Rule::CircleByRadius(r) => f.debug_tuple("CircleByRadius").field(r).finish(),
            Rule::CircleThroughPoint => f.write_str("CircleThroughPoint"),
            Rule::Circumcircle => f.write_str("Circumcircle"),
            Rule::ConicThroughFive => f.write_str("ConicThroughFive"),
            Rule::Arc => f.write_str("Arc"),
            Rule::Curve { t_min, t_max, .. } => f
                .debug_struct("Curve")
                .field("t_min", t_min)
                .field("t_max", t_max)
                .finish_non_exhaustive(),
        }
    }
}

/// Recomputation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    Clean,
    Dirty,
}

/// Current geometry; `None` means the element does not exist right now.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Option<Coords>),
    Locus(Option<Locus>),
}

impl Geometry {
    pub fn exists(&self) -> bool {
        match self {
            Geometry::Point(p) => p.is_some(),
            Geometry::Locus(l) => l.is_some(),
        }
    }

    /// Finite user position of a point.
    pub fn point(&self) -> Option<Vector2<f64>> {
        match self {
            Geometry::Point(Some(c)) if !c.is_ideal() => Some(c.xy()),
            _ => None,
        }
    }

    pub fn locus(&self) -> Option<&Locus> {
        match self {
            Geometry::Locus(l) => l.as_ref(),
            Geometry::Point(_) => None,
        }
    }

    pub(crate) fn reproject(&mut self, vp: &Viewport) {
        if let Geometry::Point(Some(c)) = self {
            *c = c.reproject(vp);
        }
    }
}

/// One element of the construction.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) class: ElementClass,
    pub(crate) rule: Rule,
    pub(crate) parents: Vec<NodeId>,
    pub(crate) children: BTreeSet<NodeId>,
    /// Ordering-only successors from `Graph::add_child`; walks follow them,
    /// removal does not.
    pub(crate) followers: BTreeSet<NodeId>,
    pub(crate) state: NodeState,
    pub(crate) geometry: Geometry,
    /// Geometry was replaced outside a walk (mutation API); reported as
    /// changed by the next walk that visits the node.
    pub(crate) touched: bool,
    pub(crate) recomputes: u64,
}

impl Node {
    pub fn class(&self) -> ElementClass {
        self.class
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub fn children(&self) -> &BTreeSet<NodeId> {
        &self.children
    }

    pub fn followers(&self) -> &BTreeSet<NodeId> {
        &self.followers
    }

    /// Every node a walk must visit after this one.
    pub(crate) fn successors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().chain(self.followers.iter()).copied()
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Number of recomputations since creation (creation included).
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    pub fn is_free(&self) -> bool {
        matches!(self.rule, Rule::Free)
    }
}

/// Graph-wide counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub walks: u64,
    pub recomputations: u64,
    pub non_converged: u64,
}

#[derive(Clone, Debug)]
pub(crate) struct Slot {
    pub(crate) generation: u32,
    pub(crate) node: Option<Node>,
}

/// Arena-backed dependency graph of geometric elements.
#[derive(Clone, Debug)]
pub struct Graph {
    pub(crate) slots: Vec<Slot>,
    pub(crate) vacant: Vec<u32>,
    pub(crate) cfg: GeomCfg,
    pub(crate) viewport: Viewport,
    pub(crate) dirty: BTreeSet<NodeId>,
    pub(crate) redraw: Vec<NodeId>,
    pub(crate) diagnostics: Diagnostics,
}

impl Default for Graph {
    fn default() -> Self {
        Self::with_parts(GeomCfg::default(), Viewport::default())
    }
}

impl Graph {
    /// Empty graph; the viewport must be finite with non-zero units.
    pub fn new(cfg: GeomCfg, viewport: Viewport) -> Result<Self, GraphError> {
        Ok(Self::with_parts(cfg, checked_viewport(viewport)?))
    }

    fn with_parts(cfg: GeomCfg, viewport: Viewport) -> Self {
        Self {
            slots: Vec::new(),
            vacant: Vec::new(),
            cfg,
            viewport,
            dirty: BTreeSet::new(),
            redraw: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }
}
