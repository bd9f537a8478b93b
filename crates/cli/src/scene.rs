//! JSON scenes: named elements built through the creation contract, plus a
//! list of drag steps replayed against the graph.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use dyngeo::prelude::*;
use serde::{Deserialize, Serialize};

/// Optional overrides of `GeomCfg` fields.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CfgOverride {
    pub eps: Option<f64>,
    pub max_iter: Option<usize>,
    pub sample_spacing: Option<f64>,
    pub min_samples: Option<usize>,
    pub max_samples: Option<usize>,
}

impl CfgOverride {
    fn apply(&self, mut cfg: GeomCfg) -> GeomCfg {
        cfg.eps = self.eps.unwrap_or(cfg.eps);
        cfg.max_iter = self.max_iter.unwrap_or(cfg.max_iter);
        cfg.sample_spacing = self.sample_spacing.unwrap_or(cfg.sample_spacing);
        cfg.min_samples = self.min_samples.unwrap_or(cfg.min_samples);
        cfg.max_samples = self.max_samples.unwrap_or(cfg.max_samples);
        cfg
    }
}

/// Optional overrides of `Viewport` fields.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewportOverride {
    pub origin_x: Option<f64>,
    pub origin_y: Option<f64>,
    pub unit_x: Option<f64>,
    pub unit_y: Option<f64>,
}

impl ViewportOverride {
    fn apply(&self, vp: Viewport) -> Viewport {
        Viewport::new(
            self.origin_x.unwrap_or(vp.origin_x),
            self.origin_y.unwrap_or(vp.origin_y),
            self.unit_x.unwrap_or(vp.unit_x),
            self.unit_y.unwrap_or(vp.unit_y),
        )
    }
}

/// Element kinds expressible in JSON (closure-backed kinds are library-only).
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementSpec {
    FreePoint {
        x: f64,
        y: f64,
    },
    Midpoint,
    ProjectToLine,
    ProjectToCircle,
    Intersection {
        #[serde(default)]
        branch: usize,
        #[serde(default)]
        j: usize,
        #[serde(default)]
        always_intersect: bool,
    },
    OtherIntersection {
        #[serde(default)]
        always_intersect: bool,
    },
    Line,
    Segment,
    Ray,
    CircleByRadius {
        radius: f64,
    },
    CircleThroughPoint,
    Circumcircle,
    FreeConic {
        matrix: [[f64; 3]; 3],
    },
    ConicThroughFive,
    Arc,
}

impl ElementSpec {
    fn kind(&self) -> ElementKind {
        match *self {
            ElementSpec::FreePoint { x, y } => ElementKind::FreePoint { x, y },
            ElementSpec::Midpoint => ElementKind::Midpoint,
            ElementSpec::ProjectToLine => ElementKind::ProjectToLine,
            ElementSpec::ProjectToCircle => ElementKind::ProjectToCircle,
            ElementSpec::Intersection {
                branch,
                j,
                always_intersect,
            } => ElementKind::Intersection {
                branch: Branch { i: branch, j },
                always_intersect,
            },
            ElementSpec::OtherIntersection { always_intersect } => ElementKind::OtherIntersection { always_intersect },
            ElementSpec::Line => ElementKind::infinite_line(),
            ElementSpec::Segment => ElementKind::segment(),
            ElementSpec::Ray => ElementKind::ray(),
            ElementSpec::CircleByRadius { radius } => ElementKind::CircleByRadius(radius),
            ElementSpec::CircleThroughPoint => ElementKind::CircleThroughPoint,
            ElementSpec::Circumcircle => ElementKind::Circumcircle,
            ElementSpec::FreeConic { matrix: m } => ElementKind::FreeConic(Mat3::new(
                m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
            )),
            ElementSpec::ConicThroughFive => ElementKind::ConicThroughFive,
            ElementSpec::Arc => ElementKind::Arc,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ElementDef {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(flatten)]
    pub spec: ElementSpec,
}

/// One drag: move a free point to user coordinates.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    pub point: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub cfg: CfgOverride,
    #[serde(default)]
    pub viewport: ViewportOverride,
    pub elements: Vec<ElementDef>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Serialize)]
pub struct StepTrace {
    pub index: usize,
    pub moved: String,
    pub changed: Vec<String>,
    pub points: BTreeMap<String, Option<[f64; 2]>>,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsTrace {
    pub walks: u64,
    pub recomputations: u64,
    pub non_converged: u64,
}

#[derive(Debug, Serialize)]
pub struct Trace {
    pub version: &'static str,
    pub initial: BTreeMap<String, Option<[f64; 2]>>,
    pub steps: Vec<StepTrace>,
    pub diagnostics: DiagnosticsTrace,
}

/// Built scene: the graph plus the name ↔ id tables.
pub struct Built {
    pub graph: Graph,
    pub ids: BTreeMap<String, NodeId>,
    pub names: BTreeMap<NodeId, String>,
}

impl Built {
    fn id(&self, name: &str) -> Result<NodeId> {
        self.ids.get(name).copied().ok_or_else(|| anyhow!("unknown element name `{name}`"))
    }

    /// User coordinates of every named point (`None` when it does not exist).
    fn points(&self) -> Result<BTreeMap<String, Option<[f64; 2]>>> {
        let mut out = BTreeMap::new();
        for (name, &id) in &self.ids {
            if self.graph.class(id)? == ElementClass::Point {
                let c = self.graph.coords(id)?;
                out.insert(name.clone(), c.map(|c| [c.x(), c.y()]));
            }
        }
        Ok(out)
    }
}

pub fn load(path: &Path) -> Result<Scene> {
    let text = fs::read_to_string(path).with_context(|| format!("reading scene {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing scene {}", path.display()))
}

/// Creates every element in file order; parents must be defined earlier.
pub fn build(scene: &Scene) -> Result<Built> {
    let cfg = scene.cfg.apply(GeomCfg::default());
    let viewport = scene.viewport.apply(Viewport::default());
    let mut built = Built {
        graph: Graph::new(cfg, viewport).context("invalid viewport")?,
        ids: BTreeMap::new(),
        names: BTreeMap::new(),
    };
    for def in &scene.elements {
        if built.ids.contains_key(&def.name) {
            bail!("duplicate element name `{}`", def.name);
        }
        let parents = def.parents.iter().map(|p| built.id(p)).collect::<Result<Vec<_>>>()?;
        let id = built
            .graph
            .create(def.spec.kind(), &parents)
            .with_context(|| format!("creating `{}`", def.name))?;
        tracing::debug!(name = %def.name, ?id, "element");
        built.ids.insert(def.name.clone(), id);
        built.names.insert(id, def.name.clone());
    }
    Ok(built)
}

/// Builds the scene, replays its steps and collects the trace.
pub fn run(scene: &Scene) -> Result<Trace> {
    let mut built = build(scene)?;
    let initial = built.points()?;
    let mut steps = Vec::with_capacity(scene.steps.len());
    for (index, step) in scene.steps.iter().enumerate() {
        let id = built.id(&step.point)?;
        built
            .graph
            .set_position(id, step.x, step.y)
            .with_context(|| format!("step {index}: moving `{}`", step.point))?;
        let changed = built.graph.notify_changed(&[id])?;
        let changed = changed
            .iter()
            .filter_map(|c| built.names.get(c).cloned())
            .collect();
        steps.push(StepTrace {
            index,
            moved: step.point.clone(),
            changed,
            points: built.points()?,
        });
    }
    let d = built.graph.diagnostics();
    tracing::info!(steps = steps.len(), walks = d.walks, non_converged = d.non_converged, "scene replayed");
    Ok(Trace {
        version: dyngeo::VERSION,
        initial,
        steps,
        diagnostics: DiagnosticsTrace {
            walks: d.walks,
            recomputations: d.recomputations,
            non_converged: d.non_converged,
        },
    })
}
