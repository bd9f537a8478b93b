//! Dependency graph of geometric elements and its update scheduler.
//!
//! Purpose
//! - Own every element of a construction in an arena, keep parent → child
//!   edges as ids, and recompute descendants of moved elements in dependency
//!   order so that each node is visited at most once per walk.
//!
//! Model
//! - `Graph::create` is the only way to insert a node. It validates arity,
//!   parent classes, branch indices and parameters, registers the edges the
//!   rule implies, and computes the initial geometry.
//! - `add_child` adds ordering-only edges (followers). Walks follow them;
//!   `remove` cascades only through the edges rules read from.
//! - Mutation (`set_position`, `set_user_position`, `set_screen_position`,
//!   `set_matrix`) applies to free elements only and queues them;
//!   `notify_changed` / `update_dirty` run the walk. Changed nodes collect in
//!   a redraw list. Free points are always finite, and viewports need finite
//!   values with non-zero units.
//! - Missing geometry (`None`) propagates: a node whose parent does not exist
//!   does not exist either. Structural mistakes are `GraphError`s.
//!
//! Layout
//! - `types.rs` (ids, element kinds, rules, nodes), `build.rs` (creation,
//!   edges, removal, mutation), `update.rs` (walk, recomputation, queries).
//!
//! Code cross-refs: `intersect::{meet, other_intersection}`, `coords::Coords`.

mod build;
mod types;
mod update;

pub use types::{
    Diagnostics, ElementClass, ElementKind, Evaluator, Geometry, Graph, Node, NodeId, NodeState, PointFn, Rule,
};
