//! Drag one circle across another and print both intersection branches.
//!
//! Purpose
//! - Show the creation contract and the notify/update cycle end to end.
//! - Make branch stickiness visible: branch 0 stays on the same side of the
//!   center line for the whole drag, and both branches vanish once the circles
//!   separate.
//!
//! Run: `cargo run -p dyngeo --example drag_circles`

use dyngeo::prelude::*;

fn main() -> Result<(), GraphError> {
    let mut g = Graph::default();
    let a = g.create(ElementKind::FreePoint { x: 0.0, y: 0.0 }, &[])?;
    let b = g.create(ElementKind::FreePoint { x: 1.0, y: 0.0 }, &[])?;
    let ca = g.create(ElementKind::CircleByRadius(2.0), &[a])?;
    let cb = g.create(ElementKind::CircleByRadius(1.5), &[b])?;
    let p0 = g.create(ElementKind::intersection(0), &[ca, cb])?;
    let p1 = g.create(ElementKind::intersection(1), &[ca, cb])?;

    let show = |c: Option<Coords>| match c {
        Some(c) => format!("({:+.4}, {:+.4})", c.x(), c.y()),
        None => "   none".to_string(),
    };
    for step in 0..=12 {
        let x = 1.0 + step as f64 * 0.25;
        g.set_position(b, x, 0.0)?;
        let changed = g.notify_changed(&[b])?;
        println!(
            "b.x = {x:4.2}  p0 = {}  p1 = {}  changed = {}",
            show(g.coords(p0)?),
            show(g.coords(p1)?),
            changed.len()
        );
    }
    println!("{:?}", g.diagnostics());
    Ok(())
}
