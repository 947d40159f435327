//! Script engine assembly.
//!
//! Each session gets its own `rhai::Engine` carrying the preset capability
//! set: tabular constructors (`tab`), numeric helpers (`num`), raster
//! plotting (`plt`) and interactive charting (`viz`), plus the global
//! `table`/`figure`/`chart`/`show` functions. The `show` interception hooks
//! and the console capture sink are installed here, so a reset that rebuilds
//! the engine reinstalls them identically.

mod frame;
mod numeric;
mod plotting;

use rhai::{Dynamic, Engine, EvalAltResult, Position};

use crate::execute::capture::{GraphicSlot, OutputBuffer};
use crate::paths::WorkspaceDirs;

pub use frame::Frame;

/// Build a session engine with presets, capture sink and show hooks.
pub fn build_engine(dirs: &WorkspaceDirs) -> (Engine, OutputBuffer, GraphicSlot) {
    let mut engine = Engine::new();
    let output = OutputBuffer::new();
    let graphics = GraphicSlot::new();

    let sink = output.clone();
    engine.on_print(move |text| sink.append_line(text));
    let sink = output.clone();
    engine.on_debug(move |text, _source, pos| {
        if pos.is_none() {
            sink.append_line(text);
        } else {
            sink.append_line(&format!("{text} @ {pos}"));
        }
    });

    frame::register(&mut engine, dirs.data_dir.clone());
    plotting::register(&mut engine, graphics.clone());
    engine.register_static_module("num", numeric::module().into());

    (engine, output, graphics)
}

/// Build a script runtime error.
pub(crate) fn script_err(message: impl Into<String>) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(message.into().into(), Position::NONE).into()
}

/// Coerce a script number (int or float) to `f64`.
pub(crate) fn to_f64(value: &Dynamic) -> Result<f64, Box<EvalAltResult>> {
    if let Ok(i) = value.as_int() {
        return Ok(i as f64);
    }
    value
        .as_float()
        .map_err(|actual| script_err(format!("expected a number, found {actual}")))
}

/// Coerce a script array to `f64` values.
pub(crate) fn array_to_f64(values: &rhai::Array) -> Result<Vec<f64>, Box<EvalAltResult>> {
    values.iter().map(to_f64).collect()
}
