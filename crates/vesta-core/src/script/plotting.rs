//! Plotting presets and show-hook interception.
//!
//! `show` never renders. For a raster figure it flags the pending slot; for
//! an interactive chart it stashes the chart object. The environment drains
//! the slot during its capture pass.

use rhai::{Array, Engine, EvalAltResult, ImmutableString, Module};
use serde_json::Value;

use super::{array_to_f64, script_err};
use crate::execute::capture::GraphicSlot;
use crate::figure::{Chart, Figure, PlotSeries, SeriesKind, Trace};

/// Register plotting presets and install both show hooks.
pub fn register(engine: &mut Engine, slot: GraphicSlot) {
    engine.register_type_with_name::<Figure>("Figure");
    engine.register_type_with_name::<Chart>("Chart");

    engine.register_fn("figure", Figure::new);
    engine.register_fn("chart", |kind: ImmutableString| Chart::new(kind.as_str()));

    engine.register_fn("line", |fig: &mut Figure, xs: Array, ys: Array| {
        push_series(fig, SeriesKind::Line, "", xs, ys)
    });
    engine.register_fn(
        "line",
        |fig: &mut Figure, xs: Array, ys: Array, label: ImmutableString| {
            push_series(fig, SeriesKind::Line, label.as_str(), xs, ys)
        },
    );
    engine.register_fn("scatter", |fig: &mut Figure, xs: Array, ys: Array| {
        push_series(fig, SeriesKind::Scatter, "", xs, ys)
    });
    engine.register_fn(
        "scatter",
        |fig: &mut Figure, xs: Array, ys: Array, label: ImmutableString| {
            push_series(fig, SeriesKind::Scatter, label.as_str(), xs, ys)
        },
    );
    engine.register_fn(
        "bar",
        |fig: &mut Figure, ys: Array| -> Result<(), Box<EvalAltResult>> {
            let heights = array_to_f64(&ys)?;
            let xs = (0..heights.len()).map(|i| i as f64).collect();
            fig.series.push(PlotSeries {
                kind: SeriesKind::Bar,
                label: String::new(),
                xs,
                ys: heights,
            });
            Ok(())
        },
    );
    engine.register_fn("title", |fig: &mut Figure, text: ImmutableString| {
        fig.title = text.to_string();
    });
    engine.register_fn("xlabel", |fig: &mut Figure, text: ImmutableString| {
        fig.x_label = text.to_string();
    });
    engine.register_fn("ylabel", |fig: &mut Figure, text: ImmutableString| {
        fig.y_label = text.to_string();
    });
    engine.register_fn("size", |fig: &mut Figure, width: i64, height: i64| {
        fig.width = width.clamp(64, 4096) as u32;
        fig.height = height.clamp(64, 4096) as u32;
    });

    engine.register_fn(
        "trace",
        |chart: &mut Chart,
         name: ImmutableString,
         xs: Array,
         ys: Array|
         -> Result<(), Box<EvalAltResult>> {
            chart.traces.push(Trace {
                name: name.to_string(),
                xs: array_to_values(&xs)?,
                ys: array_to_values(&ys)?,
            });
            Ok(())
        },
    );
    engine.register_fn("title", |chart: &mut Chart, text: ImmutableString| {
        chart
            .layout
            .insert("title".to_string(), Value::String(text.to_string()));
    });

    let hooked = slot.clone();
    engine.register_fn("show", move |fig: &mut Figure| {
        hooked.stash_raster(fig.clone());
    });
    let hooked = slot;
    engine.register_fn("show", move |chart: &mut Chart| {
        hooked.stash_interactive(chart.clone());
    });

    let mut plt = Module::new();
    plt.set_native_fn("figure", || -> Result<Figure, Box<EvalAltResult>> {
        Ok(Figure::new())
    });
    engine.register_static_module("plt", plt.into());

    let mut viz = Module::new();
    viz.set_native_fn(
        "chart",
        |kind: ImmutableString| -> Result<Chart, Box<EvalAltResult>> {
            Ok(Chart::new(kind.as_str()))
        },
    );
    engine.register_static_module("viz", viz.into());
}

fn push_series(
    fig: &mut Figure,
    kind: SeriesKind,
    label: &str,
    xs: Array,
    ys: Array,
) -> Result<(), Box<EvalAltResult>> {
    let xs = array_to_f64(&xs)?;
    let ys = array_to_f64(&ys)?;
    if xs.len() != ys.len() {
        return Err(script_err(format!(
            "series length mismatch: {} x values vs {} y values",
            xs.len(),
            ys.len()
        )));
    }
    fig.series.push(PlotSeries {
        kind,
        label: label.to_string(),
        xs,
        ys,
    });
    Ok(())
}

/// Convert chart axis values (numbers or category labels) to JSON.
fn array_to_values(values: &Array) -> Result<Vec<Value>, Box<EvalAltResult>> {
    values
        .iter()
        .map(|v| {
            rhai::serde::from_dynamic::<Value>(v)
                .map_err(|e| script_err(format!("chart values must be plain data: {e}")))
        })
        .collect()
}
