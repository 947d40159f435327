//! Figure descriptions and artifact rendering.
//!
//! Session code builds figures through the preset plotting modules; the
//! engine rasterizes or serializes them only during the capture pass at the
//! end of an `execute` call.

mod chart;
mod raster;

pub use chart::{Chart, Trace};
pub use raster::{Figure, PlotSeries, SeriesKind};
