//! Interactive chart capture.
//!
//! A [`Chart`] holds the traces and layout a script assembled; the capture
//! pass serializes it into a self-contained markup fragment that resolves a
//! charting runtime (`window.Plotly`) at render time.

use serde_json::{Map, Value, json};

use crate::error::Result;

/// One trace of an interactive chart.
#[derive(Debug, Clone)]
pub struct Trace {
    pub name: String,
    pub xs: Vec<Value>,
    pub ys: Vec<Value>,
}

/// A latent interactive chart built by session code.
#[derive(Debug, Clone)]
pub struct Chart {
    /// Trace style: `scatter`, `line` or `bar`.
    pub kind: String,
    pub traces: Vec<Trace>,
    pub layout: Map<String, Value>,
}

impl Chart {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            traces: Vec::new(),
            layout: Map::new(),
        }
    }

    fn trace_json(&self, trace: &Trace) -> Value {
        let (plot_type, mode) = match self.kind.as_str() {
            "bar" => ("bar", None),
            "line" => ("scatter", Some("lines")),
            _ => ("scatter", Some("markers")),
        };
        let mut obj = json!({
            "type": plot_type,
            "name": trace.name,
            "x": trace.xs,
            "y": trace.ys,
        });
        if let (Some(mode), Some(map)) = (mode, obj.as_object_mut()) {
            map.insert("mode".to_string(), Value::String(mode.to_string()));
        }
        obj
    }

    /// Serialize into the embeddable runtime-lookup fragment.
    pub fn to_markup(&self) -> Result<String> {
        let data: Vec<Value> = self.traces.iter().map(|t| self.trace_json(t)).collect();
        let data = serde_json::to_string(&data)?;
        let layout = serde_json::to_string(&Value::Object(self.layout.clone()))?;
        let config = serde_json::to_string(&json!({
            "displayModeBar": true,
            "responsive": true,
            "scrollZoom": true,
            "displaylogo": false,
        }))?;

        Ok(format!(
            r#"<div class="chart-embed" style="height:100%;width:100%;">
<script type="text/javascript">
(function() {{
    if (!window.Plotly) {{ return; }}
    var data = {data};
    var layout = {layout};
    layout.autosize = true;
    layout.margin = {{ t: 30, r: 10, b: 30, l: 60 }};
    var container = document.currentScript.parentElement;
    Plotly.newPlot(container, data, layout, {config}).then(function() {{
        window.dispatchEvent(new Event('resize'));
    }});
}})();
</script>
</div>"#
        ))
    }
}
