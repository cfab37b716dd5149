//! Chart specifications: Plotly-compatible figures (`data` + `layout`).
//!
//! The pipeline never reads a figure back; it is serialized and handed to
//! the page, which passes it to `Plotly.react` unchanged.

pub mod builders;

use crate::query::Scalar;
use serde::Serialize;

pub use builders::{build_choropleth, build_line, build_ring, build_table};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Choropleth(ChoroplethTrace),
    Table(TableTrace),
    Scatter(ScatterTrace),
    Pie(PieTrace),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethTrace {
    /// ISO-3 codes; null entries are left unlocated by the renderer.
    pub locations: Vec<Scalar>,
    pub z: Vec<Scalar>,
    pub hovertext: Vec<Scalar>,
    pub locationmode: String,
    pub colorscale: String,
    pub colorbar: ColorBar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorBar {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableTrace {
    pub header: TableSection<String>,
    pub cells: TableSection<Vec<Scalar>>,
}

/// Header or body of a table trace. `values` is column-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSection<V> {
    pub values: Vec<V>,
    pub fill: Fill,
    pub align: String,
    pub font: Font,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fill {
    pub color: FillColor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FillColor {
    Solid(String),
    /// One color list per column, one entry per row.
    PerCell(Vec<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterTrace {
    pub x: Vec<Scalar>,
    pub y: Vec<Scalar>,
    pub mode: String,
    pub name: String,
    pub line: Line,
    pub marker: Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieTrace {
    pub labels: Vec<Scalar>,
    pub values: Vec<Scalar>,
    /// Pre-computed share of each slice, e.g. `"62.5%"`.
    pub text: Vec<String>,
    pub textinfo: String,
    pub hole: f64,
    pub marker: Marker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub autosize: bool,
    pub paper_bgcolor: String,
    pub plot_bgcolor: String,
    pub font: Font,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            x: None,
        }
    }

    pub fn centered(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            x: Some(0.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Font {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
    /// `"category"` keeps x values in the order supplied.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub gridcolor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geo {
    pub bgcolor: String,
    pub showframe: bool,
    pub showcoastlines: bool,
}
