//! Chart generation models

/// Font size tiers shared by every chart
pub const FONT_SMALL: u32 = 12;
pub const FONT_MEDIUM: u32 = 14;
pub const FONT_LARGE: u32 = 16;

/// Plotted data, one variant per chart family
#[derive(Debug, Clone, PartialEq)]
pub enum Figure {
    Line { x: Vec<String>, y: Vec<f64> },
    Bar { x: Vec<String>, y: Vec<f64> },
    Scatter { x: Vec<String>, y: Vec<f64> },
    Pie { labels: Vec<String>, values: Vec<f64> },
    Scatter3d { x: Vec<f64>, y: Vec<f64>, z: Vec<f64> },
}

impl Figure {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Figure::Line { .. } => "line",
            Figure::Bar { .. } => "bar",
            Figure::Scatter { .. } => "scatter",
            Figure::Pie { .. } => "pie",
            Figure::Scatter3d { .. } => "3d",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverMode {
    /// Tooltip per point
    Closest,
    /// One tooltip across all series at the same x
    XUnified,
}

/// RGB colour as `(r, g, b)`
pub type Rgb = (u8, u8, u8);

#[derive(Debug, Clone, PartialEq)]
pub struct HoverLabel {
    pub font_size: u32,
    pub font_color: Rgb,
    pub bgcolor: Rgb,
    pub bordercolor: Rgb,
}

impl Default for HoverLabel {
    fn default() -> Self {
        Self {
            font_size: FONT_MEDIUM,
            font_color: (0x2c, 0x3e, 0x50),
            bgcolor: (0xec, 0xf0, 0xf1),
            bordercolor: (0xbd, 0xc3, 0xc7),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub title: String,
    pub xaxis_title: String,
    pub yaxis_title: String,
    pub hovermode: HoverMode,
    pub hoverlabel: Option<HoverLabel>,
}

impl Layout {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            xaxis_title: String::new(),
            yaxis_title: String::new(),
            hovermode: HoverMode::Closest,
            hoverlabel: None,
        }
    }
}

/// A figure plus the layout applied to it. Lives for one request only.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableChart {
    pub figure: Figure,
    pub layout: Layout,
}
