//! In-memory page model: the drawing surface with its county shapes, the
//! tooltip element and the legend surface. Output writers serialize a
//! [`Page`]; hover behaviour is exercised directly against it.

use crate::config::ScaleKind;
use crate::scale::{format_percent, ColorScale, LegendBand};
use crate::types::{CountyId, EducationRecord, Rgb};
use geo::{MultiLineString, MultiPolygon};

/// Element ids the page is mounted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoints {
    pub container: String,
    pub tooltip: String,
    pub legend: String,
}

impl MountPoints {
    pub fn new(container: &str, tooltip: &str, legend: &str) -> Self {
        Self {
            container: container.trim_start_matches('#').to_string(),
            tooltip: tooltip.trim_start_matches('#').to_string(),
            legend: legend.trim_start_matches('#').to_string(),
        }
    }
}

impl Default for MountPoints {
    fn default() -> Self {
        Self::new("choropleth", "tooltip", "legend")
    }
}

/// One drawn county.
#[derive(Debug, Clone)]
pub struct CountyShape {
    pub fips: Option<CountyId>,
    /// Outline in surface coordinates.
    pub outline: MultiPolygon<f64>,
    pub fill: Rgb,
    /// Matched percentage, or `0.0` when the county has no record.
    pub education: f64,
    pub record: Option<EducationRecord>,
}

#[derive(Debug, Clone)]
pub struct Surface {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub shapes: Vec<CountyShape>,
    pub borders: Option<MultiLineString<f64>>,
}

impl Surface {
    pub fn new(id: &str, width: u32, height: u32, background: Rgb) -> Self {
        Self {
            id: id.to_string(),
            width,
            height,
            background,
            shapes: Vec::new(),
            borders: None,
        }
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.borders = None;
    }

    pub fn shape(&self, fips: &CountyId) -> Option<&CountyShape> {
        self.shapes.iter().find(|s| s.fips.as_ref() == Some(fips))
    }
}

/// Tooltip content for a county record.
pub fn tooltip_lines(record: &EducationRecord) -> [String; 2] {
    [
        format!("{}, {}", record.area_name, record.state),
        format!("{}% Bachelor's or Higher", record.bachelors_or_higher),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub id: String,
    pub visible: bool,
    pub lines: Vec<String>,
    pub education: Option<f64>,
    pub left: f64,
    pub top: f64,
}

impl Tooltip {
    pub const OFFSET_X: f64 = 10.0;
    pub const OFFSET_Y: f64 = -28.0;

    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            visible: false,
            lines: Vec::new(),
            education: None,
            left: 0.0,
            top: 0.0,
        }
    }

    /// Pointer entered `shape` at page coordinates. Counties without a record
    /// leave the tooltip untouched; returns whether it is now showing.
    pub fn hover(&mut self, shape: &CountyShape, page_x: f64, page_y: f64) -> bool {
        let Some(record) = &shape.record else {
            return false;
        };
        self.lines = tooltip_lines(record).to_vec();
        self.education = Some(record.bachelors_or_higher);
        self.left = page_x + Self::OFFSET_X;
        self.top = page_y + Self::OFFSET_Y;
        self.visible = true;
        true
    }

    pub fn leave(&mut self) {
        self.visible = false;
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct Legend {
    pub id: String,
    pub kind: ScaleKind,
    pub width: u32,
    pub bar_height: u32,
    pub domain: (f64, f64),
    pub bands: Vec<LegendBand>,
    pub ticks: Vec<f64>,
}

impl Legend {
    pub fn new(id: &str, kind: ScaleKind, scale: &ColorScale, width: u32) -> Self {
        Self {
            id: id.to_string(),
            kind,
            width,
            bar_height: 10,
            domain: scale.domain(),
            bands: scale.bands(),
            ticks: scale.ticks(),
        }
    }

    /// Horizontal offset of `value` along the bar.
    pub fn x(&self, value: f64) -> f64 {
        let (lo, hi) = self.domain;
        if hi <= lo {
            return 0.0;
        }
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0) * self.width as f64
    }

    pub fn tick_labels(&self) -> Vec<(f64, String)> {
        self.ticks.iter().map(|t| (self.x(*t), format_percent(*t))).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    pub mount: MountPoints,
    pub surface: Surface,
    pub tooltip: Tooltip,
    pub legend: Option<Legend>,
}

impl Page {
    pub fn new(mount: MountPoints, width: u32, height: u32, background: Rgb) -> Self {
        Self {
            surface: Surface::new(&mount.container, width, height, background),
            tooltip: Tooltip::new(&mount.tooltip),
            legend: None,
            mount,
        }
    }

    /// Hover over the shape with the given fips.
    pub fn hover(&mut self, fips: &CountyId, page_x: f64, page_y: f64) -> bool {
        match self.surface.shape(fips) {
            Some(shape) => self.tooltip.hover(shape, page_x, page_y),
            None => false,
        }
    }

    pub fn unhover(&mut self) {
        self.tooltip.leave();
    }
}
