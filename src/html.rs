//! SVG and HTML serialization of a rendered [`Page`].
//!
//! The HTML page is self-contained: the drawing surface and legend are inline
//! SVG, and a short script binds the hover handlers that show and hide the
//! tooltip element.

use crate::config::ScaleKind;
use crate::scene::{Legend, Page, Surface, Tooltip};
use geo::{LineString, MultiLineString, MultiPolygon};
use std::fmt::Write;

/// Embedded page template
const PAGE_TEMPLATE: &str = include_str!("templates/page.html");

const TITLE: &str = "United States Educational Attainment";
const DESCRIPTION: &str =
    "Percentage of adults age 25 and older with a bachelor's degree or higher (2010-2014)";

/// Escapes text for use inside element content or a quoted attribute.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Coordinate with at most two decimals and no trailing zeros.
fn num(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn push_line(d: &mut String, line: &LineString<f64>, close: bool) {
    for (i, c) in line.coords().enumerate() {
        d.push(if i == 0 { 'M' } else { 'L' });
        d.push_str(&num(c.x));
        d.push(',');
        d.push_str(&num(c.y));
    }
    if close && !line.0.is_empty() {
        d.push('Z');
    }
}

pub fn polygon_path(mp: &MultiPolygon<f64>) -> String {
    let mut d = String::new();
    for polygon in mp {
        push_line(&mut d, polygon.exterior(), true);
        for interior in polygon.interiors() {
            push_line(&mut d, interior, true);
        }
    }
    d
}

pub fn line_path(ml: &MultiLineString<f64>) -> String {
    let mut d = String::new();
    for line in ml {
        push_line(&mut d, line, false);
    }
    d
}

/// The drawing surface as a standalone `<svg>` element.
pub fn surface_svg(surface: &Surface) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg id="{}" xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}" style="background: {}">"#,
        escape(&surface.id),
        surface.width,
        surface.height,
        surface.width,
        surface.height,
        surface.background
    );

    for shape in &surface.shapes {
        let fips = shape.fips.as_ref().map(|f| f.to_string()).unwrap_or_default();
        let _ = write!(
            svg,
            r#"<path class="county" d="{}" data-fips="{}" data-education="{}""#,
            polygon_path(&shape.outline),
            escape(&fips),
            shape.education
        );
        if let Some(record) = &shape.record {
            let _ = write!(
                svg,
                r#" data-area="{}" data-state="{}""#,
                escape(&record.area_name),
                escape(&record.state)
            );
        }
        let _ = writeln!(
            svg,
            r##" fill="{}" stroke="#fff" stroke-width="0.5"/>"##,
            shape.fill
        );
    }

    if let Some(borders) = &surface.borders {
        let _ = writeln!(
            svg,
            r##"<path class="states" d="{}" fill="none" stroke="#fff" stroke-width="1.5"/>"##,
            line_path(borders)
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// Legend bar with its percentage axis.
pub fn legend_svg(legend: &Legend) -> String {
    let margin = 20.0;
    let bar_top = 10.0;
    let bar_height = legend.bar_height as f64;
    let width = legend.width as f64 + 2.0 * margin;
    let height = bar_top + bar_height + 30.0;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}">"#,
        num(width),
        num(height)
    );
    let _ = writeln!(svg, r#"<g transform="translate({},0)">"#, num(margin));

    match legend.kind {
        ScaleKind::Quantile => {
            for band in &legend.bands {
                let x0 = legend.x(band.from);
                let x1 = legend.x(band.to);
                let _ = writeln!(
                    svg,
                    r#"<rect class="legend-band" x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                    num(x0),
                    num(bar_top),
                    num((x1 - x0).max(0.0)),
                    num(bar_height),
                    band.color
                );
            }
        }
        ScaleKind::Sequential => {
            let gradient_id = format!("{}-gradient", legend.id);
            let _ = writeln!(svg, r#"<defs><linearGradient id="{}">"#, escape(&gradient_id));
            let (lo, hi) = legend.domain;
            for band in &legend.bands {
                let mid = (band.from + band.to) / 2.0;
                let offset = if hi > lo { (mid - lo) / (hi - lo) * 100.0 } else { 0.0 };
                let _ = writeln!(
                    svg,
                    r#"<stop offset="{}%" stop-color="{}"/>"#,
                    num(offset),
                    band.color
                );
            }
            svg.push_str("</linearGradient></defs>\n");
            let _ = writeln!(
                svg,
                r#"<rect class="legend-band" x="0" y="{}" width="{}" height="{}" fill="url(#{})"/>"#,
                num(bar_top),
                legend.width,
                num(bar_height),
                escape(&gradient_id)
            );
        }
    }

    let axis_y = bar_top + bar_height;
    let _ = writeln!(
        svg,
        r##"<g class="axis"><line x1="0" y1="{y}" x2="{w}" y2="{y}" stroke="#333"/>"##,
        y = num(axis_y),
        w = legend.width
    );
    for (x, label) in legend.tick_labels() {
        let _ = writeln!(
            svg,
            r##"<g class="tick" transform="translate({},{})"><line y2="6" stroke="#333"/><text y="16" text-anchor="middle">{}</text></g>"##,
            num(x),
            num(axis_y),
            escape(&label)
        );
    }
    svg.push_str("</g>\n</g>\n</svg>\n");
    svg
}

/// The full page: surface, legend, tooltip element and hover script.
pub fn page_html(page: &Page) -> String {
    let legend = page.legend.as_ref().map(legend_svg).unwrap_or_default();

    PAGE_TEMPLATE
        .replace("{{title}}", TITLE)
        .replace("{{description}}", DESCRIPTION)
        .replace("{{surface_svg}}", &surface_svg(&page.surface))
        .replace("{{legend_svg}}", &legend)
        .replace("{{container_id}}", &escape(&page.mount.container))
        .replace("{{tooltip_id}}", &escape(&page.mount.tooltip))
        .replace("{{legend_id}}", &escape(&page.mount.legend))
        .replace("{{offset_x}}", &Tooltip::OFFSET_X.to_string())
        .replace("{{offset_y}}", &Tooltip::OFFSET_Y.to_string())
}
