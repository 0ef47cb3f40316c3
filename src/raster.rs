//! PNG rendition of the drawing surface.

use crate::scene::Surface;
use crate::types::Rgb;
use geo::{Coord, MultiPolygon};
use image::{ImageBuffer, Rgba, RgbaImage};

fn rgba(color: Rgb) -> Rgba<u8> {
    Rgba([color.0, color.1, color.2, 255])
}

/// Fills `mp` with the even-odd rule, sampling each pixel at its centre.
pub fn fill_polygon(img: &mut RgbaImage, mp: &MultiPolygon<f64>, color: Rgba<u8>) {
    let mut edges: Vec<(Coord<f64>, Coord<f64>)> = Vec::new();
    for polygon in mp {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            for line in ring.lines() {
                if line.start.y != line.end.y {
                    edges.push((line.start, line.end));
                }
            }
        }
    }
    if edges.is_empty() {
        return;
    }

    let (width, height) = img.dimensions();
    let min_y = edges.iter().map(|(a, b)| a.y.min(b.y)).fold(f64::INFINITY, f64::min);
    let max_y = edges.iter().map(|(a, b)| a.y.max(b.y)).fold(f64::NEG_INFINITY, f64::max);
    let row_start = (min_y - 0.5).ceil().max(0.0) as u32;
    let row_end = ((max_y - 0.5).floor().min(height as f64 - 1.0)).max(-1.0);
    if row_end < 0.0 {
        return;
    }

    let mut crossings: Vec<f64> = Vec::new();
    for row in row_start..=row_end as u32 {
        let sy = row as f64 + 0.5;
        crossings.clear();
        for (a, b) in &edges {
            let (lo, hi) = if a.y < b.y { (a, b) } else { (b, a) };
            // half-open so shared vertices are counted once
            if sy >= lo.y && sy < hi.y {
                crossings.push(lo.x + (sy - lo.y) * (hi.x - lo.x) / (hi.y - lo.y));
            }
        }
        crossings.sort_by(f64::total_cmp);

        for pair in crossings.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil().max(0.0);
            let end = (pair[1] - 0.5).floor().min(width as f64 - 1.0);
            if end < start {
                continue;
            }
            for x in start as u32..=end as u32 {
                img.put_pixel(x, row, color);
            }
        }
    }
}

/// One-pixel line between two surface points.
pub fn draw_line(img: &mut RgbaImage, from: Coord<f64>, to: Coord<f64>, color: Rgba<u8>) {
    let (width, height) = img.dimensions();
    let steps = (to.x - from.x).abs().max((to.y - from.y).abs()).ceil().max(1.0) as u32;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = from.x + (to.x - from.x) * t;
        let y = from.y + (to.y - from.y) * t;
        if x >= 0.0 && y >= 0.0 && (x as u32) < width && (y as u32) < height {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

pub fn rasterize(surface: &Surface) -> RgbaImage {
    let mut img: RgbaImage =
        ImageBuffer::from_pixel(surface.width, surface.height, rgba(surface.background));

    for shape in &surface.shapes {
        fill_polygon(&mut img, &shape.outline, rgba(shape.fill));
    }

    if let Some(borders) = &surface.borders {
        let white = Rgba([255, 255, 255, 255]);
        for line in borders {
            for segment in line.lines() {
                draw_line(&mut img, segment.start, segment.end, white);
            }
        }
    }

    img
}
