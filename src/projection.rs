//! Planar projections from boundary coordinates onto the drawing surface.

use crate::config::ProjectionKind;
use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};

/// Conic equal-area projection with the scale/translate/center/rotate
/// pipeline of a d3 projection.
#[derive(Debug, Clone, Copy)]
struct ConicEqualArea {
    n: f64,
    c: f64,
    r0: f64,
    rotate: f64,
    scale: f64,
    dx: f64,
    dy: f64,
}

impl ConicEqualArea {
    /// `parallels`, `rotate` and `center` are in degrees.
    fn new(parallels: [f64; 2], rotate: f64, center: [f64; 2], scale: f64, translate: [f64; 2]) -> Self {
        let sy0 = parallels[0].to_radians().sin();
        let n = (sy0 + parallels[1].to_radians().sin()) / 2.0;
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        let r0 = c.sqrt() / n;
        let mut projection = Self { n, c, r0, rotate, scale, dx: 0.0, dy: 0.0 };
        let (cx, cy) = projection.raw(center[0].to_radians(), center[1].to_radians());
        projection.dx = translate[0] - scale * cx;
        projection.dy = translate[1] + scale * cy;
        projection
    }

    fn raw(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let r = (self.c - 2.0 * self.n * phi.sin()).max(0.0).sqrt() / self.n;
        let angle = lambda * self.n;
        (r * angle.sin(), self.r0 - r * angle.cos())
    }

    fn project(&self, lon: f64, lat: f64) -> Coord<f64> {
        let mut lambda = (lon + self.rotate).to_radians();
        // wrap into [-pi, pi]
        if lambda > std::f64::consts::PI {
            lambda -= 2.0 * std::f64::consts::PI;
        } else if lambda < -std::f64::consts::PI {
            lambda += 2.0 * std::f64::consts::PI;
        }
        let (x, y) = self.raw(lambda, lat.to_radians());
        Coord {
            x: self.dx + self.scale * x,
            y: self.dy - self.scale * y,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    min: Coord<f64>,
    max: Coord<f64>,
}

impl Extent {
    fn contains(&self, p: Coord<f64>) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }
}

/// Composite projection: lower 48 with Alaska and Hawaii insets.
#[derive(Debug, Clone, Copy)]
pub struct AlbersUsa {
    parts: [(ConicEqualArea, Extent); 3],
}

impl AlbersUsa {
    pub fn new(scale: f64, translate: [f64; 2]) -> Self {
        let (x, y) = (translate[0], translate[1]);
        let k = scale;
        let extent = |x0: f64, y0: f64, x1: f64, y1: f64| Extent {
            min: Coord { x: x0, y: y0 },
            max: Coord { x: x1, y: y1 },
        };

        let lower48 = ConicEqualArea::new([29.5, 45.5], 96.0, [-0.6, 38.7], k, [x, y]);
        let alaska = ConicEqualArea::new(
            [55.0, 65.0],
            154.0,
            [-2.0, 58.5],
            0.35 * k,
            [x - 0.307 * k, y + 0.201 * k],
        );
        let hawaii = ConicEqualArea::new(
            [8.0, 18.0],
            157.0,
            [-3.0, 19.9],
            k,
            [x - 0.205 * k, y + 0.212 * k],
        );

        Self {
            parts: [
                (lower48, extent(x - 0.455 * k, y - 0.238 * k, x + 0.455 * k, y + 0.238 * k)),
                (alaska, extent(x - 0.425 * k, y + 0.120 * k, x - 0.214 * k, y + 0.234 * k)),
                (hawaii, extent(x - 0.214 * k, y + 0.166 * k, x - 0.115 * k, y + 0.234 * k)),
            ],
        }
    }

    /// Projects a lon/lat position, or `None` when it falls outside every inset.
    pub fn project(&self, lon: f64, lat: f64) -> Option<Coord<f64>> {
        self.parts.iter().find_map(|(projection, extent)| {
            let p = projection.project(lon, lat);
            extent.contains(p).then_some(p)
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Projection {
    Identity,
    AlbersUsa(AlbersUsa),
}

impl Projection {
    pub fn from_config(kind: ProjectionKind, scale: f64, width: u32, height: u32) -> Self {
        match kind {
            ProjectionKind::Identity => Projection::Identity,
            ProjectionKind::AlbersUsa => {
                Projection::AlbersUsa(AlbersUsa::new(scale, [width as f64 / 2.0, height as f64 / 2.0]))
            }
        }
    }

    pub fn point(&self, c: Coord<f64>) -> Option<Coord<f64>> {
        match self {
            Projection::Identity => Some(c),
            Projection::AlbersUsa(albers) => albers.project(c.x, c.y),
        }
    }

    /// Positions outside the projection's domain are dropped.
    pub fn line(&self, line: &LineString<f64>) -> LineString<f64> {
        line.coords().filter_map(|c| self.point(*c)).collect()
    }

    pub fn multi_polygon(&self, mp: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        let polygons = mp
            .iter()
            .filter_map(|polygon| {
                let exterior = self.line(polygon.exterior());
                if exterior.0.len() < 3 {
                    return None;
                }
                let interiors = polygon
                    .interiors()
                    .iter()
                    .map(|ring| self.line(ring))
                    .filter(|ring| ring.0.len() >= 3)
                    .collect();
                Some(Polygon::new(exterior, interiors))
            })
            .collect::<Vec<_>>();
        MultiPolygon::new(polygons)
    }

    pub fn multi_line(&self, ml: &MultiLineString<f64>) -> MultiLineString<f64> {
        MultiLineString::new(
            ml.iter()
                .map(|line| self.line(line))
                .filter(|line| line.0.len() >= 2)
                .collect(),
        )
    }
}
