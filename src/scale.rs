//! Percentage → colour mappings.
//!
//! Two mappings are supported. The quantile scale (default) splits the
//! observed percentages into equal-frequency buckets and gives each bucket one
//! swatch of the nine-step Blues palette. The sequential scale interpolates a
//! continuous blue ramp over 0..100.

use crate::config::ScaleKind;
use crate::types::Rgb;

/// Nine-step sequential Blues palette, lightest first.
pub const BLUES: [Rgb; 9] = [
    Rgb(0xf7, 0xfb, 0xff),
    Rgb(0xde, 0xeb, 0xf7),
    Rgb(0xc6, 0xdb, 0xef),
    Rgb(0x9e, 0xca, 0xe1),
    Rgb(0x6b, 0xae, 0xd6),
    Rgb(0x42, 0x92, 0xc6),
    Rgb(0x21, 0x71, 0xb5),
    Rgb(0x08, 0x51, 0x9c),
    Rgb(0x08, 0x30, 0x6b),
];

fn basis(t1: f64, v0: f64, v1: f64, v2: f64, v3: f64) -> f64 {
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

/// Uniform cubic B-spline through `values`, sampled at `t` in [0, 1].
fn spline(values: &[f64], t: f64) -> f64 {
    let n = values.len() - 1;
    let (t, i) = if t <= 0.0 {
        (0.0, 0)
    } else if t >= 1.0 {
        (1.0, n - 1)
    } else {
        (t, (t * n as f64).floor() as usize)
    };
    let v1 = values[i];
    let v2 = values[i + 1];
    let v0 = if i > 0 { values[i - 1] } else { 2.0 * v1 - v2 };
    let v3 = if i + 2 <= n { values[i + 2] } else { 2.0 * v2 - v1 };
    basis((t - i as f64 / n as f64) * n as f64, v0, v1, v2, v3)
}

/// Continuous blue ramp; `t` is clamped to [0, 1]. NaN is treated as 0.
pub fn interpolate_blues(t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t };
    let channel = |pick: fn(&Rgb) -> u8| {
        let values: Vec<f64> = BLUES.iter().map(|c| pick(c) as f64).collect();
        spline(&values, t).round().clamp(0.0, 255.0) as u8
    };
    Rgb(channel(|c| c.0), channel(|c| c.1), channel(|c| c.2))
}

/// `count` evenly spaced samples of the blue ramp; the nine-step palette
/// itself when `count` is 9.
pub fn blues(count: usize) -> Vec<Rgb> {
    match count {
        9 => BLUES.to_vec(),
        0 => Vec::new(),
        1 => vec![interpolate_blues(0.5)],
        _ => (0..count)
            .map(|i| interpolate_blues(i as f64 / (count - 1) as f64))
            .collect(),
    }
}

/// Linear-interpolated quantile of an ascending slice (R-7).
pub fn quantile_sorted(values: &[f64], p: f64) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    if p <= 0.0 || n < 2 {
        return Some(values[0]);
    }
    if p >= 1.0 {
        return Some(values[n - 1]);
    }
    let i = (n - 1) as f64 * p;
    let i0 = i.floor() as usize;
    let v0 = values[i0];
    let v1 = values[i0 + 1];
    Some(v0 + (v1 - v0) * (i - i0 as f64))
}

#[derive(Debug, Clone)]
pub struct QuantileScale {
    domain: Vec<f64>,
    thresholds: Vec<f64>,
    range: Vec<Rgb>,
}

impl QuantileScale {
    /// NaN observations are ignored.
    pub fn new(values: impl IntoIterator<Item = f64>, range: Vec<Rgb>) -> Self {
        let mut domain: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        domain.sort_by(f64::total_cmp);

        let buckets = range.len();
        let thresholds = if domain.is_empty() || buckets < 2 {
            Vec::new()
        } else {
            (1..buckets)
                .filter_map(|i| quantile_sorted(&domain, i as f64 / buckets as f64))
                .collect()
        };

        Self { domain, thresholds, range }
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn range(&self) -> &[Rgb] {
        &self.range
    }

    /// Bucket index: the number of thresholds `<= value`.
    pub fn bucket(&self, value: f64) -> usize {
        self.thresholds.partition_point(|t| *t <= value)
    }

    pub fn color(&self, value: f64) -> Option<Rgb> {
        self.range.get(self.bucket(value)).copied()
    }

    /// Value interval covered by `bucket`.
    pub fn invert_extent(&self, bucket: usize) -> Option<(f64, f64)> {
        let (first, last) = (self.domain.first()?, self.domain.last()?);
        if bucket >= self.range.len() {
            return None;
        }
        let lo = if bucket > 0 { self.thresholds.get(bucket - 1).copied()? } else { *first };
        let hi = self.thresholds.get(bucket).copied().unwrap_or(*last);
        Some((lo, hi))
    }

    pub fn extent(&self) -> Option<(f64, f64)> {
        Some((*self.domain.first()?, *self.domain.last()?))
    }
}

/// One contiguous run of the legend bar.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendBand {
    pub from: f64,
    pub to: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone)]
pub enum ColorScale {
    Quantile(QuantileScale),
    Sequential,
}

impl ColorScale {
    pub fn new(kind: ScaleKind, observed: impl IntoIterator<Item = f64>, buckets: usize) -> Self {
        match kind {
            ScaleKind::Quantile => ColorScale::Quantile(QuantileScale::new(observed, blues(buckets))),
            ScaleKind::Sequential => ColorScale::Sequential,
        }
    }

    pub fn color(&self, percentage: f64) -> Rgb {
        match self {
            ColorScale::Quantile(q) => q.color(percentage).unwrap_or_else(|| interpolate_blues(0.0)),
            ColorScale::Sequential => interpolate_blues(percentage / 100.0),
        }
    }

    /// Value domain drawn on the legend axis.
    pub fn domain(&self) -> (f64, f64) {
        match self {
            ColorScale::Quantile(q) => q.extent().unwrap_or((0.0, 100.0)),
            ColorScale::Sequential => (0.0, 100.0),
        }
    }

    /// Legend bar content: one band per bucket, or fine gradient steps for
    /// the sequential ramp.
    pub fn bands(&self) -> Vec<LegendBand> {
        match self {
            ColorScale::Quantile(q) => (0..q.range().len())
                .filter_map(|i| {
                    let (from, to) = q.invert_extent(i)?;
                    Some(LegendBand { from, to, color: q.range()[i] })
                })
                .collect(),
            ColorScale::Sequential => {
                let steps = 50;
                (0..steps)
                    .map(|i| {
                        let from = 100.0 * i as f64 / steps as f64;
                        let to = 100.0 * (i + 1) as f64 / steps as f64;
                        LegendBand { from, to, color: interpolate_blues((from + to) / 200.0) }
                    })
                    .collect()
            }
        }
    }

    /// Axis tick values: the bucket thresholds, or every ten percent.
    pub fn ticks(&self) -> Vec<f64> {
        match self {
            ColorScale::Quantile(q) => {
                let mut ticks = Vec::with_capacity(q.thresholds().len() + 2);
                if let Some((lo, hi)) = q.extent() {
                    ticks.push(lo);
                    ticks.extend_from_slice(q.thresholds());
                    ticks.push(hi);
                }
                ticks.dedup();
                ticks
            }
            ColorScale::Sequential => (0..=10).map(|i| i as f64 * 10.0).collect(),
        }
    }
}

/// Tick label: whole numbers without decimals, everything else to one place.
pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}%", value)
    } else {
        format!("{:.1}%", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_endpoints_match_palette_ends() {
        assert_eq!(interpolate_blues(0.0), Rgb(0xf7, 0xfb, 0xff));
        assert_eq!(interpolate_blues(1.0), Rgb(0x08, 0x30, 0x6b));
        assert_eq!(interpolate_blues(-3.0), interpolate_blues(0.0));
        assert_eq!(interpolate_blues(7.0), interpolate_blues(1.0));
    }

    #[test]
    fn ramp_darkens_monotonically() {
        let mut previous = interpolate_blues(0.0);
        for i in 1..=200 {
            let next = interpolate_blues(i as f64 / 200.0);
            assert!(next.0 <= previous.0 && next.1 <= previous.1 && next.2 <= previous.2);
            assert!(next.brightness() <= previous.brightness());
            previous = next;
        }
    }

    #[test]
    fn quantile_thresholds_follow_r7() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let scale = QuantileScale::new(values, blues(4));
        // p = .25, .5, .75 over 1..=10
        assert_eq!(scale.thresholds(), &[3.25, 5.5, 7.75]);
        assert_eq!(scale.bucket(1.0), 0);
        assert_eq!(scale.bucket(3.25), 1);
        assert_eq!(scale.bucket(5.0), 1);
        assert_eq!(scale.bucket(10.0), 3);
        assert_eq!(scale.invert_extent(0), Some((1.0, 3.25)));
        assert_eq!(scale.invert_extent(3), Some((7.75, 10.0)));
        assert_eq!(scale.invert_extent(4), None);
    }

    #[test]
    fn nine_buckets_hold_equal_counts() {
        let values: Vec<f64> = (0..900).map(|i| i as f64 / 9.0).collect();
        let scale = QuantileScale::new(values.clone(), BLUES.to_vec());
        assert_eq!(scale.thresholds().len(), 8);

        let mut counts = [0usize; 9];
        for v in &values {
            counts[scale.bucket(*v)] += 1;
        }
        for count in counts {
            assert!((99..=101).contains(&count), "counts = {:?}", counts);
        }
    }

    #[test]
    fn same_bucket_same_swatch() {
        let scale = ColorScale::new(ScaleKind::Quantile, (0..90).map(f64::from), 9);
        let ColorScale::Quantile(q) = &scale else { panic!("expected quantile scale") };
        for a in 0..90 {
            for b in 0..90 {
                let (a, b) = (a as f64, b as f64);
                if q.bucket(a) == q.bucket(b) {
                    assert_eq!(scale.color(a), scale.color(b));
                } else {
                    assert_ne!(scale.color(a), scale.color(b));
                }
            }
        }
    }

    #[test]
    fn empty_domain_degrades_to_lightest_swatch() {
        let scale = ColorScale::new(ScaleKind::Quantile, Vec::new(), 9);
        assert_eq!(scale.color(50.0), BLUES[0]);
        assert!(scale.bands().is_empty());
        assert!(scale.ticks().is_empty());
        assert_eq!(scale.domain(), (0.0, 100.0));
    }

    #[test]
    fn quantile_bands_tile_the_domain() {
        let scale = ColorScale::new(ScaleKind::Quantile, [2.6, 10.0, 21.4, 35.0, 75.1], 9);
        let bands = scale.bands();
        assert_eq!(bands.len(), 9);
        assert_eq!(bands[0].from, 2.6);
        assert_eq!(bands[8].to, 75.1);
        for pair in bands.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
    }

    #[test]
    fn sequential_bands_cover_zero_to_hundred() {
        let bands = ColorScale::Sequential.bands();
        assert_eq!(bands.first().map(|b| b.from), Some(0.0));
        assert_eq!(bands.last().map(|b| b.to), Some(100.0));
        assert_eq!(ColorScale::Sequential.ticks().len(), 11);
    }

    #[test]
    fn percent_labels() {
        assert_eq!(format_percent(12.0), "12%");
        assert_eq!(format_percent(21.4), "21.4%");
        assert_eq!(format_percent(33.333), "33.3%");
    }

    #[test]
    fn small_palettes_are_sampled_from_the_ramp() {
        let three = blues(3);
        assert_eq!(three[0], interpolate_blues(0.0));
        assert_eq!(three[2], interpolate_blues(1.0));
        assert_eq!(blues(9), BLUES.to_vec());
    }
}
