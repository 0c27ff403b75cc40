//! Fill color selection for heat map cells.
//!
//! ColorBrewer's palettes are unbeatable but don't scale to arbitrary data
//! classes. Few distinct counts get a discrete Oranges class each; many
//! distinct counts fall back to a continuous Reds ramp.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::CellRecord;

/// Smallest palette the ordinal scale uses, whatever the data.
pub const MIN_DOMAIN_SIZE: usize = 3;

/// From this many classes on, the scale is sequential.
pub const SEQUENTIAL_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    const fn hex(v: u32) -> Self {
        Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// ── Palettes ────────────────────────────────────────────────────────

const ORANGES_3: [Rgb; 3] = [Rgb::hex(0xfee6ce), Rgb::hex(0xfdae6b), Rgb::hex(0xe6550d)];
const ORANGES_4: [Rgb; 4] = [
    Rgb::hex(0xfeedde),
    Rgb::hex(0xfdbe85),
    Rgb::hex(0xfd8d3c),
    Rgb::hex(0xd94701),
];
const ORANGES_5: [Rgb; 5] = [
    Rgb::hex(0xfeedde),
    Rgb::hex(0xfdbe85),
    Rgb::hex(0xfd8d3c),
    Rgb::hex(0xe6550d),
    Rgb::hex(0xa63603),
];
const ORANGES_6: [Rgb; 6] = [
    Rgb::hex(0xfeedde),
    Rgb::hex(0xfdd0a2),
    Rgb::hex(0xfdae6b),
    Rgb::hex(0xfd8d3c),
    Rgb::hex(0xe6550d),
    Rgb::hex(0xa63603),
];
const ORANGES_7: [Rgb; 7] = [
    Rgb::hex(0xfeedde),
    Rgb::hex(0xfdd0a2),
    Rgb::hex(0xfdae6b),
    Rgb::hex(0xfd8d3c),
    Rgb::hex(0xf16913),
    Rgb::hex(0xd94801),
    Rgb::hex(0x8c2d04),
];
const ORANGES_8: [Rgb; 8] = [
    Rgb::hex(0xfff5eb),
    Rgb::hex(0xfee6ce),
    Rgb::hex(0xfdd0a2),
    Rgb::hex(0xfdae6b),
    Rgb::hex(0xfd8d3c),
    Rgb::hex(0xf16913),
    Rgb::hex(0xd94801),
    Rgb::hex(0x8c2d04),
];
const ORANGES_9: [Rgb; 9] = [
    Rgb::hex(0xfff5eb),
    Rgb::hex(0xfee6ce),
    Rgb::hex(0xfdd0a2),
    Rgb::hex(0xfdae6b),
    Rgb::hex(0xfd8d3c),
    Rgb::hex(0xf16913),
    Rgb::hex(0xd94801),
    Rgb::hex(0xa63603),
    Rgb::hex(0x7f2704),
];

const REDS_9: [Rgb; 9] = [
    Rgb::hex(0xfff5f0),
    Rgb::hex(0xfee0d2),
    Rgb::hex(0xfcbba1),
    Rgb::hex(0xfc9272),
    Rgb::hex(0xfb6a4a),
    Rgb::hex(0xef3b2c),
    Rgb::hex(0xcb181d),
    Rgb::hex(0xa50f15),
    Rgb::hex(0x67000d),
];

/// The Oranges scheme with `classes` colors, clamped to 3..=9.
pub fn oranges(classes: usize) -> &'static [Rgb] {
    match classes {
        0..=3 => &ORANGES_3,
        4 => &ORANGES_4,
        5 => &ORANGES_5,
        6 => &ORANGES_6,
        7 => &ORANGES_7,
        8 => &ORANGES_8,
        _ => &ORANGES_9,
    }
}

/// Uniform cubic B-spline through `REDS_9`, `t` clamped to `[0, 1]`.
pub fn interpolate_reds(t: f64) -> Rgb {
    let channel = |pick: fn(&Rgb) -> u8| -> u8 {
        let values: Vec<f64> = REDS_9.iter().map(|c| pick(c) as f64).collect();
        basis_spline(&values, t).round().clamp(0.0, 255.0) as u8
    };
    Rgb::new(channel(|c| c.r), channel(|c| c.g), channel(|c| c.b))
}

fn basis_spline(values: &[f64], t: f64) -> f64 {
    let n = values.len() - 1;
    let (t, i) = if t.is_nan() || t <= 0.0 {
        (0.0, 0)
    } else if t >= 1.0 {
        (1.0, n - 1)
    } else {
        (t, (t * n as f64).floor() as usize)
    };
    let v1 = values[i];
    let v2 = values[i + 1];
    let v0 = if i > 0 { values[i - 1] } else { 2.0 * v1 - v2 };
    let v3 = if i < n - 1 { values[i + 2] } else { 2.0 * v2 - v1 };
    let t1 = (t - i as f64 / n as f64) * n as f64;
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

// ── Scale ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleKind {
    Ordinal,
    Sequential,
}

/// Maps a cell's count to its fill.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorScale {
    /// One palette class per distinct count, ascending.
    Ordinal {
        domain: Vec<u32>,
        palette: &'static [Rgb],
    },
    /// Continuous Reds ramp over `[low, high]`.
    Sequential { low: u32, high: u32 },
}

impl ColorScale {
    /// Choose a scale from the distribution of counts. Input order is irrelevant.
    pub fn select(records: &[CellRecord]) -> Self {
        let distinct: BTreeSet<u32> = records.iter().map(|r| r.count).collect();
        let domain_size = distinct.len().max(MIN_DOMAIN_SIZE);

        if domain_size >= SEQUENTIAL_THRESHOLD {
            // Descending order: the first record has the highest count, the
            // last the lowest.
            let (low, high) = sequential_domain(
                distinct.last().copied(),
                distinct.first().copied(),
            );
            return ColorScale::Sequential { low, high };
        }

        ColorScale::Ordinal {
            domain: distinct.into_iter().collect(),
            palette: oranges(domain_size),
        }
    }

    pub fn kind(&self) -> ScaleKind {
        match self {
            ColorScale::Ordinal { .. } => ScaleKind::Ordinal,
            ColorScale::Sequential { .. } => ScaleKind::Sequential,
        }
    }

    pub fn color(&self, count: u32) -> Rgb {
        match self {
            ColorScale::Ordinal { domain, palette } => {
                // Unknown counts take the next implicit class, like an
                // ordinal scale that extends its domain on lookup.
                let position = domain
                    .iter()
                    .position(|&d| d == count)
                    .unwrap_or(domain.len());
                palette[position % palette.len()]
            }
            ColorScale::Sequential { low, high } => {
                let t = if low == high {
                    0.5
                } else {
                    (count as f64 - *low as f64) / (*high as f64 - *low as f64)
                };
                interpolate_reds(t)
            }
        }
    }
}

/// `[low, high]` of the sequential scale from the highest and lowest counts.
///
/// The fallback for a missing highest count is `1 + (lowest or 1)`, not
/// `(highest or 1) + ...`. Both ends are always present when this scale is
/// selected, so the difference is unobservable in practice.
pub fn sequential_domain(highest: Option<u32>, lowest: Option<u32>) -> (u32, u32) {
    let low = lowest.unwrap_or(1);
    let high = highest.unwrap_or(1 + lowest.unwrap_or(1));
    (low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(counts: &[u32]) -> Vec<CellRecord> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &count)| CellRecord {
                key: format!("{:02}:{:02}", i / 60, i % 60),
                hour: (i / 60) as u8,
                minute: (i % 60) as u8,
                count,
                expressions: vec!["x".to_string()],
            })
            .collect()
    }

    #[test]
    fn few_distinct_counts_are_ordinal() {
        let scale = ColorScale::select(&records(&[1, 1, 2]));
        assert_eq!(scale.kind(), ScaleKind::Ordinal);
        match &scale {
            ColorScale::Ordinal { domain, palette } => {
                assert_eq!(domain, &vec![1, 2]);
                assert_eq!(palette.len(), 3);
            }
            other => panic!("expected ordinal, got {other:?}"),
        }
        assert_eq!(scale.color(1), Rgb::hex(0xfee6ce));
        assert_eq!(scale.color(2), Rgb::hex(0xfdae6b));
    }

    #[test]
    fn nine_distinct_counts_stay_ordinal() {
        let counts: Vec<u32> = (1..=9).collect();
        let scale = ColorScale::select(&records(&counts));
        assert_eq!(scale.kind(), ScaleKind::Ordinal);
        assert_eq!(scale.color(9), Rgb::hex(0x7f2704));
    }

    #[test]
    fn ten_distinct_counts_are_sequential() {
        let counts: Vec<u32> = (3..=12).collect();
        let scale = ColorScale::select(&records(&counts));
        assert_eq!(scale, ColorScale::Sequential { low: 3, high: 12 });
        assert_eq!(scale.color(3), Rgb::hex(0xfff5f0));
        assert_eq!(scale.color(12), Rgb::hex(0x67000d));
    }

    #[test]
    fn selection_ignores_input_order() {
        let mut counts: Vec<u32> = (1..=15).collect();
        let forward = ColorScale::select(&records(&counts));
        counts.reverse();
        let backward = ColorScale::select(&records(&counts));
        assert_eq!(forward, backward);

        let small = ColorScale::select(&records(&[3, 1, 2]));
        let small_sorted = ColorScale::select(&records(&[1, 2, 3]));
        assert_eq!(small, small_sorted);
    }

    #[test]
    fn empty_input_is_ordinal_with_minimum_palette() {
        let scale = ColorScale::select(&[]);
        assert_eq!(
            scale,
            ColorScale::Ordinal {
                domain: vec![],
                palette: oranges(3)
            }
        );
    }

    #[test]
    fn sequential_domain_fallback_precedence() {
        assert_eq!(sequential_domain(Some(9), Some(2)), (2, 9));
        assert_eq!(sequential_domain(None, Some(4)), (4, 5));
        assert_eq!(sequential_domain(None, None), (1, 2));
        assert_eq!(sequential_domain(Some(7), None), (1, 7));
    }

    #[test]
    fn degenerate_sequential_domain_maps_to_midpoint() {
        let scale = ColorScale::Sequential { low: 5, high: 5 };
        assert_eq!(scale.color(5), interpolate_reds(0.5));
    }

    #[test]
    fn reds_ramp_is_monotonically_darker() {
        let lum = |c: Rgb| c.r as u32 + c.g as u32 + c.b as u32;
        let mut previous = u32::MAX;
        for step in 0..=20 {
            let color = interpolate_reds(step as f64 / 20.0);
            assert!(lum(color) <= previous, "step {step} got lighter");
            previous = lum(color);
        }
        assert_eq!(interpolate_reds(-1.0), interpolate_reds(0.0));
        assert_eq!(interpolate_reds(2.0), interpolate_reds(1.0));
    }

    #[test]
    fn rgb_displays_as_hex() {
        assert_eq!(Rgb::new(255, 16, 0).to_string(), "#ff1000");
    }
}
