//! Numeric helpers for building scene descriptions.

use std::f64::consts::PI;

pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * (PI / 180.0)
}

pub fn radians_to_degrees(radians: f64) -> f64 {
    radians * (180.0 / PI)
}

/// `percentage` percent of `total`.
pub fn percentage_of(percentage: f64, total: f64) -> f64 {
    (percentage / 100.0) * total
}

/// The larger side of the most square grid holding exactly `total` cells,
/// e.g. 4 for 12 (3 x 4) and 7 for 7 (1 x 7). Zero for `total < 2`.
pub fn round_square_root(total: u64) -> u64 {
    let mut best = (0, 0);
    let mut smallest_diff = u64::MAX;

    for x in 1..total {
        if total % x != 0 {
            continue;
        }
        let y = total / x;
        let diff = x.abs_diff(y);
        if diff < smallest_diff {
            smallest_diff = diff;
            best = (x, y);
        }
    }

    best.0.max(best.1)
}

/// Constrain `value` to the range between `min` and `max`. The bounds may
/// be given in either order.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if min > max {
        value.max(max).min(min)
    } else {
        value.max(min).min(max)
    }
}

/// Map `value` from the range `from_start..from_end` onto
/// `to_start..to_end`, optionally clamping to the target range.
pub fn remap_value(
    value: f64,
    from_start: f64,
    from_end: f64,
    to_start: f64,
    to_end: f64,
    should_clamp: bool,
) -> f64 {
    let scale = (to_end - to_start) / (from_end - from_start);
    let result = to_start + (value - from_start) * scale;

    if should_clamp {
        clamp(result, to_start, to_end)
    } else {
        result
    }
}

/// Euclidean distance between two points.
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x1 - x2).hypot(y1 - y2)
}

pub fn difference(a: f64, b: f64) -> f64 {
    a - b
}
