use crate::error::{HighwayError, Result};
use std::f64::consts::PI;

/// A closed interval `[min, max]` as it appears in the configuration files.
pub type Range = [f64; 2];

/// Linear map of `v` from range `x` onto range `y`. Not clipped.
pub fn lmap(v: f64, x: Range, y: Range) -> f64 {
    y[0] + (v - x[0]) * (y[1] - y[0]) / (x[1] - x[0])
}

/// Split `count` into `bins` integers that differ by at most one.
///
/// The remainder goes to the first bins, so `near_split(7, 3) == [3, 2, 2]`.
pub fn near_split(count: usize, bins: usize) -> Result<Vec<usize>> {
    if bins == 0 {
        return Err(HighwayError::InvalidSplit { count, bins });
    }
    let quotient = count / bins;
    let remainder = count % bins;
    Ok((0..bins)
        .map(|i| if i < remainder { quotient + 1 } else { quotient })
        .collect())
}

pub fn not_zero(x: f64) -> f64 {
    const EPS: f64 = 1e-2;
    if x.abs() > EPS {
        x
    } else if x >= 0.0 {
        EPS
    } else {
        -EPS
    }
}

pub fn wrap_to_pi(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}
