//! Manufacturing-grid arithmetic.
//!
//! All mask coordinates must be multiples of the process grid. Values are
//! carried as `f64` micrometers, so every rounding step adds a small epsilon
//! before flooring: a value meant to be exactly on grid, such as
//! `0.07 + 0.16`, must not drop one grid step because of binary round-off.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Grid resolution, rounding epsilon, and database unit of a process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Smallest legal coordinate increment.
    pub resolution: f64,
    /// Slack added before flooring.
    pub epsilon: f64,
    /// Database unit of the mask format.
    pub dbu: f64,
}

impl Grid {
    pub fn new(resolution: f64, epsilon: f64, dbu: f64) -> CoreResult<Self> {
        if !(resolution > 0.0 && dbu > 0.0 && epsilon >= 0.0 && epsilon < resolution) {
            return Err(CoreError::InvalidGrid {
                resolution,
                epsilon,
            });
        }
        Ok(Self {
            resolution,
            epsilon,
            dbu,
        })
    }

    /// Floors `x` onto the grid.
    pub fn snap(&self, x: f64) -> f64 {
        fix(x * (1.0 / self.resolution) + self.epsilon) * self.resolution
    }

    pub fn snap_point(&self, x: f64, y: f64) -> (f64, f64) {
        (self.snap(x), self.snap(y))
    }

    /// Whether `x` lies within epsilon of a grid multiple.
    pub fn is_aligned(&self, x: f64) -> bool {
        let steps = (x / self.resolution).round();
        (x - steps * self.resolution).abs() <= self.epsilon
    }

    /// Rounds a port width to an even number of database units, rounding odd
    /// counts up.
    pub fn even_dbu(&self, width: f64) -> f64 {
        let units = (width / self.dbu).round_ties_even() as i64;
        (units + units.rem_euclid(2)) as f64 * self.dbu
    }

    /// Width expressed in database units, if it is a whole number of them.
    pub fn to_dbu(&self, width: f64) -> Option<i64> {
        let units = (width / self.dbu).round();
        ((width / self.dbu - units).abs() < 1e-6).then_some(units as i64)
    }
}

/// Floor toward negative infinity, as a count.
pub fn fix(x: f64) -> f64 {
    x.floor()
}
