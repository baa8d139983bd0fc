use serde::{Deserialize, Serialize};

use crate::error::{TechError, TechResult};

/// Accepted parameter ranges of one device kind. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceLimits {
    pub min_width: f64,
    pub max_width: f64,
    pub min_length: f64,
    pub max_length: f64,
    pub max_fingers: u32,
    pub max_contact_rows: u32,
}

impl DeviceLimits {
    const fn fet(min_width: f64, min_length: f64) -> Self {
        Self {
            min_width,
            max_width: 100.0,
            min_length,
            max_length: 20.0,
            max_fingers: 1000,
            max_contact_rows: 1,
        }
    }

    const fn rf(min_length: f64) -> Self {
        Self {
            min_width: 1.0,
            max_width: 100.0,
            min_length,
            max_length: 20.0,
            max_fingers: 64,
            max_contact_rows: 8,
        }
    }
}

/// Limits for every device kind the generators know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceLimitTable {
    pub nmos: DeviceLimits,
    pub pmos: DeviceLimits,
    pub nmos_hv: DeviceLimits,
    pub pmos_hv: DeviceLimits,
    pub rfnmos: DeviceLimits,
    pub rfpmos: DeviceLimits,
    pub rfnmos_hv: DeviceLimits,
    pub rfpmos_hv: DeviceLimits,
}

impl Default for DeviceLimitTable {
    fn default() -> Self {
        Self {
            nmos: DeviceLimits::fet(0.15, 0.13),
            pmos: DeviceLimits::fet(0.15, 0.13),
            nmos_hv: DeviceLimits::fet(0.30, 0.45),
            pmos_hv: DeviceLimits::fet(0.30, 0.40),
            rfnmos: DeviceLimits::rf(0.13),
            rfpmos: DeviceLimits::rf(0.13),
            rfnmos_hv: DeviceLimits::rf(0.45),
            rfpmos_hv: DeviceLimits::rf(0.40),
        }
    }
}

impl DeviceLimitTable {
    pub fn all(&self) -> [(&'static str, &DeviceLimits); 8] {
        [
            ("nmos", &self.nmos),
            ("pmos", &self.pmos),
            ("nmos_hv", &self.nmos_hv),
            ("pmos_hv", &self.pmos_hv),
            ("rfnmos", &self.rfnmos),
            ("rfpmos", &self.rfpmos),
            ("rfnmos_hv", &self.rfnmos_hv),
            ("rfpmos_hv", &self.rfpmos_hv),
        ]
    }

    pub fn validate(&self) -> TechResult<()> {
        for (_, limits) in self.all() {
            if limits.min_width <= 0.0 || limits.max_width < limits.min_width {
                return Err(TechError::InvalidRule {
                    name: "limits.width",
                    value: limits.min_width,
                    reason: "width range is empty",
                });
            }
            if limits.min_length <= 0.0 || limits.max_length < limits.min_length {
                return Err(TechError::InvalidRule {
                    name: "limits.length",
                    value: limits.min_length,
                    reason: "length range is empty",
                });
            }
            if limits.max_fingers == 0 || limits.max_contact_rows == 0 {
                return Err(TechError::InvalidRule {
                    name: "limits.max_fingers",
                    value: limits.max_fingers as f64,
                    reason: "finger and contact-row maxima must be at least one",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = DeviceLimitTable::default();
        table.validate().unwrap();
        assert!((table.nmos_hv.min_length - 0.45).abs() < 1e-12);
        assert_eq!(table.rfpmos.max_contact_rows, 8);
        assert_eq!(table.pmos.max_contact_rows, 1);
    }

    #[test]
    fn test_empty_range_rejected() {
        let mut table = DeviceLimitTable::default();
        table.rfnmos.max_width = 0.5;
        assert!(table.validate().is_err());
    }
}
