use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sg13_tech::DesignRuleSet;

use crate::class::DeviceKind;
use crate::error::{MosError, MosResult};

/// Which sides of the RF guard ring carry metal and contacts.
///
/// The Activ frame of the ring is drawn in every mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardRingMode {
    #[default]
    Full,
    None,
    LeftRightOnly,
    TopBottomOnly,
    /// Top, bottom and right; the left side stays open.
    OpenLeft,
}

impl GuardRingMode {
    pub const ALL: [GuardRingMode; 5] = [
        GuardRingMode::Full,
        GuardRingMode::None,
        GuardRingMode::LeftRightOnly,
        GuardRingMode::TopBottomOnly,
        GuardRingMode::OpenLeft,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GuardRingMode::Full => "full",
            GuardRingMode::None => "none",
            GuardRingMode::LeftRightOnly => "left_right",
            GuardRingMode::TopBottomOnly => "top_bottom",
            GuardRingMode::OpenLeft => "open_left",
        }
    }

    pub fn has_bottom(&self) -> bool {
        matches!(
            self,
            GuardRingMode::Full | GuardRingMode::TopBottomOnly | GuardRingMode::OpenLeft
        )
    }

    pub fn has_top(&self) -> bool {
        self.has_bottom()
    }

    pub fn has_left(&self) -> bool {
        matches!(self, GuardRingMode::Full | GuardRingMode::LeftRightOnly)
    }

    pub fn has_right(&self) -> bool {
        matches!(
            self,
            GuardRingMode::Full | GuardRingMode::LeftRightOnly | GuardRingMode::OpenLeft
        )
    }
}

impl fmt::Display for GuardRingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GuardRingMode {
    type Err = MosError;

    /// Accepts the mode names plus the legacy spellings `Yes`, `No`, `U`,
    /// `Top+Bottom` and `Left+Right`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mode = match s.to_ascii_lowercase().as_str() {
            "full" | "yes" => GuardRingMode::Full,
            "none" | "no" => GuardRingMode::None,
            "left_right" | "left+right" => GuardRingMode::LeftRightOnly,
            "top_bottom" | "top+bottom" => GuardRingMode::TopBottomOnly,
            "open_left" | "u" => GuardRingMode::OpenLeft,
            _ => {
                return Err(MosError::UnknownName {
                    what: "guard ring mode",
                    value: s.to_string(),
                })
            }
        };
        Ok(mode)
    }
}

/// One generator request. Lengths are micrometers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceParameters {
    pub kind: DeviceKind,
    /// Total channel width over all fingers.
    pub width: f64,
    pub length: f64,
    pub fingers: u32,
    pub multiplier: u32,
    /// S/D contact rows per region; RF only.
    pub contact_rows: u32,
    /// RF only.
    pub guard_ring: GuardRingMode,
    /// RF only.
    pub gate_ring: bool,
    /// RF only.
    pub metal2_overlay: bool,
}

impl DeviceParameters {
    /// Defaults of the given kind.
    pub fn new(kind: DeviceKind) -> Self {
        let (width, length) = match kind {
            DeviceKind::Nmos | DeviceKind::Pmos => (0.15, 0.13),
            DeviceKind::NmosHv => (0.60, 0.45),
            DeviceKind::PmosHv => (0.30, 0.40),
            DeviceKind::Rfnmos | DeviceKind::Rfpmos => (1.0, 0.13),
            DeviceKind::RfnmosHv => (1.0, 0.45),
            DeviceKind::RfpmosHv => (1.0, 0.40),
        };
        Self {
            kind,
            width,
            length,
            fingers: 1,
            multiplier: 1,
            contact_rows: 1,
            guard_ring: GuardRingMode::Full,
            gate_ring: true,
            metal2_overlay: true,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    pub fn with_fingers(mut self, fingers: u32) -> Self {
        self.fingers = fingers;
        self
    }

    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_contact_rows(mut self, rows: u32) -> Self {
        self.contact_rows = rows;
        self
    }

    pub fn with_guard_ring(mut self, mode: GuardRingMode) -> Self {
        self.guard_ring = mode;
        self
    }

    pub fn with_gate_ring(mut self, enabled: bool) -> Self {
        self.gate_ring = enabled;
        self
    }

    pub fn with_metal2_overlay(mut self, enabled: bool) -> Self {
        self.metal2_overlay = enabled;
        self
    }

    /// Checks every bound of the device kind. Runs before anything is drawn.
    pub fn validate(&self, rules: &DesignRuleSet) -> MosResult<()> {
        let device = self.kind.name();
        let limits = self.kind.limits(rules);
        let eps = rules.grid.epsilon;

        for (param, value) in [("width", self.width), ("length", self.length)] {
            if !value.is_finite() {
                return Err(MosError::NotFinite {
                    device,
                    param,
                    value,
                });
            }
        }
        check_range(device, "width", self.width, limits.min_width, limits.max_width, eps)?;
        check_range(device, "length", self.length, limits.min_length, limits.max_length, eps)?;
        check_count(device, "nf", self.fingers, limits.max_fingers)?;
        check_count(device, "m", self.multiplier, u32::MAX)?;
        let max_rows = if self.kind.class().rf {
            limits.max_contact_rows
        } else {
            1
        };
        check_count(device, "contact rows", self.contact_rows, max_rows)?;
        Ok(())
    }
}

fn check_range(
    device: &'static str,
    param: &'static str,
    value: f64,
    min: f64,
    max: f64,
    eps: f64,
) -> MosResult<()> {
    if value < min - eps || value > max + eps {
        return Err(MosError::OutOfRange {
            device,
            param,
            value: tidy(value),
            min: tidy(min),
            max: tidy(max),
        });
    }
    Ok(())
}

/// Drops accumulated float noise so derived bounds print as written.
fn tidy(x: f64) -> f64 {
    (x * 1e9).round() / 1e9
}

fn check_count(device: &'static str, param: &'static str, value: u32, max: u32) -> MosResult<()> {
    if value == 0 || value > max {
        return Err(MosError::OutOfRange {
            device,
            param,
            value: value as f64,
            min: 1.0,
            max: max as f64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let rules = DesignRuleSet::sg13g2();
        for kind in DeviceKind::ALL {
            DeviceParameters::new(kind).validate(&rules).unwrap();
        }
    }

    #[test]
    fn test_width_below_min() {
        let rules = DesignRuleSet::sg13g2();
        let err = DeviceParameters::new(DeviceKind::Nmos)
            .with_width(0.14)
            .validate(&rules)
            .unwrap_err();
        assert_eq!(err.to_string(), "nmos width 0.14 is outside [0.15, 100]");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_length_bounds_per_kind() {
        let rules = DesignRuleSet::sg13g2();
        let err = DeviceParameters::new(DeviceKind::NmosHv)
            .with_length(0.44)
            .validate(&rules)
            .unwrap_err();
        assert!(err.to_string().starts_with("nmos_hv length"));
        let err = DeviceParameters::new(DeviceKind::Pmos)
            .with_length(20.01)
            .validate(&rules)
            .unwrap_err();
        assert!(err.to_string().starts_with("pmos length"));
    }

    #[test]
    fn test_finger_bounds() {
        let rules = DesignRuleSet::sg13g2();
        let err = DeviceParameters::new(DeviceKind::Nmos)
            .with_fingers(0)
            .validate(&rules)
            .unwrap_err();
        assert!(err.to_string().starts_with("nmos nf"));
        assert!(DeviceParameters::new(DeviceKind::Rfnmos)
            .with_fingers(65)
            .validate(&rules)
            .is_err());
    }

    #[test]
    fn test_contact_rows_only_for_rf() {
        let rules = DesignRuleSet::sg13g2();
        assert!(DeviceParameters::new(DeviceKind::Nmos)
            .with_contact_rows(2)
            .validate(&rules)
            .is_err());
        DeviceParameters::new(DeviceKind::Rfpmos)
            .with_contact_rows(4)
            .validate(&rules)
            .unwrap();
        assert!(DeviceParameters::new(DeviceKind::Rfpmos)
            .with_contact_rows(9)
            .validate(&rules)
            .is_err());
    }

    #[test]
    fn test_rf_finger_width() {
        let rules = DesignRuleSet::sg13g2();
        for nf in [4, 8, 64] {
            DeviceParameters::new(DeviceKind::Rfnmos)
                .with_width(1.0)
                .with_fingers(nf)
                .validate(&rules)
                .unwrap();
        }
    }

    #[test]
    fn test_derived_bound_prints_clean() {
        let min = 2.0 * 0.07 + 0.16;
        assert_ne!(min, 0.3);
        let err = check_range("rfnmos", "width", 0.2, min, 100.0, 0.001).unwrap_err();
        assert_eq!(err.to_string(), "rfnmos width 0.2 is outside [0.3, 100]");
    }

    #[test]
    fn test_width_within_epsilon_accepted() {
        let rules = DesignRuleSet::sg13g2();
        DeviceParameters::new(DeviceKind::Nmos)
            .with_width(0.1499999)
            .validate(&rules)
            .unwrap();
    }

    #[test]
    fn test_non_finite_rejected() {
        let rules = DesignRuleSet::sg13g2();
        let err = DeviceParameters::new(DeviceKind::Pmos)
            .with_width(f64::NAN)
            .validate(&rules)
            .unwrap_err();
        assert!(matches!(err, MosError::NotFinite { param: "width", .. }));
    }

    #[test]
    fn test_guard_ring_modes() {
        assert_eq!("Yes".parse::<GuardRingMode>().unwrap(), GuardRingMode::Full);
        assert_eq!("U".parse::<GuardRingMode>().unwrap(), GuardRingMode::OpenLeft);
        assert_eq!(
            "Top+Bottom".parse::<GuardRingMode>().unwrap(),
            GuardRingMode::TopBottomOnly
        );
        for mode in GuardRingMode::ALL {
            assert_eq!(mode.name().parse::<GuardRingMode>().unwrap(), mode);
        }
        assert!("ring".parse::<GuardRingMode>().is_err());

        let open = GuardRingMode::OpenLeft;
        assert!(open.has_top() && open.has_bottom() && open.has_right() && !open.has_left());
        let lr = GuardRingMode::LeftRightOnly;
        assert!(!lr.has_bottom() && lr.has_left() && lr.has_right());
        let none = GuardRingMode::None;
        assert!(!none.has_top() && !none.has_left() && !none.has_right());
    }
}
