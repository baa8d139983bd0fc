//! Process design-rule constants.
//!
//! Every field has a built-in SG13G2 default, and every struct is
//! `#[serde(default)]`, so a rule file only has to list the constants it
//! overrides. All lengths are in micrometers.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sg13_core::Grid;

use crate::error::{TechError, TechResult};
use crate::limits::DeviceLimitTable;

/// Immutable table of process constants read by every generator call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignRuleSet {
    pub grid: GridRules,
    pub contact: ContactRules,
    pub mos: MosRules,
    pub via1: Via1Rules,
    pub rf: RfRules,
    pub limits: DeviceLimitTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridRules {
    pub resolution: f64,
    pub epsilon: f64,
    pub dbu: f64,
}

impl Default for GridRules {
    fn default() -> Self {
        Self {
            resolution: 0.005,
            epsilon: 0.001,
            dbu: 0.001,
        }
    }
}

/// Cont (diffusion/poly to Metal1) rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactRules {
    pub size: f64,
    pub spacing: f64,
    /// Activ enclosure of Cont.
    pub enc_active: f64,
    /// Metal1 side enclosure of Cont.
    pub metal1_over: f64,
    /// Metal1 endcap enclosure of Cont.
    pub metal1_endcap: f64,
}

impl Default for ContactRules {
    fn default() -> Self {
        Self {
            size: 0.16,
            spacing: 0.18,
            enc_active: 0.07,
            metal1_over: 0.0,
            metal1_endcap: 0.05,
        }
    }
}

/// Rules of the standard (non-RF) MOS body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosRules {
    /// GatPoly extension past Activ (endcap).
    pub gatpoly_activ_over: f64,
    /// Cont to GatPoly spacing.
    pub cont_gate_dist: f64,
    /// GatPoly to Activ spacing; added to the Activ enclosure of Cont for
    /// narrow devices.
    pub gat_d: f64,
    pub psd_activ_over: f64,
    pub psd_gate_over_lv: f64,
    pub psd_gate_over_hv: f64,
    pub nw_activ_over_lv: f64,
    pub nw_activ_over_hv: f64,
    /// ThickGateOx extension over Activ.
    pub tgo_activ: f64,
    /// ThickGateOx extension over GatPoly endcaps.
    pub tgo_gatpoly: f64,
}

impl Default for MosRules {
    fn default() -> Self {
        Self {
            gatpoly_activ_over: 0.18,
            cont_gate_dist: 0.11,
            gat_d: 0.07,
            psd_activ_over: 0.03,
            psd_gate_over_lv: 0.30,
            psd_gate_over_hv: 0.40,
            nw_activ_over_lv: 0.31,
            nw_activ_over_hv: 0.62,
            tgo_activ: 0.27,
            tgo_gatpoly: 0.34,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Via1Rules {
    pub size: f64,
    pub enc: f64,
    pub spacing_narrow: f64,
    pub spacing_wide: f64,
    /// Finger widths at or above this use the wide spacing.
    pub width_threshold: f64,
}

impl Default for Via1Rules {
    fn default() -> Self {
        Self {
            size: 0.19,
            enc: 0.05,
            spacing_narrow: 0.22,
            spacing_wide: 0.29,
            width_threshold: 1.0,
        }
    }
}

/// Rules of the RF MOS body: rows, rings, and isolation margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RfRules {
    pub channel_dist_base: f64,
    pub channel_dist_step: f64,
    pub endpiece_base: f64,
    pub endpiece_step: f64,
    pub short_wide_l_threshold: f64,
    pub short_wide_w_threshold: f64,
    pub short_wide_adjust: f64,
    pub gate_ring_width: f64,
    pub guard_ring_width: f64,
    pub guard_ring_m1_width: f64,
    pub psd_ring_width: f64,
    pub active_gate_dist_x: f64,
    /// Used instead of `active_gate_dist_x` above two contact rows.
    pub active_gate_dist_x_wide: f64,
    pub active_gate_dist_y: f64,
    pub gate_guard_dist: f64,
    pub gate_cont_margin_single: f64,
    pub gate_cont_margin_multi: f64,
    pub gate_cont_offset: f64,
    pub gate_pin_half_width: f64,
    pub guard_cont_offset_h: f64,
    pub guard_cont_offset_v: f64,
    pub sd_margin_x: f64,
    pub sd_margin_y: f64,
    pub sd_metal_width_over: f64,
    pub sd_metal_adjust: f64,
    pub sd_row_spacing: f64,
    pub psd_pmos_inset_x: f64,
    pub psd_pmos_inset_y: f64,
    pub tgo_nmos: f64,
    pub tgo_pmos: f64,
    pub nw_pmos_lv: f64,
    pub nw_pmos_hv: f64,
}

impl Default for RfRules {
    fn default() -> Self {
        Self {
            channel_dist_base: 0.38,
            channel_dist_step: 0.06,
            endpiece_base: 0.36,
            endpiece_step: 0.08,
            short_wide_l_threshold: 0.15,
            short_wide_w_threshold: 5.0,
            short_wide_adjust: 0.015,
            gate_ring_width: 0.30,
            guard_ring_width: 0.36,
            guard_ring_m1_width: 0.26,
            psd_ring_width: 0.66,
            active_gate_dist_x: 0.23,
            active_gate_dist_x_wide: 0.40,
            active_gate_dist_y: 0.25,
            gate_guard_dist: 0.30,
            gate_cont_margin_single: 0.10,
            gate_cont_margin_multi: 0.20,
            gate_cont_offset: 0.08,
            gate_pin_half_width: 0.10,
            guard_cont_offset_h: 0.10,
            guard_cont_offset_v: 0.10,
            sd_margin_x: 0.07,
            sd_margin_y: 0.07,
            sd_metal_width_over: 0.14,
            sd_metal_adjust: 0.04,
            sd_row_spacing: 0.18,
            psd_pmos_inset_x: 0.54,
            psd_pmos_inset_y: 0.54,
            tgo_nmos: 0.27,
            tgo_pmos: 0.31,
            nw_pmos_lv: 0.31,
            nw_pmos_hv: 0.62,
        }
    }
}

impl DesignRuleSet {
    /// The SG13G2 table.
    pub fn sg13g2() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> TechResult<Self> {
        let rules: Self = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn from_path(path: impl AsRef<Path>) -> TechResult<Self> {
        let path = path.as_ref();
        log::debug!("loading design rules from {}", path.display());
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn grid(&self) -> Grid {
        Grid {
            resolution: self.grid.resolution,
            epsilon: self.grid.epsilon,
            dbu: self.grid.dbu,
        }
    }

    /// Minimum Activ width that holds one contact with full enclosure.
    pub fn min_contacted_active(&self) -> f64 {
        2.0 * self.contact.enc_active + self.contact.size
    }

    /// Metal1 endcap over contacts, never smaller than the side enclosure.
    pub fn metal1_endcap(&self) -> f64 {
        self.contact.metal1_endcap.max(self.contact.metal1_over)
    }

    pub fn validate(&self) -> TechResult<()> {
        let g = &self.grid;
        Grid::new(g.resolution, g.epsilon, g.dbu).map_err(|_| TechError::InvalidRule {
            name: "grid.resolution",
            value: g.resolution,
            reason: "resolution and dbu must be positive and epsilon smaller than resolution",
        })?;
        let positive = [
            ("contact.size", self.contact.size),
            ("contact.spacing", self.contact.spacing),
            ("via1.size", self.via1.size),
            ("rf.guard_ring_width", self.rf.guard_ring_width),
            ("rf.gate_ring_width", self.rf.gate_ring_width),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(TechError::InvalidRule {
                    name,
                    value,
                    reason: "must be positive",
                });
            }
        }
        if self.rf.psd_ring_width < self.rf.guard_ring_width {
            return Err(TechError::InvalidRule {
                name: "rf.psd_ring_width",
                value: self.rf.psd_ring_width,
                reason: "pSD ring must be at least as wide as the guard ring",
            });
        }
        self.limits.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let rules = DesignRuleSet::sg13g2();
        rules.validate().unwrap();
        assert!((rules.min_contacted_active() - 0.30).abs() < 1e-12);
        assert!((rules.metal1_endcap() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_defaults_on_grid() {
        let rules = DesignRuleSet::sg13g2();
        let grid = rules.grid();
        let rf = &rules.rf;
        for v in [
            rf.gate_ring_width * 0.5,
            rf.guard_ring_width * 0.5,
            rf.guard_ring_width / 4.0,
            (rf.psd_ring_width - rf.guard_ring_width) / 2.0,
            (rf.guard_ring_m1_width) / 2.0,
            (rules.contact.size + rf.sd_metal_width_over) * 0.5,
            rf.short_wide_adjust,
        ] {
            assert!(grid.is_aligned(v), "{v} is off grid");
        }
    }

    #[test]
    fn test_partial_override() {
        let rules = DesignRuleSet::from_json(r#"{ "contact": { "spacing": 0.2 } }"#).unwrap();
        assert!((rules.contact.spacing - 0.2).abs() < 1e-12);
        assert!((rules.contact.size - 0.16).abs() < 1e-12);
        assert_eq!(rules.mos, MosRules::default());
    }

    #[test]
    fn test_invalid_grid_rejected() {
        let err = DesignRuleSet::from_json(r#"{ "grid": { "resolution": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, TechError::InvalidRule { .. }));
    }

    #[test]
    fn test_json_roundtrip_preserves_table() {
        let rules = DesignRuleSet::sg13g2();
        let back = DesignRuleSet::from_json(&rules.to_json().unwrap()).unwrap();
        assert_eq!(rules, back);
    }
}
