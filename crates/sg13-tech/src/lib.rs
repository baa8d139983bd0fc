//! # SG13 Tech
//!
//! The SG13G2 process as seen by the device generators: an immutable
//! [`DesignRuleSet`] and the layer table. Both are read-only after
//! construction and can be shared across threads freely.

pub mod error;
pub mod layers;
pub mod limits;
pub mod rules;

use std::path::Path;

use sg13_core::LayerMap;

pub use error::{TechError, TechResult};
pub use limits::{DeviceLimitTable, DeviceLimits};
pub use rules::{ContactRules, DesignRuleSet, GridRules, MosRules, RfRules, Via1Rules};

/// Design rules plus the layer map they are drawn on.
#[derive(Debug, Clone)]
pub struct Technology {
    pub rules: DesignRuleSet,
    pub layers: LayerMap,
}

impl Technology {
    pub fn sg13g2() -> Self {
        Self {
            rules: DesignRuleSet::sg13g2(),
            layers: layers::sg13g2_layers(),
        }
    }

    /// SG13G2 layers with rules overridden from a JSON file.
    pub fn with_rule_file(path: impl AsRef<Path>) -> TechResult<Self> {
        Ok(Self {
            rules: DesignRuleSet::from_path(path)?,
            layers: layers::sg13g2_layers(),
        })
    }
}

impl Default for Technology {
    fn default() -> Self {
        Self::sg13g2()
    }
}
