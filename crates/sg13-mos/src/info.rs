use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::class::{DeviceKind, VoltageClass};
use crate::params::DeviceParameters;

/// Netlisting metadata carried next to the geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInfo {
    pub model: String,
    pub spice_type: String,
    pub spice_lib: String,
    pub port_order: Vec<String>,
    /// Layout port name to subcircuit pin.
    pub port_map: BTreeMap<String, String>,
    /// Instance parameters in SI units.
    pub params: BTreeMap<String, f64>,
}

/// SPICE model name of a device kind.
pub fn model_name(kind: DeviceKind) -> &'static str {
    use crate::class::Polarity::*;
    let class = kind.class();
    match (class.polarity, class.voltage) {
        (N, VoltageClass::Lv) => "sg13_lv_nmos",
        (P, VoltageClass::Lv) => "sg13_lv_pmos",
        (N, VoltageClass::Hv) => "sg13_hv_nmos",
        (P, VoltageClass::Hv) => "sg13_hv_pmos",
    }
}

pub fn spice_lib(kind: DeviceKind) -> &'static str {
    match kind.class().voltage {
        VoltageClass::Lv => "sg13g2_moslv_mod.lib",
        VoltageClass::Hv => "sg13g2_moshv_mod.lib",
    }
}

impl SimulationInfo {
    pub fn for_device(params: &DeviceParameters) -> Self {
        let kind = params.kind;
        let port_map = [("D", "d"), ("G", "g"), ("S", "s")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut values = BTreeMap::new();
        values.insert("w".to_string(), params.width * 1e-6);
        values.insert("l".to_string(), params.length * 1e-6);
        values.insert("ng".to_string(), params.fingers as f64);
        values.insert("m".to_string(), params.multiplier as f64);
        if kind.class().rf {
            values.insert("rfmode".to_string(), 1.0);
        }
        Self {
            model: model_name(kind).to_string(),
            spice_type: "SUBCKT".to_string(),
            spice_lib: spice_lib(kind).to_string(),
            port_order: ["d", "g", "s", "b"].iter().map(|s| s.to_string()).collect(),
            port_map,
            params: values,
        }
    }
}
