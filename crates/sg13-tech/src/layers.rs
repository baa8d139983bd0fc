//! SG13G2 layer table.

use sg13_core::{LayerMap, LayerPurpose};

pub const ACTIV: &str = "Activ";
pub const GATPOLY: &str = "GatPoly";
pub const CONT: &str = "Cont";
pub const METAL1: &str = "Metal1";
pub const METAL2: &str = "Metal2";
pub const VIA1: &str = "Via1";
pub const PSD: &str = "pSD";
pub const NWELL: &str = "NWell";
pub const THICK_GATE_OX: &str = "ThickGateOx";
pub const HEAT_TRANS: &str = "HeatTrans";
pub const SUBSTRATE: &str = "Substrate";

/// (name, purpose, GDS layer, GDS datatype)
const SG13G2_LAYERS: &[(&str, LayerPurpose, u16, u16)] = &[
    (ACTIV, LayerPurpose::Drawing, 1, 0),
    (GATPOLY, LayerPurpose::Drawing, 5, 0),
    (GATPOLY, LayerPurpose::Pin, 5, 2),
    (CONT, LayerPurpose::Drawing, 6, 0),
    (METAL1, LayerPurpose::Drawing, 8, 0),
    (METAL1, LayerPurpose::Pin, 8, 2),
    (METAL2, LayerPurpose::Drawing, 10, 0),
    (METAL2, LayerPurpose::Pin, 10, 2),
    (PSD, LayerPurpose::Drawing, 14, 0),
    (VIA1, LayerPurpose::Drawing, 19, 0),
    (NWELL, LayerPurpose::Drawing, 31, 0),
    (SUBSTRATE, LayerPurpose::Drawing, 40, 0),
    (THICK_GATE_OX, LayerPurpose::Drawing, 44, 0),
    (HEAT_TRANS, LayerPurpose::Drawing, 51, 0),
];

pub fn sg13g2_layers() -> LayerMap {
    let mut map = LayerMap::new();
    for &(name, purpose, layer, datatype) in SG13G2_LAYERS {
        map.add_layer(name, purpose, layer, datatype);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_resolves() {
        let map = sg13g2_layers();
        assert_eq!(map.layer_count(), SG13G2_LAYERS.len());
        let m1_pin = map.pin(METAL1).unwrap();
        let info = map.info(m1_pin).unwrap();
        assert_eq!((info.gds_layer, info.gds_datatype), (8, 2));
        assert!(map.pin(ACTIV).is_err());
    }
}
