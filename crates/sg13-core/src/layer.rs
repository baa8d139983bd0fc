use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Opaque token naming one mask layer.
///
/// Handles are only ever compared; generators never derive meaning from the
/// wrapped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerHandle(u32);

impl LayerHandle {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

/// Drawing purpose of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerPurpose {
    Drawing,
    Pin,
}

impl fmt::Display for LayerPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerPurpose::Drawing => write!(f, "drawing"),
            LayerPurpose::Pin => write!(f, "pin"),
        }
    }
}

/// Represents a technology layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerInfo {
    pub handle: LayerHandle,
    pub name: String,
    pub purpose: LayerPurpose,
    pub gds_layer: u16,
    pub gds_datatype: u16,
    pub description: String,
}

impl LayerInfo {
    pub fn new(
        handle: LayerHandle,
        name: &str,
        purpose: LayerPurpose,
        gds_layer: u16,
        gds_datatype: u16,
    ) -> Self {
        Self {
            handle,
            name: name.to_string(),
            purpose,
            gds_layer,
            gds_datatype,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// `Name.purpose`, e.g. `Metal1.pin`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.name, self.purpose)
    }
}

/// Resolves layer names to handles for one process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerMap {
    layers: Vec<LayerInfo>,
}

impl LayerMap {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Registers a layer and returns its freshly allocated handle.
    pub fn add_layer(
        &mut self,
        name: &str,
        purpose: LayerPurpose,
        gds_layer: u16,
        gds_datatype: u16,
    ) -> LayerHandle {
        let handle = LayerHandle::new(self.layers.len() as u32);
        self.layers
            .push(LayerInfo::new(handle, name, purpose, gds_layer, gds_datatype));
        handle
    }

    pub fn get(&self, name: &str, purpose: LayerPurpose) -> CoreResult<LayerHandle> {
        self.layers
            .iter()
            .find(|l| l.name == name && l.purpose == purpose)
            .map(|l| l.handle)
            .ok_or_else(|| CoreError::UnknownLayer {
                name: name.to_string(),
                purpose,
            })
    }

    pub fn drawing(&self, name: &str) -> CoreResult<LayerHandle> {
        self.get(name, LayerPurpose::Drawing)
    }

    pub fn pin(&self, name: &str) -> CoreResult<LayerHandle> {
        self.get(name, LayerPurpose::Pin)
    }

    pub fn info(&self, handle: LayerHandle) -> Option<&LayerInfo> {
        self.layers.iter().find(|l| l.handle == handle)
    }

    pub fn get_by_gds(&self, gds_layer: u16, gds_datatype: u16) -> Option<&LayerInfo> {
        self.layers
            .iter()
            .find(|l| l.gds_layer == gds_layer && l.gds_datatype == gds_datatype)
    }

    pub fn all_layers(&self) -> &[LayerInfo] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_resolve() {
        let mut map = LayerMap::new();
        let drawing = map.add_layer("Metal1", LayerPurpose::Drawing, 8, 0);
        let pin = map.add_layer("Metal1", LayerPurpose::Pin, 8, 2);
        assert_ne!(drawing, pin);
        assert_eq!(map.drawing("Metal1").unwrap(), drawing);
        assert_eq!(map.pin("Metal1").unwrap(), pin);
        assert_eq!(map.get_by_gds(8, 2).unwrap().handle, pin);
        assert_eq!(map.info(pin).unwrap().qualified_name(), "Metal1.pin");
    }

    #[test]
    fn test_unknown_layer() {
        let map = LayerMap::new();
        let err = map.drawing("Activ").unwrap_err();
        assert!(err.to_string().contains("Activ"));
    }
}
