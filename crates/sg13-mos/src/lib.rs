//! # SG13 MOS
//!
//! Parametric layout generators for the SG13G2 MOSFETs: the standard
//! multi-finger devices (`nmos`, `pmos`, `nmos_hv`, `pmos_hv`) and their RF
//! counterparts with gate ring, guard ring and substrate isolation.
//!
//! Every call is pure: it validates the request, draws into its own
//! [`LayoutBuilder`](sg13_core::LayoutBuilder) and hands back an immutable
//! layout. The [`Technology`] is only read, so one instance can serve any
//! number of threads.

pub mod class;
pub mod contacts;
pub mod error;
pub mod info;
pub mod mos;
pub mod params;
pub mod ports;
pub mod replay;
pub mod rf;

use serde::{Deserialize, Serialize};
use sg13_core::Layout;
use sg13_tech::Technology;

pub use class::{DeviceClass, DeviceKind, Polarity, VoltageClass};
pub use contacts::{ContactArray, ContactRun, RunShapes};
pub use error::{MosError, MosResult};
pub use info::SimulationInfo;
pub use mos::{MosBodyBuilder, MosDims, MosLayers};
pub use params::{DeviceParameters, GuardRingMode};
pub use ports::{derive_port, PortExtent};
pub use rf::{RfDims, RfLayers, RfMosBodyBuilder};

/// A generated device: geometry plus netlisting metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLayout {
    pub layout: Layout,
    pub simulation: SimulationInfo,
}

/// Generates one device. Invalid requests fail before any geometry exists.
pub fn generate(params: &DeviceParameters, tech: &Technology) -> MosResult<DeviceLayout> {
    let layout = if params.kind.class().rf {
        RfMosBodyBuilder::new(params, tech)?.build()?
    } else {
        MosBodyBuilder::new(params, tech)?.build()?
    };
    Ok(DeviceLayout {
        layout,
        simulation: SimulationInfo::for_device(params),
    })
}
