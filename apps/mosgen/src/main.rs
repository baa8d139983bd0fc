use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use sg13_core::{LayerMap, Shape};
use sg13_mos::{
    generate, DeviceKind, DeviceLayout, DeviceParameters, GuardRingMode, SimulationInfo,
};
use sg13_tech::Technology;

/// Generate one SG13G2 MOSFET layout and print it as JSON
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Device kind: nmos, pmos, nmos_hv, pmos_hv, rfnmos, rfpmos, rfnmos_hv, rfpmos_hv
    kind: DeviceKind,

    /// Total width in micrometers (defaults per kind)
    #[arg(short, long)]
    width: Option<f64>,

    /// Gate length in micrometers (defaults per kind)
    #[arg(short, long)]
    length: Option<f64>,

    /// Number of gate fingers
    #[arg(short = 'n', long, default_value_t = 1)]
    fingers: u32,

    /// Multiplier, recorded in the simulation metadata
    #[arg(short, long, default_value_t = 1)]
    multiplier: u32,

    /// S/D contact rows (RF devices)
    #[arg(long, default_value_t = 1)]
    rows: u32,

    /// Guard ring sides: full, none, left_right, top_bottom, open_left (RF devices)
    #[arg(long, default_value_t = GuardRingMode::Full)]
    guard_ring: GuardRingMode,

    /// Leave out the metal1 gate ring (RF devices)
    #[arg(long)]
    no_gate_ring: bool,

    /// Leave out the metal2/via1 overlay on S/D rows (RF devices)
    #[arg(long)]
    no_metal2: bool,

    /// JSON file overriding design-rule constants
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Every shape and port
    Json,
    /// Shape counts per layer and the ports
    Summary,
}

#[derive(Serialize)]
struct ShapeView {
    layer: String,
    gds: [u16; 2],
    points: Vec<[f64; 2]>,
}

#[derive(Serialize)]
struct PortView {
    name: String,
    center: [f64; 2],
    width: f64,
    orientation: u16,
    layer: String,
}

#[derive(Serialize)]
struct DeviceView<'a> {
    name: &'a str,
    bbox: Option<[f64; 4]>,
    shapes: Vec<ShapeView>,
    ports: Vec<PortView>,
    simulation: &'a SimulationInfo,
}

fn layer_name(layers: &LayerMap, shape_layer: sg13_core::LayerHandle) -> (String, [u16; 2]) {
    match layers.info(shape_layer) {
        Some(info) => (info.qualified_name(), [info.gds_layer, info.gds_datatype]),
        None => ("?".to_string(), [0, 0]),
    }
}

fn view<'a>(device: &'a DeviceLayout, layers: &LayerMap) -> DeviceView<'a> {
    let layout = &device.layout;
    let shapes = layout
        .shapes()
        .iter()
        .map(|s: &Shape| {
            let (layer, gds) = layer_name(layers, s.layer());
            ShapeView {
                layer,
                gds,
                points: s.vertices().iter().map(|p| [p.x, p.y]).collect(),
            }
        })
        .collect();
    let ports = layout
        .ports()
        .iter()
        .map(|p| PortView {
            name: p.name.clone(),
            center: [p.center.x, p.center.y],
            width: p.width,
            orientation: p.orientation.degrees(),
            layer: layer_name(layers, p.layer).0,
        })
        .collect();
    DeviceView {
        name: layout.name(),
        bbox: layout
            .bbox()
            .map(|b| [b.min.x, b.min.y, b.max.x, b.max.y]),
        shapes,
        ports,
        simulation: &device.simulation,
    }
}

fn summary(device: &DeviceLayout, layers: &LayerMap) -> String {
    let layout = &device.layout;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for shape in layout.shapes() {
        *counts.entry(layer_name(layers, shape.layer()).0).or_default() += 1;
    }
    let mut out = format!("{} ({})\n", layout.name(), device.simulation.model);
    if let Some(b) = layout.bbox() {
        out.push_str(&format!("  extent {:.3} x {:.3} um\n", b.width(), b.height()));
    }
    for (layer, n) in &counts {
        out.push_str(&format!("  {layer:<16} {n}\n"));
    }
    for p in layout.ports() {
        out.push_str(&format!(
            "  port {:<4} ({:.4}, {:.4}) width {:.3} at {} deg\n",
            p.name,
            p.center.x,
            p.center.y,
            p.width,
            p.orientation.degrees()
        ));
    }
    out
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let tech = match &cli.rules {
        Some(path) => Technology::with_rule_file(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?,
        None => Technology::sg13g2(),
    };

    let mut params = DeviceParameters::new(cli.kind)
        .with_fingers(cli.fingers)
        .with_multiplier(cli.multiplier)
        .with_contact_rows(cli.rows)
        .with_guard_ring(cli.guard_ring)
        .with_gate_ring(!cli.no_gate_ring)
        .with_metal2_overlay(!cli.no_metal2);
    if let Some(w) = cli.width {
        params = params.with_width(w);
    }
    if let Some(l) = cli.length {
        params = params.with_length(l);
    }
    log::info!(
        "generating {} w={} l={} nf={}",
        params.kind,
        params.width,
        params.length,
        params.fingers
    );

    let device =
        generate(&params, &tech).with_context(|| format!("Failed to generate {}", cli.kind))?;

    let text = match cli.format {
        Format::Json => serde_json::to_string_pretty(&view(&device, &tech.layers))
            .context("Failed to serialize layout")?,
        Format::Summary => summary(&device, &tech.layers),
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
