//! Build-once, replay-many shape programs.
//!
//! The S/D region of an RF device is described once as a [`CommandList`],
//! rendered for region 0, and every further region is the rendered set
//! moved by a whole number of finger pitches. Nothing is recomputed per
//! region, so inter-finger spacing cannot drift.

use sg13_core::{BBox, Grid, LayerHandle, Point, Rect};

use crate::contacts::ContactRun;
use crate::error::MosResult;

#[derive(Debug, Clone, PartialEq)]
pub enum SdCommand {
    Rect { layer: LayerHandle, bbox: BBox },
    Run { run: ContactRun, p1: Point, p2: Point },
}

impl SdCommand {
    fn render(&self, grid: &Grid, shift: Point, out: &mut Vec<Rect>) -> MosResult<()> {
        match self {
            SdCommand::Rect { layer, bbox } => {
                out.push(Rect::from_bbox(*layer, bbox.translate(shift.x, shift.y)));
            }
            SdCommand::Run { run, p1, p2 } => {
                out.extend(run.place(grid, *p1, *p2, shift)?.into_rects());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandList {
    commands: Vec<SdCommand>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rect(&mut self, layer: LayerHandle, bbox: BBox) {
        self.commands.push(SdCommand::Rect { layer, bbox });
    }

    pub fn push_run(&mut self, run: ContactRun, p1: Point, p2: Point) {
        self.commands.push(SdCommand::Run { run, p1, p2 });
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[SdCommand] {
        &self.commands
    }

    /// Executes every command in order at `shift`.
    pub fn render(&self, grid: &Grid, shift: Point) -> MosResult<Vec<Rect>> {
        let mut out = Vec::new();
        for command in &self.commands {
            command.render(grid, shift, &mut out)?;
        }
        Ok(out)
    }
}

/// `rects` moved by `(dx, dy)`.
pub fn replay(rects: &[Rect], dx: f64, dy: f64) -> impl Iterator<Item = Rect> + '_ {
    rects.iter().map(move |r| r.translate(dx, dy))
}
