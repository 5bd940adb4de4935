use crate::common::grid::DepthGrid;
use crate::error::AcquisitionError;
use async_trait::async_trait;

/// Acquisition collaborator: hands the pipeline the current depth grid at a
/// fixed, negotiated resolution. A call may block its tick while waiting for
/// the sensor; failures are reported, never panicked, so the coordinator can
/// skip the tick and keep prior state.
#[async_trait]
pub trait DepthSource: Send {
    fn resolution(&self) -> (u32, u32);

    async fn current_depth_grid(&mut self) -> Result<DepthGrid, AcquisitionError>;
}

/// Hardware-free source: a flat surface with a raised block sliding back and
/// forth across it. Lets the binary exercise the whole pipeline end to end.
pub struct SyntheticDepthSource {
    width: u32,
    height: u32,
    surface_depth: u16,
    object_lift: u16,
    tick: u64,
}

impl SyntheticDepthSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            surface_depth: 2000,
            object_lift: 400,
            tick: 0,
        }
    }

    fn object_origin(&self) -> (u32, u32) {
        let span = self.width.saturating_sub(self.width / 4).max(1) as u64;
        let phase = self.tick % (2 * span);
        // Triangle wave keeps the block inside the grid.
        let x = if phase < span { phase } else { 2 * span - phase - 1 };
        (x as u32, self.height / 2)
    }
}

#[async_trait]
impl DepthSource for SyntheticDepthSource {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    async fn current_depth_grid(&mut self) -> Result<DepthGrid, AcquisitionError> {
        let mut grid = DepthGrid::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                grid.set(x, y, self.surface_depth);
            }
        }
        let (ox, oy) = self.object_origin();
        let side = (self.width / 8).max(1);
        for y in oy..(oy + side).min(self.height) {
            for x in ox..(ox + side).min(self.width) {
                grid.set(x, y, self.surface_depth - self.object_lift);
            }
        }
        self.tick += 1;
        Ok(grid)
    }
}
