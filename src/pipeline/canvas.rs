use crate::error::PipelineError;
use crate::tracking::BlobRecord;
use image::{Rgb, RgbImage};

/// Overlay colors, indexed by blob id modulo the palette length.
pub const DEFAULT_PALETTE: [Rgb<u8>; 6] = [
    Rgb([255, 0, 0]),
    Rgb([0, 255, 0]),
    Rgb([0, 0, 255]),
    Rgb([255, 255, 0]),
    Rgb([0, 255, 255]),
    Rgb([255, 0, 255]),
];

/// Tick counter driving periodic canvas decay. The counter resets each time
/// it reaches the configured cadence, at which point decay fires.
#[derive(Debug)]
pub struct DimState {
    enabled: bool,
    cadence_ticks: u32,
    counter: u32,
}

impl DimState {
    pub fn new(enabled: bool, cadence_ticks: u32) -> Self {
        Self {
            enabled,
            cadence_ticks: cadence_ticks.max(1),
            counter: 0,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_cadence(&mut self, cadence_ticks: u32) {
        self.cadence_ticks = cadence_ticks.max(1);
    }

    /// Advances the counter; true when decay should fire this tick.
    pub fn advance(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.counter += 1;
        if self.counter >= self.cadence_ticks {
            self.counter = 0;
            true
        } else {
            false
        }
    }
}

/// Accumulation image for blob overlays. Only blob draws and periodic decay
/// mutate it; it is never implicitly cleared, so stale overlays persist until
/// decay erases them.
pub struct PersistenceCanvas {
    image: RgbImage,
    palette: Vec<Rgb<u8>>,
    decay_step: u8,
    dim: DimState,
}

impl PersistenceCanvas {
    pub fn new(
        width: u32,
        height: u32,
        decay_step: u8,
        decay_cadence_ticks: u32,
        dimming_enabled: bool,
    ) -> Self {
        Self {
            image: RgbImage::new(width, height),
            palette: DEFAULT_PALETTE.to_vec(),
            decay_step,
            dim: DimState::new(dimming_enabled, decay_cadence_ticks),
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn palette_capacity(&self) -> usize {
        self.palette.len()
    }

    pub fn set_dimming(&mut self, enabled: bool) {
        self.dim.set_enabled(enabled);
    }

    pub fn set_decay(&mut self, step: u8, cadence_ticks: u32) {
        self.decay_step = step;
        self.dim.set_cadence(cadence_ticks);
    }

    /// Outlines each blob's bounding box in `palette[id % len]`. At most one
    /// blob per palette color is rendered in a single call; the excess is
    /// dropped and reported as a recoverable `TooManyBlobs`.
    pub fn draw(&mut self, blobs: &[BlobRecord]) -> Result<(), PipelineError> {
        let capacity = self.palette.len();
        for blob in blobs.iter().take(capacity) {
            let color = self.palette[blob.id as usize % capacity];
            self.outline(blob, color);
        }
        if blobs.len() > capacity {
            return Err(PipelineError::TooManyBlobs {
                count: blobs.len(),
                capacity,
            });
        }
        Ok(())
    }

    fn outline(&mut self, blob: &BlobRecord, color: Rgb<u8>) {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 || blob.bbox.width == 0 || blob.bbox.height == 0 {
            return;
        }
        let x0 = blob.bbox.x.min(width - 1);
        let y0 = blob.bbox.y.min(height - 1);
        let x1 = (blob.bbox.x + blob.bbox.width - 1).min(width - 1);
        let y1 = (blob.bbox.y + blob.bbox.height - 1).min(height - 1);
        for x in x0..=x1 {
            self.image.put_pixel(x, y0, color);
            self.image.put_pixel(x, y1, color);
        }
        for y in y0..=y1 {
            self.image.put_pixel(x0, y, color);
            self.image.put_pixel(x1, y, color);
        }
    }

    /// Invoked once per pipeline tick. When dimming is enabled and the
    /// cadence counter wraps, every channel of every pixel steps down by the
    /// decay step, saturating at zero.
    pub fn decay_tick(&mut self) {
        if !self.dim.advance() {
            return;
        }
        let step = self.decay_step;
        for pixel in self.image.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                *channel = channel.saturating_sub(step);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::BoundingBox;

    fn canvas_every_tick(step: u8) -> PersistenceCanvas {
        PersistenceCanvas::new(16, 16, step, 1, true)
    }

    #[test]
    fn draw_outlines_box_in_palette_color() {
        let mut canvas = canvas_every_tick(1);
        let blob = BlobRecord::new(1, BoundingBox::new(2, 3, 4, 5));
        canvas.draw(&[blob]).unwrap();
        assert_eq!(*canvas.image().get_pixel(2, 3), DEFAULT_PALETTE[1]);
        assert_eq!(*canvas.image().get_pixel(5, 7), DEFAULT_PALETTE[1]);
        // Interior stays untouched.
        assert_eq!(*canvas.image().get_pixel(3, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn color_selection_wraps_by_id() {
        let mut canvas = canvas_every_tick(1);
        let blob = BlobRecord::new(7, BoundingBox::new(0, 0, 2, 2));
        canvas.draw(&[blob]).unwrap();
        assert_eq!(*canvas.image().get_pixel(0, 0), DEFAULT_PALETTE[1]);
    }

    #[test]
    fn overflow_renders_capacity_and_reports() {
        let mut canvas = canvas_every_tick(1);
        let blobs: Vec<BlobRecord> = (0..7)
            .map(|id| BlobRecord::new(id, BoundingBox::new(id * 2, 0, 1, 1)))
            .collect();
        let result = canvas.draw(&blobs);
        assert!(matches!(
            result,
            Err(PipelineError::TooManyBlobs {
                count: 7,
                capacity: 6
            })
        ));
        // The first six still rendered.
        for id in 0..6u32 {
            assert_ne!(*canvas.image().get_pixel(id * 2, 0), Rgb([0, 0, 0]));
        }
        // The seventh was dropped.
        assert_eq!(*canvas.image().get_pixel(12, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn decay_steps_down_and_clamps_at_zero() {
        let mut canvas = canvas_every_tick(40);
        let blob = BlobRecord::new(0, BoundingBox::new(0, 0, 1, 1));
        canvas.draw(&[blob]).unwrap();
        assert_eq!(*canvas.image().get_pixel(0, 0), Rgb([255, 0, 0]));
        for _ in 0..3 {
            canvas.decay_tick();
        }
        // max(0, 255 - 3 * 40) on the red channel, others clamped at zero.
        assert_eq!(*canvas.image().get_pixel(0, 0), Rgb([135, 0, 0]));
        for _ in 0..10 {
            canvas.decay_tick();
        }
        assert_eq!(*canvas.image().get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn decay_respects_cadence() {
        let mut canvas = PersistenceCanvas::new(4, 4, 10, 3, true);
        let blob = BlobRecord::new(0, BoundingBox::new(0, 0, 1, 1));
        canvas.draw(&[blob]).unwrap();
        canvas.decay_tick();
        canvas.decay_tick();
        assert_eq!(*canvas.image().get_pixel(0, 0), Rgb([255, 0, 0]));
        canvas.decay_tick();
        assert_eq!(*canvas.image().get_pixel(0, 0), Rgb([245, 0, 0]));
    }

    #[test]
    fn decay_is_inert_when_dimming_disabled() {
        let mut canvas = PersistenceCanvas::new(4, 4, 10, 1, false);
        let blob = BlobRecord::new(0, BoundingBox::new(0, 0, 1, 1));
        canvas.draw(&[blob]).unwrap();
        for _ in 0..5 {
            canvas.decay_tick();
        }
        assert_eq!(*canvas.image().get_pixel(0, 0), Rgb([255, 0, 0]));
    }
}
