use crate::common::frame::DepthFrame;
use crate::common::grid::{BinaryMask, DepthGrid, RoiSample};
use crate::config::Configuration;
use crate::error::PipelineError;
use crate::pipeline::background::BackgroundModel;
use crate::pipeline::canvas::PersistenceCanvas;
use crate::pipeline::mask::{GeometryMask, GridPoint};
use crate::pipeline::metrics::{PipelineStage, TickMetrics};
use crate::pipeline::normalize::{self, FrameStatistics};
use crate::pipeline::store::DepthFrameStore;
use crate::pipeline::view::ViewStateHandle;
use crate::tracking::{BlobRecord, BlobTracker};
use image::{Rgb, RgbImage};
use std::time::Instant;

/// Everything a tick produces, swapped out atomically at tick end. No partial
/// frame is ever visible to a consumer.
#[derive(Clone)]
pub struct TickOutput {
    /// Raw depth visualized per-pixel as (depth, depth >> 5, depth) bytes.
    pub raw_view: RgbImage,
    /// The byte-normalized ROI grid replicated across the three channels.
    pub normalized_view: RgbImage,
    /// The persistence canvas with blob overlays and decay applied.
    pub overlay: RgbImage,
    /// Blob set reported by the tracking collaborator this tick.
    pub blobs: Vec<BlobRecord>,
    pub statistics: FrameStatistics,
    pub metrics: TickMetrics,
}

/// Per-tick processing pipeline: masking, background adjustment,
/// normalization, thresholding, blob tracking, rendering.
///
/// With no boundary defined the pipeline runs degraded: it renders the plain
/// normalized grid and skips masking, background adjustment, thresholding
/// and tracking.
pub struct TrackingPipeline {
    store: DepthFrameStore,
    mask: GeometryMask,
    background: BackgroundModel,
    canvas: PersistenceCanvas,
    foreground: BinaryMask,
    tracker: Box<dyn BlobTracker>,
    threshold: u8,
    sensitivity_exponent: f32,
    view: ViewStateHandle,
}

impl TrackingPipeline {
    pub fn new(
        configuration: &Configuration,
        tracker: Box<dyn BlobTracker>,
        view: ViewStateHandle,
    ) -> Self {
        let (width, height) = (configuration.grid_width, configuration.grid_height);
        Self {
            store: DepthFrameStore::new(width, height),
            mask: GeometryMask::new(),
            background: BackgroundModel::new(),
            canvas: PersistenceCanvas::new(
                width,
                height,
                configuration.decay_step,
                configuration.decay_cadence_ticks,
                configuration.dimming_enabled,
            ),
            foreground: BinaryMask::new(width, height),
            tracker,
            threshold: configuration.threshold,
            sensitivity_exponent: configuration.sensitivity_exponent,
            view,
        }
    }

    pub fn store(&self) -> &DepthFrameStore {
        &self.store
    }

    pub fn view(&self) -> ViewStateHandle {
        self.view.clone()
    }

    pub fn set_boundary(
        &mut self,
        p1: GridPoint,
        p2: GridPoint,
        p3: GridPoint,
        p4: GridPoint,
    ) -> Result<(), PipelineError> {
        self.mask.set_boundary(p1, p2, p3, p4)?;
        tracing::info!(?p1, ?p2, ?p3, ?p4, "boundary defined, masking enabled");
        Ok(())
    }

    pub fn clear_boundary(&mut self) {
        self.mask.clear_boundary();
        tracing::info!("boundary cleared, masking disabled");
    }

    /// Deep-copies the current raw grid as the background reference.
    pub fn capture_background(&mut self) {
        self.background.capture(self.store.raw());
        tracing::info!("background captured");
    }

    pub fn clear_background(&mut self) {
        self.background.clear();
        tracing::info!("background cleared");
    }

    pub fn set_threshold(&mut self, threshold: u8) {
        self.threshold = threshold;
    }

    pub fn set_sensitivity_exponent(&mut self, exponent: f32) {
        self.sensitivity_exponent = exponent;
    }

    pub fn set_dimming(&mut self, enabled: bool) {
        self.canvas.set_dimming(enabled);
    }

    pub fn set_decay(&mut self, step: u8, cadence_ticks: u32) {
        self.canvas.set_decay(step, cadence_ticks);
    }

    /// Runs one full cycle over a freshly acquired frame. A shape mismatch
    /// fails the call with no buffer mutated; any prior output stays valid.
    pub fn process(&mut self, frame: &DepthFrame) -> Result<TickOutput, PipelineError> {
        self.store.ingest(frame.grid())?;
        let mut metrics = TickMetrics::new();
        let masked = self.mask.is_enabled();

        if masked {
            let start = Instant::now();
            self.apply_masking();
            metrics.record(PipelineStage::Masking, start.elapsed());

            let start = Instant::now();
            self.apply_background_adjust();
            metrics.record(PipelineStage::BackgroundAdjust, start.elapsed());
        } else {
            self.fill_unmasked();
        }

        let start = Instant::now();
        let statistics = normalize::collect_statistics(self.store.raw(), self.store.roi());
        let (roi, normalized) = self.store.roi_and_normalized_mut();
        normalize::rescale(roi, &statistics, normalized);
        metrics.record(PipelineStage::Normalize, start.elapsed());

        let blobs = if masked {
            let start = Instant::now();
            self.apply_threshold();
            metrics.record(PipelineStage::Threshold, start.elapsed());

            let start = Instant::now();
            let blobs = self.tracker.process(&self.foreground);
            metrics.record(PipelineStage::BlobTrack, start.elapsed());
            blobs
        } else {
            Vec::new()
        };

        let start = Instant::now();
        let (raw_view, normalized_view, palette_exhausted) = self.render(&blobs);
        metrics.record(PipelineStage::Render, start.elapsed());

        self.view.update(|state| {
            state.display_min = statistics.global_min;
            state.display_max = statistics.global_max;
            state.blob_count = blobs.len();
            state.degraded = !masked;
            state.palette_exhausted = palette_exhausted;
        });

        tracing::debug!(
            frame = %frame.frame_id(),
            blobs = blobs.len(),
            degraded = !masked,
            tick_us = metrics.total().as_micros() as u64,
            "tick complete"
        );

        Ok(TickOutput {
            raw_view,
            normalized_view,
            overlay: self.canvas.image().clone(),
            blobs,
            statistics,
            metrics,
        })
    }

    // Classifies every cell against the boundary: outside, no reading, or a
    // valid raw depth awaiting background adjustment.
    fn apply_masking(&mut self) {
        let mask = &self.mask;
        let (raw, roi) = self.store.raw_and_roi_mut();
        for y in 0..raw.height() {
            for x in 0..raw.width() {
                let sample = if !mask.contains(x as f32, y as f32) {
                    RoiSample::Outside
                } else {
                    match raw.get(x, y) {
                        0 => RoiSample::NoReading,
                        depth => RoiSample::Valid(depth as f32),
                    }
                };
                roi.set(x, y, sample);
            }
        }
    }

    // Replaces each valid cell with its background-relative displacement
    // raised to the sensitivity exponent. A non-finite result (object behind
    // the background under a fractional exponent) becomes a missing reading.
    fn apply_background_adjust(&mut self) {
        if !self.background.is_captured() {
            return;
        }
        let background = &self.background;
        let exponent = self.sensitivity_exponent;
        let roi = self.store.roi_mut();
        for y in 0..roi.height() {
            for x in 0..roi.width() {
                if let RoiSample::Valid(depth) = roi.get(x, y) {
                    let adjusted = background.subtract(depth, x, y, exponent);
                    let sample = if adjusted.is_finite() {
                        RoiSample::Valid(adjusted)
                    } else {
                        RoiSample::NoReading
                    };
                    roi.set(x, y, sample);
                }
            }
        }
    }

    // Degraded mode: no boundary, so every nonzero raw cell is valid.
    fn fill_unmasked(&mut self) {
        let (raw, roi) = self.store.raw_and_roi_mut();
        for y in 0..raw.height() {
            for x in 0..raw.width() {
                let sample = match raw.get(x, y) {
                    0 => RoiSample::NoReading,
                    depth => RoiSample::Valid(depth as f32),
                };
                roi.set(x, y, sample);
            }
        }
    }

    // Foreground = valid cell whose normalized depth reaches the sensitivity
    // threshold. Sentinel cells never become content.
    fn apply_threshold(&mut self) {
        let roi = self.store.roi();
        let normalized = self.store.normalized();
        for y in 0..roi.height() {
            for x in 0..roi.width() {
                let foreground = matches!(roi.get(x, y), RoiSample::Valid(_))
                    && normalized.get(x, y) >= self.threshold;
                self.foreground.set(x, y, foreground);
            }
        }
    }

    fn render(&mut self, blobs: &[BlobRecord]) -> (RgbImage, RgbImage, bool) {
        let raw_view = render_raw_view(self.store.raw());
        let normalized_view = render_normalized_view(self.store.normalized());

        self.canvas.decay_tick();
        let palette_exhausted = match self.canvas.draw(blobs) {
            Ok(()) => false,
            Err(e) => {
                tracing::warn!("degrading overlay render: {e}");
                true
            }
        };
        (raw_view, normalized_view, palette_exhausted)
    }
}

// The classic viewer tint: red and blue carry the low depth byte, green the
// higher bits, so depth discontinuities pop visually.
fn render_raw_view(raw: &DepthGrid) -> RgbImage {
    let mut image = RgbImage::new(raw.width(), raw.height());
    for y in 0..raw.height() {
        for x in 0..raw.width() {
            let depth = raw.get(x, y);
            image.put_pixel(x, y, Rgb([depth as u8, (depth >> 5) as u8, depth as u8]));
        }
    }
    image
}

fn render_normalized_view(normalized: &crate::common::grid::ByteGrid) -> RgbImage {
    let mut image = RgbImage::new(normalized.width(), normalized.height());
    for y in 0..normalized.height() {
        for x in 0..normalized.width() {
            let value = normalized.get(x, y);
            image.put_pixel(x, y, Rgb([value, value, value]));
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{BoundingBox, NullTracker};

    struct FixedTracker {
        blobs: Vec<BlobRecord>,
    }

    impl BlobTracker for FixedTracker {
        fn process(&mut self, _mask: &BinaryMask) -> Vec<BlobRecord> {
            self.blobs.clone()
        }
    }

    struct MaskEchoTracker;

    // One single-cell blob per foreground cell, id by scan order.
    impl BlobTracker for MaskEchoTracker {
        fn process(&mut self, mask: &BinaryMask) -> Vec<BlobRecord> {
            let mut blobs = Vec::new();
            for y in 0..mask.height() {
                for x in 0..mask.width() {
                    if mask.get(x, y) {
                        let id = blobs.len() as u32;
                        blobs.push(BlobRecord::new(id, BoundingBox::new(x, y, 1, 1)));
                    }
                }
            }
            blobs
        }
    }

    fn small_configuration(width: u32, height: u32) -> Configuration {
        Configuration {
            grid_width: width,
            grid_height: height,
            ..Configuration::default()
        }
    }

    fn inner_square_boundary(pipeline: &mut TrackingPipeline) {
        pipeline
            .set_boundary(
                GridPoint::new(1.0, 1.0),
                GridPoint::new(2.0, 1.0),
                GridPoint::new(1.0, 2.0),
                GridPoint::new(2.0, 2.0),
            )
            .unwrap();
    }

    #[test]
    fn uniform_roi_processes_without_fault() {
        // 4x4 grid, boundary over the inner 2x2, uniform depth 5 inside.
        let configuration = small_configuration(4, 4);
        let mut pipeline =
            TrackingPipeline::new(&configuration, Box::new(NullTracker), ViewStateHandle::new());
        inner_square_boundary(&mut pipeline);

        let mut grid = DepthGrid::new(4, 4);
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            grid.set(x, y, 5);
        }
        let output = pipeline.process(&DepthFrame::new(grid)).unwrap();

        assert_eq!(output.statistics.roi_min, 5.0);
        assert_eq!(output.statistics.roi_max, 5.0);
        assert_eq!(output.statistics.valid_cells, 4);
        // Degenerate range: the normalized view is defined and uniform.
        assert!(pipeline.store().normalized().bytes().iter().all(|&b| b == 0));
        assert_eq!(pipeline.store().roi().get(0, 0), RoiSample::Outside);
    }

    #[test]
    fn background_subtraction_shifts_roi_values() {
        let configuration = small_configuration(2, 2);
        let mut pipeline =
            TrackingPipeline::new(&configuration, Box::new(NullTracker), ViewStateHandle::new());
        pipeline
            .set_boundary(
                GridPoint::new(0.0, 0.0),
                GridPoint::new(1.0, 0.0),
                GridPoint::new(0.0, 1.0),
                GridPoint::new(1.0, 1.0),
            )
            .unwrap();
        pipeline.set_sensitivity_exponent(1.0);

        let background = DepthGrid::from_samples(2, 2, vec![10, 10, 10, 10]).unwrap();
        pipeline.process(&DepthFrame::new(background)).unwrap();
        pipeline.capture_background();

        let current = DepthGrid::from_samples(2, 2, vec![6, 6, 6, 6]).unwrap();
        let output = pipeline.process(&DepthFrame::new(current)).unwrap();

        assert_eq!(output.statistics.roi_min, 4.0);
        assert_eq!(output.statistics.roi_max, 4.0);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(pipeline.store().roi().get(x, y), RoiSample::Valid(4.0));
            }
        }
    }

    #[test]
    fn subtraction_nan_becomes_missing_reading() {
        // Object behind the captured background with a fractional exponent.
        let configuration = small_configuration(2, 2);
        let mut pipeline =
            TrackingPipeline::new(&configuration, Box::new(NullTracker), ViewStateHandle::new());
        pipeline
            .set_boundary(
                GridPoint::new(0.0, 0.0),
                GridPoint::new(1.0, 0.0),
                GridPoint::new(0.0, 1.0),
                GridPoint::new(1.0, 1.0),
            )
            .unwrap();
        pipeline.set_sensitivity_exponent(0.5);

        let background = DepthGrid::from_samples(2, 2, vec![5, 5, 5, 5]).unwrap();
        pipeline.process(&DepthFrame::new(background)).unwrap();
        pipeline.capture_background();

        let current = DepthGrid::from_samples(2, 2, vec![9, 9, 9, 9]).unwrap();
        let output = pipeline.process(&DepthFrame::new(current)).unwrap();

        assert_eq!(output.statistics.valid_cells, 0);
        assert_eq!(pipeline.store().roi().get(0, 0), RoiSample::NoReading);
    }

    #[test]
    fn undefined_boundary_runs_degraded() {
        let configuration = small_configuration(3, 3);
        let view = ViewStateHandle::new();
        let mut pipeline =
            TrackingPipeline::new(&configuration, Box::new(MaskEchoTracker), view.clone());

        let grid = DepthGrid::from_samples(3, 3, vec![0, 100, 200, 300, 0, 100, 200, 300, 0])
            .unwrap();
        let output = pipeline.process(&DepthFrame::new(grid)).unwrap();

        // Tracking skipped entirely; the normalized grid still renders.
        assert!(output.blobs.is_empty());
        assert!(view.snapshot().degraded);
        assert_eq!(output.statistics.global_min, 100);
        assert_eq!(output.statistics.global_max, 300);
        assert!(pipeline.store().normalized().bytes().iter().any(|&b| b > 0));
    }

    #[test]
    fn threshold_feeds_tracker_foreground_only() {
        let configuration = Configuration {
            threshold: 255,
            ..small_configuration(4, 4)
        };
        let view = ViewStateHandle::new();
        let mut pipeline =
            TrackingPipeline::new(&configuration, Box::new(MaskEchoTracker), view.clone());
        pipeline
            .set_boundary(
                GridPoint::new(0.0, 0.0),
                GridPoint::new(3.0, 0.0),
                GridPoint::new(0.0, 3.0),
                GridPoint::new(3.0, 3.0),
            )
            .unwrap();

        // One cell clearly deeper signal than the rest.
        let mut grid = DepthGrid::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                grid.set(x, y, 100);
            }
        }
        grid.set(2, 2, 900);
        let output = pipeline.process(&DepthFrame::new(grid)).unwrap();

        // Only the maximum cell reaches byte 255.
        assert_eq!(output.blobs.len(), 1);
        assert_eq!(output.blobs[0].bbox, BoundingBox::new(2, 2, 1, 1));
        assert_eq!(view.snapshot().blob_count, 1);
    }

    #[test]
    fn blob_overflow_degrades_and_flags() {
        let blobs: Vec<BlobRecord> = (0..7)
            .map(|id| BlobRecord::new(id, BoundingBox::new(id, 0, 1, 1)))
            .collect();
        let configuration = small_configuration(8, 8);
        let view = ViewStateHandle::new();
        let mut pipeline = TrackingPipeline::new(
            &configuration,
            Box::new(FixedTracker { blobs }),
            view.clone(),
        );
        pipeline
            .set_boundary(
                GridPoint::new(0.0, 0.0),
                GridPoint::new(7.0, 0.0),
                GridPoint::new(0.0, 7.0),
                GridPoint::new(7.0, 7.0),
            )
            .unwrap();

        let mut grid = DepthGrid::new(8, 8);
        grid.set(1, 1, 50);
        // Never terminates: the tick completes and reports the condition.
        let output = pipeline.process(&DepthFrame::new(grid)).unwrap();
        assert_eq!(output.blobs.len(), 7);
        assert!(view.snapshot().palette_exhausted);
    }

    #[test]
    fn shape_mismatch_fails_the_call_only() {
        let configuration = small_configuration(4, 4);
        let mut pipeline =
            TrackingPipeline::new(&configuration, Box::new(NullTracker), ViewStateHandle::new());
        let wrong = DepthGrid::new(5, 4);
        assert!(matches!(
            pipeline.process(&DepthFrame::new(wrong)),
            Err(PipelineError::ShapeMismatch { .. })
        ));
        // A well-shaped frame still processes afterwards.
        let ok = DepthGrid::new(4, 4);
        assert!(pipeline.process(&DepthFrame::new(ok)).is_ok());
    }
}
