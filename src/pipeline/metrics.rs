use std::time::Duration;

/// Pipeline stages, in tick order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Masking,
    BackgroundAdjust,
    Normalize,
    Threshold,
    BlobTrack,
    Render,
}

/// Per-stage timings collected during one tick.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    masking: Option<Duration>,
    background_adjust: Option<Duration>,
    normalize: Option<Duration>,
    threshold: Option<Duration>,
    blob_track: Option<Duration>,
    render: Option<Duration>,
}

impl TickMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: PipelineStage, elapsed: Duration) {
        let slot = match stage {
            PipelineStage::Masking => &mut self.masking,
            PipelineStage::BackgroundAdjust => &mut self.background_adjust,
            PipelineStage::Normalize => &mut self.normalize,
            PipelineStage::Threshold => &mut self.threshold,
            PipelineStage::BlobTrack => &mut self.blob_track,
            PipelineStage::Render => &mut self.render,
        };
        *slot = Some(elapsed);
    }

    pub fn get(&self, stage: PipelineStage) -> Option<Duration> {
        match stage {
            PipelineStage::Masking => self.masking,
            PipelineStage::BackgroundAdjust => self.background_adjust,
            PipelineStage::Normalize => self.normalize,
            PipelineStage::Threshold => self.threshold,
            PipelineStage::BlobTrack => self.blob_track,
            PipelineStage::Render => self.render,
        }
    }

    pub fn total(&self) -> Duration {
        [
            self.masking,
            self.background_adjust,
            self.normalize,
            self.threshold,
            self.blob_track,
            self.render,
        ]
        .into_iter()
        .flatten()
        .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_sums_stage_timings() {
        let mut metrics = TickMetrics::new();
        metrics.record(PipelineStage::Masking, Duration::from_micros(120));
        metrics.record(PipelineStage::Render, Duration::from_micros(80));
        assert_eq!(
            metrics.get(PipelineStage::Masking),
            Some(Duration::from_micros(120))
        );
        assert_eq!(metrics.get(PipelineStage::Threshold), None);
        assert_eq!(metrics.total(), Duration::from_micros(200));
    }
}
