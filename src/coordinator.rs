use crate::acquisition::DepthSource;
use crate::common::frame::DepthFrame;
use crate::config::Configuration;
use crate::error::AppError;
use crate::pipeline::mask::GridPoint;
use crate::pipeline::tracking_pipeline::{TickOutput, TrackingPipeline};
use crate::pipeline::view::ViewStateHandle;
use crate::tracking::BlobTracker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Runtime adjustments applied to the pipeline between ticks.
#[derive(Debug, Clone)]
pub enum ControlCommand {
    SetBoundary {
        p1: GridPoint,
        p2: GridPoint,
        p3: GridPoint,
        p4: GridPoint,
    },
    ClearBoundary,
    CaptureBackground,
    ClearBackground,
    SetThreshold(u8),
    SetSensitivityExponent(f32),
    SetDimming(bool),
    SetDecay { step: u8, cadence_ticks: u32 },
    SetPointer { x: f32, y: f32 },
}

/// Drives the pipeline at a fixed tick period. Ticks are serialized: the
/// next one starts only after the previous cycle, including any blocking
/// acquisition wait, has completed. Completed outputs go out through a
/// single-slot watch channel, so the newest frame overwrites an unconsumed
/// one and nothing is ever buffered.
pub struct Coordinator {
    tick_task: tokio::task::JoinHandle<()>,
    cancel_token: CancellationToken,
    control_tx: mpsc::Sender<ControlCommand>,
    output_rx: watch::Receiver<Option<Arc<TickOutput>>>,
    view: ViewStateHandle,
}

impl Coordinator {
    fn new(
        configuration: Configuration,
        source: Box<dyn DepthSource>,
        tracker: Box<dyn BlobTracker>,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let (control_tx, control_rx) = mpsc::channel(32);
        let (output_tx, output_rx) = watch::channel(None);
        let view = ViewStateHandle::new();
        let pipeline = TrackingPipeline::new(&configuration, tracker, view.clone());
        let period = Duration::from_millis(configuration.tick_period_ms.max(1));
        let tick_task = tokio::spawn(Self::run_ticks(
            pipeline,
            source,
            control_rx,
            output_tx,
            cancel_token.clone(),
            period,
        ));
        Self {
            tick_task,
            cancel_token,
            control_tx,
            output_rx,
            view,
        }
    }

    /// Watch side of the single-slot output handoff.
    pub fn outputs(&self) -> watch::Receiver<Option<Arc<TickOutput>>> {
        self.output_rx.clone()
    }

    pub fn controls(&self) -> mpsc::Sender<ControlCommand> {
        self.control_tx.clone()
    }

    pub fn view(&self) -> ViewStateHandle {
        self.view.clone()
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
        self.tick_task.abort();
    }

    async fn run_ticks(
        mut pipeline: TrackingPipeline,
        mut source: Box<dyn DepthSource>,
        mut control_rx: mpsc::Receiver<ControlCommand>,
        output_tx: watch::Sender<Option<Arc<TickOutput>>>,
        cancel_token: CancellationToken,
        period: Duration,
    ) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                Some(command) = control_rx.recv() => {
                    Self::apply_command(&mut pipeline, command);
                }
                _ = interval.tick() => {
                    match source.current_depth_grid().await {
                        Ok(grid) => {
                            let frame = DepthFrame::new(grid);
                            match pipeline.process(&frame) {
                                Ok(output) => {
                                    let _ = output_tx.send(Some(Arc::new(output)));
                                }
                                Err(e) => {
                                    tracing::error!("tick failed, prior output retained: {e}");
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!("acquisition unavailable, skipping tick: {e}");
                        }
                    }
                }
            }
        }
        tracing::info!("tick loop stopped");
    }

    fn apply_command(pipeline: &mut TrackingPipeline, command: ControlCommand) {
        match command {
            ControlCommand::SetBoundary { p1, p2, p3, p4 } => {
                if let Err(e) = pipeline.set_boundary(p1, p2, p3, p4) {
                    tracing::error!("boundary rejected: {e}");
                }
            }
            ControlCommand::ClearBoundary => pipeline.clear_boundary(),
            ControlCommand::CaptureBackground => pipeline.capture_background(),
            ControlCommand::ClearBackground => pipeline.clear_background(),
            ControlCommand::SetThreshold(threshold) => pipeline.set_threshold(threshold),
            ControlCommand::SetSensitivityExponent(exponent) => {
                pipeline.set_sensitivity_exponent(exponent)
            }
            ControlCommand::SetDimming(enabled) => pipeline.set_dimming(enabled),
            ControlCommand::SetDecay { step, cadence_ticks } => {
                pipeline.set_decay(step, cadence_ticks)
            }
            ControlCommand::SetPointer { x, y } => pipeline.view().set_pointer(x, y),
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct CoordinatorBuilder {
    configuration: Configuration,
    source: Option<Box<dyn DepthSource>>,
    tracker: Option<Box<dyn BlobTracker>>,
}

impl CoordinatorBuilder {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration,
            source: None,
            tracker: None,
        }
    }

    // Overrides the tick period from the default configuration.
    pub fn tick_period_ms(mut self, tick_period_ms: u64) -> Self {
        self.configuration.tick_period_ms = tick_period_ms;
        self
    }

    // Overrides the foreground threshold from the default configuration.
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.configuration.threshold = threshold;
        self
    }

    pub fn source(mut self, source: Box<dyn DepthSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn tracker(mut self, tracker: Box<dyn BlobTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn build(self) -> Result<Coordinator, AppError> {
        let source = self
            .source
            .ok_or(AppError::Config("Depth source not set".to_string()))?;
        let tracker = self
            .tracker
            .ok_or(AppError::Config("Blob tracker not set".to_string()))?;
        let negotiated = source.resolution();
        let configured = (
            self.configuration.grid_width,
            self.configuration.grid_height,
        );
        if negotiated != configured {
            return Err(AppError::Config(format!(
                "depth source resolution {}x{} does not match configured grid {}x{}",
                negotiated.0, negotiated.1, configured.0, configured.1
            )));
        }
        Ok(Coordinator::new(self.configuration, source, tracker))
    }
}
