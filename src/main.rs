use surface_tracker::acquisition::SyntheticDepthSource;
use surface_tracker::pipeline::GridPoint;
use surface_tracker::tracking::NullTracker;
use std::time::Duration;
use surface_tracker::{AppError, Configuration, ControlCommand, CoordinatorBuilder};
use tracing::Level;

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    let configuration = Configuration::default();
    let source = SyntheticDepthSource::new(configuration.grid_width, configuration.grid_height);

    let coordinator = CoordinatorBuilder::new(configuration.clone())
        .source(Box::new(source))
        .tracker(Box::new(NullTracker))
        .build()?;

    // Cover most of the surface, leaving a margin for the skewed sensor view.
    let margin_x = configuration.grid_width as f32 * 0.1;
    let margin_y = configuration.grid_height as f32 * 0.1;
    let far_x = configuration.grid_width as f32 - margin_x;
    let far_y = configuration.grid_height as f32 - margin_y;
    let controls = coordinator.controls();
    controls
        .send(ControlCommand::SetBoundary {
            p1: GridPoint::new(margin_x, margin_y),
            p2: GridPoint::new(far_x, margin_y),
            p3: GridPoint::new(margin_x, far_y),
            p4: GridPoint::new(far_x, far_y),
        })
        .await
        .map_err(|e| AppError::Config(e.to_string()))?;
    // Let a few frames land before freezing the background reference.
    tokio::time::sleep(Duration::from_millis(configuration.tick_period_ms * 5)).await;
    controls
        .send(ControlCommand::CaptureBackground)
        .await
        .map_err(|e| AppError::Config(e.to_string()))?;

    tracing::info!("surface tracker running, press ctrl-c to stop");
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::Config(e.to_string()))?;
    coordinator.stop();
    Ok(())
}
