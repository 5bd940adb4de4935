pub mod background;
pub mod canvas;
pub mod mask;
pub mod metrics;
pub mod normalize;
pub mod store;
pub mod tracking_pipeline;
pub mod view;

pub use background::BackgroundModel;
pub use canvas::{DimState, PersistenceCanvas, DEFAULT_PALETTE};
pub use mask::{BoundaryQuad, GeometryMask, GridPoint};
pub use metrics::{PipelineStage, TickMetrics};
pub use normalize::FrameStatistics;
pub use store::DepthFrameStore;
pub use tracking_pipeline::{TickOutput, TrackingPipeline};
pub use view::{ViewState, ViewStateHandle};
