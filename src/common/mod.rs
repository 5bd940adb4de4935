pub mod frame;
pub mod grid;

pub use frame::DepthFrame;
pub use grid::{BinaryMask, ByteGrid, DepthGrid, RoiGrid, RoiSample};
