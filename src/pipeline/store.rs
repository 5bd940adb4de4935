use crate::common::grid::{ByteGrid, DepthGrid, RoiGrid};
use crate::error::PipelineError;

/// Owns the three per-tick grids: raw depth, ROI-filtered depth, and
/// byte-normalized depth. All three share one shape, fixed at construction.
#[derive(Debug)]
pub struct DepthFrameStore {
    raw: DepthGrid,
    roi: RoiGrid,
    normalized: ByteGrid,
}

impl DepthFrameStore {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raw: DepthGrid::new(width, height),
            roi: RoiGrid::new(width, height),
            normalized: ByteGrid::new(width, height),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.raw.dimensions()
    }

    /// Copies the incoming grid over the raw buffer. Must run once per tick
    /// before any derived computation; a mismatched shape fails the call and
    /// leaves every buffer untouched.
    pub fn ingest(&mut self, grid: &DepthGrid) -> Result<(), PipelineError> {
        self.raw.copy_from(grid)
    }

    pub fn raw(&self) -> &DepthGrid {
        &self.raw
    }

    pub fn roi(&self) -> &RoiGrid {
        &self.roi
    }

    pub fn roi_mut(&mut self) -> &mut RoiGrid {
        &mut self.roi
    }

    pub fn normalized(&self) -> &ByteGrid {
        &self.normalized
    }

    pub fn normalized_mut(&mut self) -> &mut ByteGrid {
        &mut self.normalized
    }

    pub fn raw_and_roi_mut(&mut self) -> (&DepthGrid, &mut RoiGrid) {
        (&self.raw, &mut self.roi)
    }

    pub fn roi_and_normalized_mut(&mut self) -> (&RoiGrid, &mut ByteGrid) {
        (&self.roi, &mut self.normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_rejects_mismatched_shape() {
        let mut store = DepthFrameStore::new(8, 6);
        let wrong = DepthGrid::new(6, 8);
        assert!(matches!(
            store.ingest(&wrong),
            Err(PipelineError::ShapeMismatch { .. })
        ));
        // The raw buffer is untouched by the failed call.
        assert!(store.raw().samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn ingest_copies_raw_samples() {
        let mut store = DepthFrameStore::new(2, 2);
        let grid = DepthGrid::from_samples(2, 2, vec![1, 2, 3, 4]).unwrap();
        store.ingest(&grid).unwrap();
        assert_eq!(store.raw().get(0, 1), 3);
    }
}
