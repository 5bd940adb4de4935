use crate::common::grid::BinaryMask;

/// Axis-aligned bounding box in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}

/// One tracked foreground object for the current tick.
///
/// The id is assigned by the tracking collaborator and reused across frames
/// for the same physical object; this crate only consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobRecord {
    pub id: u32,
    pub bbox: BoundingBox,
    pub center: (f32, f32),
}

impl BlobRecord {
    pub fn new(id: u32, bbox: BoundingBox) -> Self {
        let center = bbox.center();
        Self { id, bbox, center }
    }
}

/// Blob-detection/tracking collaborator. Given the tick's binary foreground
/// mask it returns the tracked blobs; identity stability across calls is the
/// implementation's contract, not verified here.
pub trait BlobTracker: Send {
    fn process(&mut self, mask: &BinaryMask) -> Vec<BlobRecord>;
}

/// Tracker that never reports a blob. Stands in where no real collaborator
/// is wired up, e.g. the demo binary.
#[derive(Debug, Default)]
pub struct NullTracker;

impl BlobTracker for NullTracker {
    fn process(&mut self, _mask: &BinaryMask) -> Vec<BlobRecord> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_center_is_midpoint() {
        let bbox = BoundingBox::new(2, 4, 6, 8);
        assert_eq!(bbox.center(), (5.0, 8.0));
    }

    #[test]
    fn null_tracker_reports_nothing() {
        let mut tracker = NullTracker;
        let mask = BinaryMask::new(8, 8);
        assert!(tracker.process(&mask).is_empty());
    }
}
