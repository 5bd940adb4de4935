use crate::common::grid::DepthGrid;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One acquired depth frame: the grid plus its capture metadata.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    grid: DepthGrid,
    captured_at: DateTime<Utc>,
    frame_id: Uuid,
}

impl DepthFrame {
    pub fn new(grid: DepthGrid) -> Self {
        Self {
            grid,
            captured_at: Utc::now(),
            frame_id: Uuid::new_v4(),
        }
    }

    pub fn grid(&self) -> &DepthGrid {
        &self.grid
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_get_distinct_ids() {
        let f1 = DepthFrame::new(DepthGrid::new(4, 4));
        let f2 = DepthFrame::new(DepthGrid::new(4, 4));
        assert_ne!(f1.frame_id(), f2.frame_id());
    }
}
