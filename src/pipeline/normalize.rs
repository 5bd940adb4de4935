use crate::common::grid::{ByteGrid, DepthGrid, RoiGrid, RoiSample};

/// Per-tick dynamic-range statistics. Rebuilt from scratch every tick, never
/// carried over.
///
/// The global extremes cover every nonzero raw sample regardless of the mask
/// and feed the display layer; the ROI extremes cover only `Valid` cells and
/// drive rescaling. Sentinel cells contribute to neither.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStatistics {
    pub global_min: u16,
    pub global_max: u16,
    pub roi_min: f32,
    pub roi_max: f32,
    pub valid_cells: usize,
}

impl FrameStatistics {
    /// True when the ROI has no usable spread: empty, or uniform depth.
    pub fn is_degenerate(&self) -> bool {
        self.valid_cells == 0 || self.roi_min == self.roi_max
    }
}

/// Scans the raw grid and the ROI grid with standard running min/max (the
/// first sample seeds each extreme; later equal values leave it unchanged).
pub fn collect_statistics(raw: &DepthGrid, roi: &RoiGrid) -> FrameStatistics {
    let mut global_min = 0u16;
    let mut global_max = 0u16;
    let mut global_seen = false;
    for &sample in raw.samples() {
        if sample == 0 {
            continue;
        }
        if !global_seen {
            global_min = sample;
            global_max = sample;
            global_seen = true;
        } else {
            global_min = global_min.min(sample);
            global_max = global_max.max(sample);
        }
    }

    let mut roi_min = 0.0f32;
    let mut roi_max = 0.0f32;
    let mut valid_cells = 0usize;
    for cell in roi.cells() {
        if let RoiSample::Valid(value) = cell {
            if valid_cells == 0 {
                roi_min = *value;
                roi_max = *value;
            } else {
                roi_min = roi_min.min(*value);
                roi_max = roi_max.max(*value);
            }
            valid_cells += 1;
        }
    }

    FrameStatistics {
        global_min,
        global_max,
        roi_min,
        roi_max,
        valid_cells,
    }
}

/// Linearly rescales `Valid` cells from `[roi_min, roi_max]` onto `[0, 255]`
/// and writes sentinel cells as 0.
///
/// Brightness grows with the cell's signal magnitude, so once a background is
/// captured an object nearer the sensor renders brighter. A degenerate range
/// (empty or uniform ROI) gets a slope of zero instead of a division fault:
/// every valid cell maps to 0.
pub fn rescale(roi: &RoiGrid, stats: &FrameStatistics, out: &mut ByteGrid) {
    let span = stats.roi_max - stats.roi_min;
    if stats.is_degenerate() {
        tracing::debug!(
            valid_cells = stats.valid_cells,
            "degenerate dynamic range, flattening rescale slope"
        );
    }
    for y in 0..roi.height() {
        for x in 0..roi.width() {
            let byte = match roi.get(x, y) {
                RoiSample::Valid(value) if span > 0.0 => {
                    (((value - stats.roi_min) / span) * 255.0).round() as u8
                }
                _ => 0,
            };
            out.set(x, y, byte);
        }
    }
}
