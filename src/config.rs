use serde::Deserialize;

/// Pipeline configuration. Every knob is a plain numeric/boolean value so an
/// outer layer can source them from whatever format it likes.
#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    /// Horizontal resolution negotiated with the depth source.
    pub grid_width: u32,
    /// Vertical resolution negotiated with the depth source.
    pub grid_height: u32,
    /// Fixed period of the processing tick, in milliseconds.
    pub tick_period_ms: u64,
    /// Normalized-depth cutoff: cells at or above this byte value are foreground.
    pub threshold: u8,
    /// Exponent applied to the background-relative displacement.
    pub sensitivity_exponent: f32,
    /// Per-channel decrement applied to the overlay canvas when decay fires.
    pub decay_step: u8,
    /// Number of ticks between decay firings.
    pub decay_cadence_ticks: u32,
    /// Whether overlay decay is active at startup.
    pub dimming_enabled: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            grid_width: 640,
            grid_height: 480,
            tick_period_ms: 10,
            threshold: 128,
            sensitivity_exponent: 1.0,
            decay_step: 1,
            decay_cadence_ticks: 3,
            dimming_enabled: false,
        }
    }
}
