use std::f32::consts::PI;

/// Every tuning knob in one place, passed explicitly to whatever needs it.
/// Positions, cell size and wrap bounds are all in braille-pixel space
/// (2 horizontal x 4 vertical pixels per terminal cell).
#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) fps_cap: u32,
    /// Spacing between flow-field grid points, and the bucket size for
    /// nearest-cell lookup.
    pub(crate) cell_size: f32,
    /// One particle per this many pixels of canvas area.
    pub(crate) spawn_divisor: f32,
    pub(crate) particle_radius: f32,
    /// Constant alpha for particle discs; low so trails build up gradually.
    pub(crate) trail_alpha: f32,
    /// Per-tick channel delta of the color cycle.
    pub(crate) color_step: f32,
    /// Clock advance per tick. Deliberately tiny: the field evolves over
    /// thousands of frames.
    pub(crate) time_step: f32,
    /// Per-row / per-column phase drift fed into the noise sample.
    pub(crate) drift_step: f32,
    /// Noise-to-angle scale. A full [-1,1] noise swing covers several turns.
    pub(crate) angle_span: f32,
    /// Nominal magnitude of every field vector.
    pub(crate) field_speed: f32,
    /// Speed cap applied when a particle adopts a field vector.
    pub(crate) max_speed: f32,
    pub(crate) seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fps_cap: 60,
            cell_size: 30.0,
            spawn_divisor: 1500.0,
            particle_radius: 2.0,
            trail_alpha: 0.4,
            color_step: 0.1,
            time_step: 0.000_008,
            drift_step: 0.005,
            angle_span: PI * 8.0,
            field_speed: 10.0,
            max_speed: 1.0,
            seed: 0xF10F_1E1D_u64,
        }
    }
}
