use crate::config::Config;
use crate::noise::NoiseSource;

/// One directional sample of the flow field, anchored at a grid point.
/// The origin never changes; the velocity is replaced wholesale on every
/// regeneration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FlowVector {
    pub(crate) origin_x: f32,
    pub(crate) origin_y: f32,
    pub(crate) vx: f32,
    pub(crate) vy: f32,
}

impl FlowVector {
    pub(crate) fn new(origin_x: f32, origin_y: f32, vx: f32, vy: f32) -> Self {
        Self {
            origin_x,
            origin_y,
            vx,
            vy,
        }
    }

    /// Velocity with its magnitude capped at `max_speed`, direction kept.
    /// A zero vector comes back as a zero vector; the cap branch never
    /// divides by a zero length.
    pub(crate) fn normalized_velocity(&self, max_speed: f32) -> (f32, f32) {
        let len = (self.vx * self.vx + self.vy * self.vy).sqrt();
        if len > max_speed {
            let m = max_speed / len;
            (self.vx * m, self.vy * m)
        } else {
            (self.vx, self.vy)
        }
    }
}

/// Dense grid of flow vectors covering the canvas, one per `cell_size`
/// step on each axis. The grid shape is fixed between resizes; the vectors
/// are overwritten every tick by `regenerate`.
pub(crate) struct FlowField {
    width: f32,
    height: f32,
    cell_size: f32,
    cols: usize,
    rows: usize,
    vectors: Vec<FlowVector>,
}

impl FlowField {
    pub(crate) fn new(width: f32, height: f32, cfg: &Config) -> Self {
        let cell = cfg.cell_size;
        let cols = if width > 0.0 {
            (width / cell).ceil() as usize
        } else {
            0
        };
        let rows = if height > 0.0 {
            (height / cell).ceil() as usize
        } else {
            0
        };

        let mut vectors = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                vectors.push(FlowVector::new(
                    col as f32 * cell,
                    row as f32 * cell,
                    0.0,
                    0.0,
                ));
            }
        }

        Self {
            width,
            height,
            cell_size: cell,
            cols,
            rows,
            vectors,
        }
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.vectors.len()
    }

    pub(crate) fn vectors(&self) -> &[FlowVector] {
        &self.vectors
    }

    /// Overwrite every cell from the noise source at the given clock value.
    /// Column and row phase offsets restart at zero each call and drift by
    /// `drift_step` per step, so the result is a pure function of `time`.
    pub(crate) fn regenerate<N: NoiseSource>(&mut self, noise: &N, time: f32, cfg: &Config) {
        let mut x_off = 0.0f32;
        for col in 0..self.cols {
            let x = col as f32 * self.cell_size;
            let mut y_off = 0.0f32;
            for row in 0..self.rows {
                let y = row as f32 * self.cell_size;
                let angle = noise.sample(x_off + time, y_off + time) * cfg.angle_span;
                self.vectors[row * self.cols + col] = FlowVector::new(
                    x,
                    y,
                    angle.cos() * cfg.field_speed,
                    angle.sin() * cfg.field_speed,
                );
                y_off += cfg.drift_step;
            }
            x_off += cfg.drift_step;
        }
    }

    /// Nearest-lower-cell lookup for an in-bounds position. `None` for an
    /// in-bounds position means the grid and cell size disagree, which is a
    /// bug in this module, not a runtime condition.
    pub(crate) fn vector_at(&self, x: f32, y: f32) -> Option<&FlowVector> {
        if x < 0.0 || y < 0.0 || x >= self.width || y >= self.height {
            return None;
        }
        let col = (x / self.cell_size).floor() as usize;
        let row = (y / self.cell_size).floor() as usize;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.vectors.get(row * self.cols + col)
    }

    pub(crate) fn resize(&mut self, width: f32, height: f32, cfg: &Config) {
        *self = Self::new(width, height, cfg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flat(f32);
    impl NoiseSource for Flat {
        fn sample(&self, _x: f32, _y: f32) -> f32 {
            self.0
        }
    }

    fn cfg() -> Config {
        Config::default()
    }

    #[test]
    fn cap_preserves_direction_and_limits_magnitude() {
        let v = FlowVector::new(0.0, 0.0, 6.0, 8.0);
        let (vx, vy) = v.normalized_velocity(1.0);
        let len = (vx * vx + vy * vy).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
        // Same direction: components keep the 3:4 ratio.
        assert!((vx / vy - 6.0 / 8.0).abs() < 1e-5);
    }

    #[test]
    fn velocity_under_the_cap_is_untouched() {
        let v = FlowVector::new(0.0, 0.0, 0.3, -0.4);
        assert_eq!(v.normalized_velocity(1.0), (0.3, -0.4));
        assert_eq!(v.normalized_velocity(0.5), (0.3, -0.4));
    }

    #[test]
    fn zero_vector_normalizes_to_zero() {
        let v = FlowVector::new(5.0, 5.0, 0.0, 0.0);
        let (vx, vy) = v.normalized_velocity(1.0);
        assert_eq!((vx, vy), (0.0, 0.0));
        assert!(vx.is_finite() && vy.is_finite());
    }

    #[test]
    fn grid_covers_canvas_exactly() {
        let field = FlowField::new(300.0, 300.0, &cfg());
        assert_eq!(field.cell_count(), 100);
    }

    #[test]
    fn degenerate_canvas_has_no_cells() {
        let field = FlowField::new(0.0, 0.0, &cfg());
        assert_eq!(field.cell_count(), 0);
        assert!(field.vector_at(0.0, 0.0).is_none());
    }

    #[test]
    fn origin_position_buckets_to_origin_cell() {
        let field = FlowField::new(300.0, 300.0, &cfg());
        let v = field.vector_at(0.0, 0.0).unwrap();
        assert_eq!((v.origin_x, v.origin_y), (0.0, 0.0));

        let v = field.vector_at(45.0, 75.0).unwrap();
        assert_eq!((v.origin_x, v.origin_y), (30.0, 60.0));
    }

    #[test]
    fn every_in_bounds_cell_is_defined() {
        let field = FlowField::new(160.0, 96.0, &cfg());
        let c = cfg();
        let mut y = 0.0;
        while y < 96.0 {
            let mut x = 0.0;
            while x < 160.0 {
                assert!(field.vector_at(x, y).is_some(), "missing cell at {x},{y}");
                x += c.cell_size;
            }
            y += c.cell_size;
        }
    }

    #[test]
    fn flat_noise_yields_the_expected_angle() {
        let c = cfg();
        let mut field = FlowField::new(90.0, 90.0, &c);
        field.regenerate(&Flat(0.25), 0.0, &c);
        let angle = 0.25 * c.angle_span;
        for v in field.vectors() {
            assert!((v.vx - angle.cos() * c.field_speed).abs() < 1e-4);
            assert!((v.vy - angle.sin() * c.field_speed).abs() < 1e-4);
        }
    }

    #[test]
    fn regeneration_is_pure_in_time() {
        use crate::noise::Perlin;
        let c = cfg();
        let noise = Perlin::new(3);

        let mut a = FlowField::new(300.0, 300.0, &c);
        let mut b = FlowField::new(300.0, 300.0, &c);

        a.regenerate(&noise, 0.125, &c);
        // Disturb b with a different clock first; the rewrite must not leak.
        b.regenerate(&noise, 0.7, &c);
        b.regenerate(&noise, 0.125, &c);

        assert_eq!(a.vectors(), b.vectors());
    }
}
