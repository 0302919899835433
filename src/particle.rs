use crate::config::Config;
use crate::field::FlowField;
use crate::render::{Pixel, PixelCanvas};
use rand::Rng;

/// Which leg of the hue cycle a particle is on. Exactly one channel falls
/// while the next one rises; the tag advances when the falling channel
/// bottoms out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ColorPhase {
    RedToGreen,
    GreenToBlue,
    BlueToRed,
}

#[derive(Clone, Debug)]
pub(crate) struct Particle {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) vx: f32,
    pub(crate) vy: f32,
    pub(crate) radius: f32,
    pub(crate) r: f32,
    pub(crate) g: f32,
    pub(crate) b: f32,
    pub(crate) phase: ColorPhase,
}

impl Particle {
    pub(crate) fn new(x: f32, y: f32, vx: f32, vy: f32, radius: f32) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            radius,
            r: 255.0,
            g: 0.0,
            b: 0.0,
            phase: ColorPhase::RedToGreen,
        }
    }

    pub(crate) fn spawn<R: Rng>(rng: &mut R, width: f32, height: f32, radius: f32) -> Self {
        Self::new(
            rng.gen::<f32>() * width,
            rng.gen::<f32>() * height,
            rng.gen::<f32>(),
            rng.gen::<f32>(),
            radius,
        )
    }

    /// Teleport across the opposite edge when a component leaves [0, extent].
    /// Runs before the field sample so the sampled cell is always in bounds.
    pub(crate) fn wrap(&mut self, width: f32, height: f32) {
        if self.x >= width {
            self.x = 1.0;
        } else if self.x <= 0.0 {
            self.x = width - 1.0;
        }

        if self.y >= height {
            self.y = 1.0;
        } else if self.y <= 0.0 {
            self.y = height - 1.0;
        }
    }

    /// One leg of the three-phase hue cycle per tick. The falling channel
    /// clamps at zero and the newly dominant one snaps to 255, so a full
    /// cycle lands back on the exact starting channels.
    pub(crate) fn step_color(&mut self, step: f32) {
        match self.phase {
            ColorPhase::RedToGreen => {
                self.r -= step;
                self.g += step;
                if self.r <= 0.0 {
                    self.r = 0.0;
                    self.g = 255.0;
                    self.phase = ColorPhase::GreenToBlue;
                }
            }
            ColorPhase::GreenToBlue => {
                self.g -= step;
                self.b += step;
                if self.g <= 0.0 {
                    self.g = 0.0;
                    self.b = 255.0;
                    self.phase = ColorPhase::BlueToRed;
                }
            }
            ColorPhase::BlueToRed => {
                self.b -= step;
                self.r += step;
                if self.b <= 0.0 {
                    self.b = 0.0;
                    self.r = 255.0;
                    self.phase = ColorPhase::RedToGreen;
                }
            }
        }
    }

    /// One tick: wrap, adopt the capped velocity of the nearest field cell,
    /// Euler-step the position, advance the hue.
    pub(crate) fn update(&mut self, flow: &FlowField, width: f32, height: f32, cfg: &Config) {
        self.wrap(width, height);

        let Some(vector) = flow.vector_at(self.x, self.y) else {
            debug_assert!(
                false,
                "no flow cell under particle at ({}, {})",
                self.x, self.y
            );
            return;
        };

        let (vx, vy) = vector.normalized_velocity(cfg.max_speed);
        self.vx = vx;
        self.vy = vy;
        self.x += self.vx;
        self.y += self.vy;

        self.step_color(cfg.color_step);
    }

    /// Filled disc at the current position, alpha-blended so trails from
    /// earlier frames shine through.
    pub(crate) fn draw(&self, canvas: &mut PixelCanvas, alpha: f32) {
        let ink = Pixel {
            r: self.r.clamp(0.0, 255.0) as u8,
            g: self.g.clamp(0.0, 255.0) as u8,
            b: self.b.clamp(0.0, 255.0) as u8,
            a: (alpha.clamp(0.0, 1.0) * 255.0) as u8,
        };

        let cx = self.x.round() as i32;
        let cy = self.y.round() as i32;
        let rad = self.radius.max(0.5);
        let reach = rad.ceil() as i32;
        let r2 = rad * rad;

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if (dx * dx + dy * dy) as f32 > r2 {
                    continue;
                }
                canvas.blend_over(cx + dx, cy + dy, ink);
            }
        }
    }
}
