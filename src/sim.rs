use crate::config::Config;
use crate::field::FlowField;
use crate::noise::NoiseSource;
use crate::particle::Particle;
use crate::render::PixelCanvas;
use rand::Rng;

/// Driver state: the clock, the field and the particle population, all
/// owned here and nowhere else. One `tick` is one frame's worth of work and
/// always runs to completion; scheduling and cancellation belong to the
/// caller.
pub(crate) struct Simulation {
    width: f32,
    height: f32,
    time: f32,
    field: FlowField,
    particles: Vec<Particle>,
}

impl Simulation {
    pub(crate) fn new<R: Rng>(width: f32, height: f32, cfg: &Config, rng: &mut R) -> Self {
        Self {
            width,
            height,
            time: 0.0,
            field: FlowField::new(width, height, cfg),
            particles: spawn_population(width, height, cfg, rng),
        }
    }

    /// Advance the clock, rebuild the field from the noise source, then
    /// update every particle against the fresh field.
    pub(crate) fn tick<N: NoiseSource>(&mut self, noise: &N, cfg: &Config) {
        self.time += cfg.time_step;
        self.field.regenerate(noise, self.time, cfg);
        for p in &mut self.particles {
            p.update(&self.field, self.width, self.height, cfg);
        }
    }

    /// New bounds from the host: rebuild the grid and respawn the
    /// population scaled to the new area.
    pub(crate) fn resize<R: Rng>(&mut self, width: f32, height: f32, cfg: &Config, rng: &mut R) {
        self.width = width;
        self.height = height;
        self.field.resize(width, height, cfg);
        self.particles = spawn_population(width, height, cfg, rng);
    }

    pub(crate) fn draw(&self, canvas: &mut PixelCanvas, cfg: &Config) {
        for p in &self.particles {
            p.draw(canvas, cfg.trail_alpha);
        }
    }

    pub(crate) fn field(&self) -> &FlowField {
        &self.field
    }

    pub(crate) fn particle_count(&self) -> usize {
        self.particles.len()
    }

    #[cfg(test)]
    pub(crate) fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

fn spawn_population<R: Rng>(width: f32, height: f32, cfg: &Config, rng: &mut R) -> Vec<Particle> {
    let count = ((width * height) / cfg.spawn_divisor).max(0.0) as usize;
    (0..count)
        .map(|_| Particle::spawn(rng, width, height, cfg.particle_radius))
        .collect()
}
