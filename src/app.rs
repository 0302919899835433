use crate::config::Config;
use crate::input::{collect_actions, Action};
use crate::noise::Perlin;
use crate::render::{canvas_to_cells, draw_segment, draw_text, Pixel, Surface};
use crate::sim::Simulation;
use crossterm::style::Color;
use rand::{rngs::StdRng, SeedableRng};
use std::time::{Duration, Instant};

pub(crate) struct App {
    cfg: Config,
    surface: Surface,
    noise: Perlin,
    rng: StdRng,
    sim: Simulation,
    paused: bool,
    show_help: bool,
    show_vectors: bool,
    should_quit: bool,
    reset_salt: u64,
}

impl App {
    fn init() -> anyhow::Result<Self> {
        let cfg = Config::default();

        // No surface, no animation: a failure here never reaches the loop.
        let surface = Surface::begin()?;

        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let noise = Perlin::new(cfg.seed);
        let (w, h) = (surface.canvas.w as f32, surface.canvas.h as f32);
        let sim = Simulation::new(w, h, &cfg, &mut rng);

        Ok(Self {
            cfg,
            surface,
            noise,
            rng,
            sim,
            paused: false,
            show_help: false,
            show_vectors: false,
            should_quit: false,
            reset_salt: 0,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.cfg.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);

        while !self.should_quit {
            let frame_start = Instant::now();

            if self.surface.resize_if_needed()? {
                let (w, h) = (self.surface.canvas.w as f32, self.surface.canvas.h as f32);
                self.sim.resize(w, h, &self.cfg, &mut self.rng);
            }

            for action in collect_actions(frame_dt)? {
                match action {
                    Action::Quit => self.should_quit = true,
                    Action::TogglePause => self.paused = !self.paused,
                    Action::ToggleHelp => self.show_help = !self.show_help,
                    Action::ToggleVectors => self.show_vectors = !self.show_vectors,
                    Action::Reset => self.reset(),
                }
            }

            // One simulation tick per frame; hue and motion rates ride the
            // frame cadence on purpose.
            if !self.paused {
                self.sim.tick(&self.noise, &self.cfg);
                self.sim.draw(&mut self.surface.canvas, &self.cfg);
                if self.show_vectors {
                    self.draw_field_overlay();
                }
            }

            self.render_frame()?;
            spin_sleep(frame_dt, frame_start);
        }

        self.surface.end()?;
        Ok(())
    }

    fn reset(&mut self) {
        self.reset_salt = self
            .reset_salt
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.rng = StdRng::seed_from_u64(self.cfg.seed ^ self.reset_salt);
        let (w, h) = (self.surface.canvas.w as f32, self.surface.canvas.h as f32);
        self.sim = Simulation::new(w, h, &self.cfg, &mut self.rng);
        self.surface.canvas.clear();
    }

    /// Faint segment per field cell along its velocity. Drawn onto the same
    /// trail canvas as the particles, so it smears into the trails exactly
    /// like any other ink.
    fn draw_field_overlay(&mut self) {
        let ink = Pixel {
            r: 90,
            g: 90,
            b: 110,
            a: 48,
        };
        for v in self.sim.field().vectors() {
            draw_segment(
                &mut self.surface.canvas,
                v.origin_x,
                v.origin_y,
                v.vx,
                -v.vy,
                ink,
            );
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        self.surface.clear_frame();
        canvas_to_cells(&self.surface.canvas, &mut self.surface.cur);

        let status = format!(
            "flowfield | {} particles | {} cells{}{}",
            self.sim.particle_count(),
            self.sim.field().cell_count(),
            if self.paused { " | paused" } else { "" },
            if self.show_help { "" } else { " | h help" },
        );
        let dim = Color::Rgb {
            r: 140,
            g: 150,
            b: 170,
        };
        draw_text(&mut self.surface.cur, 1, 0, &status, dim);

        if self.show_help {
            let help = [
                "Keys:",
                "  Q / Esc  quit",
                "  Space    pause",
                "  V        field vectors",
                "  R        reset (new seed, clear trails)",
                "  H        close this help",
            ];
            for (i, line) in help.iter().enumerate() {
                draw_text(&mut self.surface.cur, 1, 2 + i as u16, line, dim);
            }
        }

        self.surface.present()
    }
}

pub(crate) fn run() -> anyhow::Result<()> {
    let mut app = App::init()?;
    let result = app.run();
    if result.is_err() {
        // Loop errors must not leave the terminal in raw mode.
        let _ = app.surface.end();
    }
    result
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        if end - t > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
