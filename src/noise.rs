use rand::{rngs::StdRng, Rng, SeedableRng};

/// 2D coherent noise: deterministic, continuous, roughly [-1, 1].
/// The field generator only ever talks to this trait, so tests can feed it
/// flat or ramped sources.
pub(crate) trait NoiseSource {
    fn sample(&self, x: f32, y: f32) -> f32;
}

/// Classic gradient (Perlin) noise over a seeded permutation table.
/// No interior mutability: identical inputs give identical outputs for the
/// lifetime of the value, which keeps the flow field spatially coherent.
pub(crate) struct Perlin {
    perm: [u8; 512],
}

impl Perlin {
    pub(crate) fn new(seed: u64) -> Self {
        let mut table = [0u8; 256];
        for (i, v) in table.iter_mut().enumerate() {
            *v = i as u8;
        }
        let mut rng = StdRng::seed_from_u64(seed);
        for i in (1..256).rev() {
            let j = rng.gen_range(0..=i);
            table.swap(i, j);
        }
        let mut perm = [0u8; 512];
        for i in 0..512 {
            perm[i] = table[i & 255];
        }
        Self { perm }
    }

    fn grad(hash: u8, x: f32, y: f32) -> f32 {
        // Eight unit gradients: axes plus normalized diagonals.
        const DIAG: f32 = std::f32::consts::FRAC_1_SQRT_2;
        match hash & 7 {
            0 => x,
            1 => -x,
            2 => y,
            3 => -y,
            4 => (x + y) * DIAG,
            5 => (x - y) * DIAG,
            6 => (-x + y) * DIAG,
            _ => (-x - y) * DIAG,
        }
    }
}

fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl NoiseSource for Perlin {
    fn sample(&self, x: f32, y: f32) -> f32 {
        let xi = x.floor();
        let yi = y.floor();
        let xf = x - xi;
        let yf = y - yi;

        let xw = (xi as i32 & 255) as usize;
        let yw = (yi as i32 & 255) as usize;

        let u = fade(xf);
        let v = fade(yf);

        let a = self.perm[xw] as usize + yw;
        let b = self.perm[xw + 1] as usize + yw;

        let n00 = Self::grad(self.perm[a], xf, yf);
        let n10 = Self::grad(self.perm[b], xf - 1.0, yf);
        let n01 = Self::grad(self.perm[a + 1], xf, yf - 1.0);
        let n11 = Self::grad(self.perm[b + 1], xf - 1.0, yf - 1.0);

        let value = lerp(lerp(n00, n10, u), lerp(n01, n11, u), v);

        // Unit gradients bound 2D output to +-sqrt(2)/2; rescale to [-1, 1].
        (value * std::f32::consts::SQRT_2).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_stays_in_unit_range() {
        let noise = Perlin::new(7);
        for i in 0..64 {
            for j in 0..64 {
                let v = noise.sample(i as f32 * 0.173, j as f32 * 0.131);
                assert!((-1.0..=1.0).contains(&v), "out of range: {v}");
            }
        }
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let noise = Perlin::new(42);
        let again = Perlin::new(42);
        for i in 0..32 {
            let x = i as f32 * 0.05;
            assert_eq!(noise.sample(x, 1.0 - x), noise.sample(x, 1.0 - x));
            assert_eq!(noise.sample(x, 1.0 - x), again.sample(x, 1.0 - x));
        }
    }

    #[test]
    fn seeds_change_the_field() {
        let a = Perlin::new(1);
        let b = Perlin::new(2);
        let differs = (0..64).any(|i| {
            let x = i as f32 * 0.37;
            a.sample(x, x * 0.5) != b.sample(x, x * 0.5)
        });
        assert!(differs);
    }

    #[test]
    fn nearby_samples_are_nearby() {
        let noise = Perlin::new(9);
        let base = noise.sample(0.4, 0.6);
        let close = noise.sample(0.4001, 0.6);
        assert!((base - close).abs() < 0.01);
    }
}
