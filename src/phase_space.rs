use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Error, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

const DAMPING: f64 = 0.9;
const DEFAULT_VOLATILITY: f64 = 0.5;
const SYNTHETIC_VOLATILITY: f64 = 0.2;
const TWO_POW_32: f64 = 4_294_967_296.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    History,
    Prediction,
    Simulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhasePoint {
    pub time: i64,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PointKind>,
}

impl PhasePoint {
    pub fn new(time: i64, x: f64, y: f64) -> Self {
        Self {
            time,
            x,
            y,
            kind: None,
        }
    }

    pub fn tagged(mut self, kind: PointKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volatility {
    pub vol_x: f64,
    pub vol_y: f64,
}

/// Mulberry32. Same seed, same sequence on every platform.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.next_u32() as u64;
        let hi = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state as u32)
    }
}

pub fn velocity(p1: &PhasePoint, p2: &PhasePoint) -> Velocity {
    Velocity {
        vx: p2.x - p1.x,
        vy: p2.y - p1.y,
    }
}

// Turning angle in radians, 0..=PI.
pub fn curvature(p1: &PhasePoint, p2: &PhasePoint, p3: &PhasePoint) -> f64 {
    let v1 = velocity(p1, p2);
    let v2 = velocity(p2, p3);

    let dot = v1.vx * v2.vx + v1.vy * v2.vy;
    let mag1 = v1.vx.hypot(v1.vy);
    let mag2 = v2.vx.hypot(v2.vy);
    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }

    (dot / (mag1 * mag2)).clamp(-1.0, 1.0).acos()
}

pub fn predict_next_state(history: &[PhasePoint]) -> Option<PhasePoint> {
    let last = *history.last()?;
    if history.len() < 2 {
        return Some(last);
    }
    let prev = history[history.len() - 2];
    let v = velocity(&prev, &last);
    Some(PhasePoint::new(
        last.time + 1,
        last.x + v.vx * DAMPING,
        last.y + v.vy * DAMPING,
    ))
}

pub fn volatility(history: &[PhasePoint]) -> Volatility {
    if history.len() < 2 {
        return Volatility {
            vol_x: DEFAULT_VOLATILITY,
            vol_y: DEFAULT_VOLATILITY,
        };
    }

    let steps: Vec<Velocity> = history.windows(2).map(|w| velocity(&w[0], &w[1])).collect();
    let n = steps.len() as f64;
    let mean_x = steps.iter().map(|s| s.vx).sum::<f64>() / n;
    let mean_y = steps.iter().map(|s| s.vy).sum::<f64>() / n;
    let var_x = steps.iter().map(|s| (s.vx - mean_x).powi(2)).sum::<f64>() / n;
    let var_y = steps.iter().map(|s| (s.vy - mean_y).powi(2)).sum::<f64>() / n;

    Volatility {
        vol_x: var_x.sqrt(),
        vol_y: var_y.sqrt(),
    }
}

#[derive(Debug, Clone)]
pub struct PhaseSpaceEngine<R = Mulberry32> {
    rng: R,
    seed: Option<u32>,
}

impl PhaseSpaceEngine<Mulberry32> {
    pub fn seeded(seed: u32) -> Self {
        Self {
            rng: Mulberry32::new(seed),
            seed: Some(seed),
        }
    }

    pub fn reseed(&mut self, seed: u32) {
        self.rng = Mulberry32::new(seed);
        self.seed = Some(seed);
    }
}

impl PhaseSpaceEngine<StdRng> {
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: RngCore> PhaseSpaceEngine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng, seed: None }
    }

    pub fn seed(&self) -> Option<u32> {
        self.seed
    }

    fn next_unit(&mut self) -> f64 {
        self.rng.next_u32() as f64 / TWO_POW_32
    }

    // Box-Muller
    fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u = 1.0 - self.next_unit();
        let v = self.next_unit();
        let z = (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos();
        z * std_dev + mean
    }

    pub fn run_monte_carlo(&mut self, history: &[PhasePoint], iterations: usize) -> Vec<PhasePoint> {
        if history.len() < 2 {
            return Vec::new();
        }

        let last = history[history.len() - 1];
        let trend = velocity(&history[history.len() - 2], &last);
        let mean_x = trend.vx * DAMPING;
        let mean_y = trend.vy * DAMPING;
        let vol = volatility(history);

        (0..iterations)
            .map(|_| {
                let noise_x = self.gaussian(0.0, vol.vol_x);
                let noise_y = self.gaussian(0.0, vol.vol_y);
                PhasePoint::new(last.time + 1, last.x + mean_x + noise_x, last.y + mean_y + noise_y)
                    .tagged(PointKind::Simulation)
            })
            .collect()
    }

    pub fn synthetic_history(&mut self, attack: f64, defense: f64, steps: usize) -> Vec<PhasePoint> {
        let mut out = Vec::with_capacity(steps);
        let (mut cx, mut cy) = (attack, defense);

        for i in 0..steps {
            out.push(PhasePoint::new((steps - i) as i64, cx, cy).tagged(PointKind::History));
            cx -= (self.next_unit() - 0.4) * SYNTHETIC_VOLATILITY;
            cy -= (self.next_unit() - 0.6) * SYNTHETIC_VOLATILITY;
        }

        out.reverse();
        out
    }
}
