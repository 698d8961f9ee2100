use std::collections::VecDeque;

use rail_core::{Constants, TelemetryUpdate, TrainStatus, WorldState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Anything that can report train positions once per tick.
pub trait TelemetrySource {
    fn poll(&mut self, world: &WorldState, constants: &Constants) -> Vec<TelemetryUpdate>;
}

/// Amplitude of the random walk layered on top of dead reckoning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryNoise {
    /// Uniform ± offset on each reported position.
    pub position_km: f64,
    /// Uniform ± offset on each reported speed.
    pub speed_kmh: f64,
    /// Chance per tick that a train gains or loses one minute of delay.
    pub delay_change_probability: f64,
}

impl TelemetryNoise {
    pub fn none() -> Self {
        Self {
            position_km: 0.0,
            speed_kmh: 0.0,
            delay_change_probability: 0.0,
        }
    }
}

impl Default for TelemetryNoise {
    fn default() -> Self {
        Self {
            position_km: 0.1,
            speed_kmh: 5.0,
            delay_change_probability: 0.1,
        }
    }
}

/// Pseudo-random feed: every moving train advances by what its speed covers
/// in one tick, plus seeded noise. Halted trains report where they stand.
pub struct SeededTelemetry {
    rng: ChaCha8Rng,
    noise: TelemetryNoise,
}

impl SeededTelemetry {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            noise: TelemetryNoise::default(),
        }
    }

    #[must_use]
    pub fn with_noise(mut self, noise: TelemetryNoise) -> Self {
        self.noise = noise;
        self
    }

    /// Uniform sample in `[-amplitude, amplitude]`; zero amplitude draws nothing.
    fn jitter(&mut self, amplitude: f64) -> f64 {
        if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..=amplitude)
        } else {
            0.0
        }
    }

    fn delay_step(&mut self) -> i32 {
        let p = self.noise.delay_change_probability.clamp(0.0, 1.0);
        if p > 0.0 && self.rng.gen_bool(p) {
            if self.rng.gen_bool(0.5) {
                1
            } else {
                -1
            }
        } else {
            0
        }
    }
}

impl TelemetrySource for SeededTelemetry {
    fn poll(&mut self, world: &WorldState, constants: &Constants) -> Vec<TelemetryUpdate> {
        let hours = f64::from(constants.tick_interval_secs) / 3600.0;
        let mut updates = Vec::with_capacity(world.trains.len());
        for train in &world.trains {
            if train.status == TrainStatus::Halted {
                updates.push(TelemetryUpdate {
                    train_id: train.id.clone(),
                    position_km: train.position_km,
                    speed_kmh: 0.0,
                    delay_minutes: train.delay_minutes,
                });
                continue;
            }
            let travelled = train.direction.sign() * train.speed_kmh * hours;
            let position_km = train.position_km + travelled + self.jitter(self.noise.position_km);
            let speed_kmh = (train.speed_kmh + self.jitter(self.noise.speed_kmh)).max(0.0);
            let delay_minutes = train.delay_minutes + self.delay_step();
            updates.push(TelemetryUpdate {
                train_id: train.id.clone(),
                position_km,
                speed_kmh,
                delay_minutes,
            });
        }
        updates
    }
}

/// Replays recorded frames, one per poll. Once the script runs out every
/// poll returns nothing and the trains keep their last reported state.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTelemetry {
    frames: VecDeque<Vec<TelemetryUpdate>>,
}

impl ScriptedTelemetry {
    pub fn new(frames: impl IntoIterator<Item = Vec<TelemetryUpdate>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }
}

impl TelemetrySource for ScriptedTelemetry {
    fn poll(&mut self, world: &WorldState, _constants: &Constants) -> Vec<TelemetryUpdate> {
        self.frames.pop_front().unwrap_or_else(|| {
            tracing::trace!(tick = world.meta.tick, "telemetry script exhausted");
            Vec::new()
        })
    }
}
