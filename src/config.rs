use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which steps swing pushes late.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingParity {
    Odd,
    Even,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingPolicy {
    pub delayed: SwingParity,
    // delay at swing = 1.0, as a fraction of one step
    pub max_fraction: f64,
}

impl Default for SwingPolicy {
    fn default() -> Self {
        Self {
            delayed: SwingParity::Odd,
            max_fraction: 0.3,
        }
    }
}

/// What happens to the playhead on stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopPolicy {
    Reset,
    Preserve,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub tick_ms: u64,
    pub lookahead_ms: u64,
    pub start_lead_ms: u64,
    pub swing: SwingPolicy,
    pub stop_policy: StopPolicy,
    pub max_voice_ms: u64,
    pub master_gain: f32,
    // play samples backwards too while the transport runs in reverse
    pub reverse_samples: bool,
    pub seed: Option<u64>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 25,
            lookahead_ms: 100,
            start_lead_ms: 20,
            swing: SwingPolicy::default(),
            stop_policy: StopPolicy::Reset,
            max_voice_ms: 10_000,
            master_gain: 0.8,
            reverse_samples: false,
            seed: None,
        }
    }
}

impl SequencerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn lookahead_secs(&self) -> f64 {
        self.lookahead_ms as f64 / 1000.0
    }

    pub fn start_lead_secs(&self) -> f64 {
        self.start_lead_ms as f64 / 1000.0
    }

    pub fn max_voice_secs(&self) -> f64 {
        self.max_voice_ms as f64 / 1000.0
    }
}
