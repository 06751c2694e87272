//! Challenge records and their randomized generation.
//!
//! A challenge is a server-only record; clients receive the reduced
//! [`view::ClientChallenge`] which carries everything needed to render the
//! task but none of the scoring-relevant secrets.

pub mod generate;
pub mod view;

use crate::types::Mode;
use serde::{Deserialize, Serialize};

/// A sinusoidal probe injected into the target position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Probe {
    pub freq_hz: f64,
    pub amp_x: f64,
    pub amp_y: f64,
    pub phase_offset: f64,
}

/// A rectangular target displacement with a quadratic ease-out return.
/// `at_ms` is an offset since tracking start in standalone mode and a
/// cumulative hover time in embed mode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pulse {
    pub at_ms: f64,
    pub amp_x: f64,
    pub amp_y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathParams {
    pub freq_x: f64,
    pub freq_y: f64,
    pub phase: f64,
    pub padding: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flash {
    pub at_ms: f64,
    pub color: String,
    pub is_target: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CogTask {
    pub target_color: String,
    pub distractor_colors: [String; 2],
    pub target_count: usize,
    pub flashes: Vec<Flash>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandaloneParams {
    pub free_move_ms: f64,
    pub tracking_ms: f64,
    pub dualtask_ms: f64,
    pub path: PathParams,
    pub probes: Vec<Probe>,
    pub pulses: Vec<Pulse>,
    pub pulse_hold_ms: f64,
    pub pulse_return_ms: f64,
    pub cog: CogTask,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedParams {
    pub probes: Vec<Probe>,
    pub pulses: Vec<Pulse>,
    pub pulse_hold_ms: f64,
    pub pulse_return_ms: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ChallengeBody {
    Standalone(StandaloneParams),
    Embed(EmbedParams),
}

/// Server-side challenge record. Mutated only to flip `used`; evicted by
/// the store sweeper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: String,
    pub issued_at_ms: u64,
    pub expires_at_ms: u64,
    pub used: bool,
    pub used_at_ms: Option<u64>,
    pub body: ChallengeBody,
}

impl Challenge {
    pub fn mode(&self) -> Mode {
        match self.body {
            ChallengeBody::Standalone(_) => Mode::Standalone,
            ChallengeBody::Embed(_) => Mode::Embed,
        }
    }

    pub fn probes(&self) -> &[Probe] {
        match &self.body {
            ChallengeBody::Standalone(p) => &p.probes,
            ChallengeBody::Embed(p) => &p.probes,
        }
    }

    pub fn pulses(&self) -> &[Pulse] {
        match &self.body {
            ChallengeBody::Standalone(p) => &p.pulses,
            ChallengeBody::Embed(p) => &p.pulses,
        }
    }

    pub fn pulse_hold_ms(&self) -> f64 {
        match &self.body {
            ChallengeBody::Standalone(p) => p.pulse_hold_ms,
            ChallengeBody::Embed(p) => p.pulse_hold_ms,
        }
    }

    pub fn pulse_return_ms(&self) -> f64 {
        match &self.body {
            ChallengeBody::Standalone(p) => p.pulse_return_ms,
            ChallengeBody::Embed(p) => p.pulse_return_ms,
        }
    }
}
