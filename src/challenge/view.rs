//! The client-visible subset of a challenge. Scoring thresholds, weights,
//! the cognitive target count, and per-flash target flags never appear here.

use super::{Challenge, ChallengeBody, PathParams, Probe};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPulseStandalone {
    pub offset_ms: f64,
    pub amp_x: f64,
    pub amp_y: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPulseEmbed {
    pub hover_time_ms: f64,
    pub amp_x: f64,
    pub amp_y: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFlash {
    pub at_ms: f64,
    pub color: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCogTask {
    pub target_color: String,
    pub colors: Vec<String>,
    pub flashes: Vec<ClientFlash>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum ClientChallenge {
    #[serde(rename = "standalone", rename_all = "camelCase")]
    Standalone {
        challenge_id: String,
        free_move_duration_ms: f64,
        tracking_duration_ms: f64,
        dualtask_duration_ms: f64,
        path: PathParams,
        probes: Vec<Probe>,
        pulses: Vec<ClientPulseStandalone>,
        pulse_hold_duration_ms: f64,
        pulse_return_duration_ms: f64,
        cog_task: ClientCogTask,
    },
    #[serde(rename = "embed", rename_all = "camelCase")]
    Embed {
        challenge_id: String,
        probes: Vec<Probe>,
        pulses: Vec<ClientPulseEmbed>,
        pulse_hold_duration_ms: f64,
        pulse_return_duration_ms: f64,
    },
}

pub fn client_view(challenge: &Challenge) -> ClientChallenge {
    match &challenge.body {
        ChallengeBody::Standalone(p) => ClientChallenge::Standalone {
            challenge_id: challenge.id.clone(),
            free_move_duration_ms: p.free_move_ms,
            tracking_duration_ms: p.tracking_ms,
            dualtask_duration_ms: p.dualtask_ms,
            path: p.path,
            probes: p.probes.clone(),
            pulses: p
                .pulses
                .iter()
                .map(|pu| ClientPulseStandalone {
                    offset_ms: pu.at_ms,
                    amp_x: pu.amp_x,
                    amp_y: pu.amp_y,
                })
                .collect(),
            pulse_hold_duration_ms: p.pulse_hold_ms,
            pulse_return_duration_ms: p.pulse_return_ms,
            cog_task: ClientCogTask {
                target_color: p.cog.target_color.clone(),
                colors: {
                    let mut colors = vec![p.cog.target_color.clone()];
                    colors.extend(p.cog.distractor_colors.iter().cloned());
                    colors
                },
                flashes: p
                    .cog
                    .flashes
                    .iter()
                    .map(|f| ClientFlash {
                        at_ms: f.at_ms,
                        color: f.color.clone(),
                    })
                    .collect(),
            },
        },
        ChallengeBody::Embed(p) => ClientChallenge::Embed {
            challenge_id: challenge.id.clone(),
            probes: p.probes.clone(),
            pulses: p
                .pulses
                .iter()
                .map(|pu| ClientPulseEmbed {
                    hover_time_ms: pu.at_ms,
                    amp_x: pu.amp_x,
                    amp_y: pu.amp_y,
                })
                .collect(),
            pulse_hold_duration_ms: p.pulse_hold_ms,
            pulse_return_duration_ms: p.pulse_return_ms,
        },
    }
}
