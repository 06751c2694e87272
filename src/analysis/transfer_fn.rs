//! Transfer-function identification over the probe set.
//!
//! The input drive is the reconstructed perturbation; the output is the
//! cursor residual relative to the smooth path. Biological controllers show
//! gain rolloff with frequency and a phase delay in the visuomotor range.

use super::TrackingSample;
use crate::challenge::Probe;
use crate::dsp::spectral::nearest_bin;
use crate::dsp::{resample_uniform, transfer_function};
use std::f64::consts::TAU;

const MIN_SAMPLES: usize = 128;
const COHERENCE_FLOOR: f64 = 0.15;

#[derive(Clone, Debug)]
pub struct ProbeResponse {
    pub freq_hz: f64,
    pub gain: f64,
    pub phase: f64,
    pub coherence: f64,
}

#[derive(Clone, Debug)]
pub struct TransferFnFeatures {
    pub has_rolloff: bool,
    pub mean_delay_ms: Option<f64>,
    pub delay_plausible: bool,
    pub coherent_probe_count: usize,
    pub responses: Vec<ProbeResponse>,
}

pub fn analyze(
    samples: &[TrackingSample],
    probes: &[Probe],
    sample_rate_hz: f64,
) -> Option<TransferFnFeatures> {
    if samples.len() < MIN_SAMPLES || probes.is_empty() || sample_rate_hz <= 0.0 {
        return None;
    }
    let rate = sample_rate_hz.clamp(10.0, 250.0);

    let ts: Vec<f64> = samples.iter().map(|s| s.t).collect();
    let drive: Vec<f64> = samples.iter().map(|s| s.pert_x).collect();
    // Residual relative to the smooth path: the component of cursor motion
    // that can only be a response to the injected perturbation.
    let residual: Vec<f64> = samples
        .iter()
        .map(|s| s.x - (s.target_x - s.pert_x))
        .collect();

    let (_, drive_u) = resample_uniform(&ts, &drive, rate);
    let (_, resid_u) = resample_uniform(&ts, &residual, rate);
    if drive_u.len() < MIN_SAMPLES {
        return None;
    }

    let tf = transfer_function(&drive_u, &resid_u, rate);
    let half = tf.len();

    let responses: Vec<ProbeResponse> = probes
        .iter()
        .map(|p| {
            let pt = tf[nearest_bin(p.freq_hz, half, rate)];
            ProbeResponse {
                freq_hz: p.freq_hz,
                gain: pt.gain,
                phase: pt.phase,
                coherence: pt.coherence,
            }
        })
        .collect();

    // Rolloff: at least two consecutive gain decreases across the
    // frequency-ordered probes.
    let mut run = 0usize;
    let mut best_run = 0usize;
    for pair in responses.windows(2) {
        if pair[1].gain < pair[0].gain {
            run += 1;
            best_run = best_run.max(run);
        } else {
            run = 0;
        }
    }
    let has_rolloff = best_run >= 2;

    // Coherence-weighted delay estimate from probe phases.
    let mut delay_num = 0.0;
    let mut delay_den = 0.0;
    for r in &responses {
        if r.coherence <= COHERENCE_FLOOR {
            continue;
        }
        let delay_ms = -r.phase / (TAU * r.freq_hz) * 1000.0;
        if delay_ms > 0.0 && delay_ms < 1000.0 {
            delay_num += delay_ms * r.coherence;
            delay_den += r.coherence;
        }
    }
    let mean_delay_ms = (delay_den > 0.0).then(|| delay_num / delay_den);
    let delay_plausible = mean_delay_ms.is_some_and(|d| d > 30.0 && d < 500.0);
    let coherent_probe_count = responses
        .iter()
        .filter(|r| r.coherence > COHERENCE_FLOOR)
        .count();

    Some(TransferFnFeatures {
        has_rolloff,
        mean_delay_ms,
        delay_plausible,
        coherent_probe_count,
        responses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(freq_hz: f64, amp_x: f64) -> Probe {
        Probe {
            freq_hz,
            amp_x,
            amp_y: 1.0,
            phase_offset: 0.5,
        }
    }

    /// Synthesize a first-order-lag response to a multi-sine drive: gain
    /// falls with frequency and phase lags, like a human tracking loop.
    #[test]
    fn lagged_lowpass_response_shows_rolloff_and_plausible_delay() {
        let probes = vec![
            probe(0.35, 5.0),
            probe(0.85, 5.0),
            probe(1.45, 5.0),
            probe(2.35, 5.0),
            probe(3.35, 5.0),
        ];
        let rate = 100.0;
        let n = 2_000;
        let dt = 1000.0 / rate;
        let tau_ms = 120.0;
        let transport_ms = 140.0;
        let alpha = dt / (tau_ms + dt);

        let drive_at = |t_ms: f64| -> f64 {
            probes
                .iter()
                .map(|p| p.amp_x * (TAU * p.freq_hz * t_ms / 1000.0).sin())
                .sum()
        };

        let mut samples = Vec::with_capacity(n);
        let mut resp = 0.0;
        for i in 0..n {
            let t = i as f64 * dt;
            let pert = drive_at(t);
            resp += alpha * (drive_at(t - transport_ms) - resp);
            samples.push(TrackingSample {
                t,
                x: 400.0 + resp,
                y: 300.0,
                target_x: 400.0 + pert,
                target_y: 300.0,
                pert_x: pert,
                pert_y: 0.0,
            });
        }

        let f = analyze(&samples, &probes, rate).unwrap();
        assert!(f.has_rolloff, "gains: {:?}", f.responses.iter().map(|r| r.gain).collect::<Vec<_>>());
        let delay = f.mean_delay_ms.unwrap();
        assert!(delay > 100.0 && delay < 450.0, "delay {delay}");
        assert!(f.delay_plausible);
        assert!(f.coherent_probe_count >= 3);
    }

    #[test]
    fn short_sessions_are_insufficient() {
        let samples: Vec<TrackingSample> = (0..50)
            .map(|i| TrackingSample {
                t: i as f64 * 10.0,
                x: 0.0,
                y: 0.0,
                target_x: 0.0,
                target_y: 0.0,
                pert_x: 0.0,
                pert_y: 0.0,
            })
            .collect();
        assert!(analyze(&samples, &[probe(1.0, 5.0)], 100.0).is_none());
    }
}
