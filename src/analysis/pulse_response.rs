//! Pulse response latency and overshoot.
//!
//! Each pulse is analyzed in isolation: pre-pulse cursor motion is fitted
//! and extrapolated so only the discrete correction remains, normalized by
//! the pulse amplitude into a unitless correction signal. Onset is the
//! first sustained crossing; biological latencies cluster in the
//! 120-380 ms range with trial-to-trial jitter.

use super::{PulseWindow, TrackingSample};
use crate::dsp::{linear_regression, mean, population_std};

const PRE_WINDOW_MS: f64 = 200.0;
const POST_WINDOW_MS: f64 = 600.0;
const ONSET_MIN_MS: f64 = 80.0;
const ONSET_LEVEL: f64 = 0.20;
const SUSTAIN_LEVEL: f64 = 0.15;
const SUSTAIN_MS: f64 = 40.0;
const MIN_PRE_SAMPLES: usize = 3;
const MIN_DETECTED: usize = 2;

#[derive(Clone, Copy, Debug)]
pub struct PulseResponseFeatures {
    pub latency_mean_ms: f64,
    pub latency_std_ms: f64,
    pub overshoot_mean: f64,
    pub detected_count: usize,
}

/// Normalized correction trace of one detected pulse, for the
/// minimum-jerk fit. Times are ms after pulse start.
#[derive(Clone, Debug)]
pub struct PulseTrace {
    pub pulse_index: usize,
    pub latency_ms: f64,
    pub peak_time_ms: f64,
    pub peak_correction: f64,
    pub times_ms: Vec<f64>,
    pub corrections: Vec<f64>,
}

pub fn analyze(
    samples: &[TrackingSample],
    pulses: &[PulseWindow],
) -> (Option<PulseResponseFeatures>, Vec<PulseTrace>) {
    let mut traces = Vec::new();
    let mut latencies = Vec::new();
    let mut overshoots = Vec::new();

    for pulse in pulses {
        let Some(trace) = analyze_pulse(samples, pulse) else {
            continue;
        };
        latencies.push(trace.latency_ms);
        overshoots.push((trace.peak_correction - 1.0).max(0.0));
        traces.push(trace);
    }

    if latencies.len() < MIN_DETECTED {
        return (None, traces);
    }
    let features = PulseResponseFeatures {
        latency_mean_ms: mean(&latencies),
        latency_std_ms: population_std(&latencies),
        overshoot_mean: mean(&overshoots),
        detected_count: latencies.len(),
    };
    (Some(features), traces)
}

fn analyze_pulse(samples: &[TrackingSample], pulse: &PulseWindow) -> Option<PulseTrace> {
    if pulse.amp_x == 0.0 {
        return None;
    }

    let pre: Vec<&TrackingSample> = samples
        .iter()
        .filter(|s| s.t >= pulse.start_ms - PRE_WINDOW_MS && s.t < pulse.start_ms)
        .collect();
    if pre.len() < MIN_PRE_SAMPLES {
        return None;
    }
    let pre_t: Vec<f64> = pre.iter().map(|s| s.t - pulse.start_ms).collect();
    let pre_x: Vec<f64> = pre.iter().map(|s| s.x).collect();
    let fit = linear_regression(&pre_t, &pre_x)?;

    let post: Vec<&TrackingSample> = samples
        .iter()
        .filter(|s| s.t >= pulse.start_ms && s.t < pulse.start_ms + POST_WINDOW_MS)
        .collect();
    if post.is_empty() {
        return None;
    }

    // Subtract the extrapolated pre-pulse motion and normalize by the pulse
    // amplitude (sign included, so a correction toward the pulse is
    // positive regardless of direction).
    let times_ms: Vec<f64> = post.iter().map(|s| s.t - pulse.start_ms).collect();
    let corrections: Vec<f64> = post
        .iter()
        .zip(times_ms.iter())
        .map(|(s, dt)| {
            let expected = fit.intercept + fit.slope * dt;
            (s.x - expected) / pulse.amp_x
        })
        .collect();

    let onset_idx = detect_onset(&times_ms, &corrections)?;
    let latency_ms = times_ms[onset_idx];

    let (peak_idx, peak_correction) = corrections
        .iter()
        .enumerate()
        .skip(onset_idx)
        .map(|(i, c)| (i, *c))
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    Some(PulseTrace {
        pulse_index: pulse.index,
        latency_ms,
        peak_time_ms: times_ms[peak_idx],
        peak_correction,
        times_ms,
        corrections,
    })
}

/// First index at `t >= 80 ms` where the correction exceeds 0.20 and every
/// sample over the following 40 ms stays above 0.15.
fn detect_onset(times_ms: &[f64], corrections: &[f64]) -> Option<usize> {
    for i in 0..corrections.len() {
        if times_ms[i] < ONSET_MIN_MS || corrections[i] <= ONSET_LEVEL {
            continue;
        }
        let sustained = times_ms
            .iter()
            .zip(corrections.iter())
            .skip(i + 1)
            .take_while(|(t, _)| **t <= times_ms[i] + SUSTAIN_MS)
            .all(|(_, c)| *c > SUSTAIN_LEVEL);
        if sustained {
            return Some(i);
        }
    }
    None
}
