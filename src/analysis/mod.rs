//! The analysis pipelines.
//!
//! Each pipeline is a pure function over the reconstructed tracking sequence
//! (and, for some, the raw accelerometer). A pipeline that cannot produce a
//! trustworthy estimate returns `None` and simply takes no weight in the
//! final score; it never guesses.

pub mod cognitive;
pub mod cross_axis;
pub mod min_jerk;
pub mod one_over_f;
pub mod pulse_response;
pub mod signal_noise;
pub mod transfer_fn;
pub mod tremor;

use crate::challenge::Probe;
use crate::types::AccelSample;

/// One pointer sample with its reconstructed ground truth. `t` is wall time
/// for standalone sessions and cumulative hover time for embed sessions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackingSample {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub pert_x: f64,
    pub pert_y: f64,
}

impl TrackingSample {
    pub fn error_x(&self) -> f64 {
        self.x - self.target_x
    }

    pub fn error_mag(&self) -> f64 {
        let dx = self.x - self.target_x;
        let dy = self.y - self.target_y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A pulse on the analysis time axis (same axis as `TrackingSample::t`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseWindow {
    pub index: usize,
    pub start_ms: f64,
    pub amp_x: f64,
    pub amp_y: f64,
    pub hold_ms: f64,
    pub return_ms: f64,
}

/// A cognitive flash on the analysis time axis.
#[derive(Clone, Debug)]
pub struct FlashWindow {
    pub at_ms: f64,
    pub is_target: bool,
}

#[derive(Clone, Debug, Default)]
pub struct AnalysisReport {
    pub transfer: Option<transfer_fn::TransferFnFeatures>,
    pub cursor_tremor: Option<tremor::TremorFeatures>,
    pub accel_tremor: Option<tremor::TremorFeatures>,
    pub one_over_f: Option<one_over_f::OneOverFFeatures>,
    pub signal_noise: Option<signal_noise::SignalNoiseFeatures>,
    pub cross_axis: Option<cross_axis::CrossAxisFeatures>,
    pub pulse_response: Option<pulse_response::PulseResponseFeatures>,
    pub cognitive: Option<cognitive::CognitiveFeatures>,
    pub min_jerk: Option<min_jerk::MinJerkFeatures>,
    pub sample_rate_hz: f64,
    pub sample_count: usize,
}

pub struct AnalysisInput<'a> {
    pub samples: &'a [TrackingSample],
    pub accel: Option<&'a [AccelSample]>,
    pub probes: &'a [Probe],
    pub pulses: &'a [PulseWindow],
    pub flashes: &'a [FlashWindow],
    pub cog_answer: Option<i64>,
    pub true_target_count: Option<usize>,
}

/// Run every pipeline over the input. Pulse traces produced by the latency
/// pipeline feed the minimum-jerk fit.
pub fn run(input: &AnalysisInput<'_>) -> AnalysisReport {
    let ts: Vec<f64> = input.samples.iter().map(|s| s.t).collect();
    let sample_rate_hz = crate::dsp::estimate_sample_rate_hz(&ts);

    let (pulse_features, pulse_traces) = pulse_response::analyze(input.samples, input.pulses);

    // Pulse transients are excluded from the tremor estimate.
    let tremor_masks: Vec<(f64, f64)> = input
        .pulses
        .iter()
        .map(|p| {
            (
                p.start_ms - 200.0,
                p.start_ms + p.hold_ms + p.return_ms + 400.0,
            )
        })
        .collect();

    AnalysisReport {
        transfer: transfer_fn::analyze(input.samples, input.probes, sample_rate_hz),
        cursor_tremor: tremor::analyze_cursor(input.samples, sample_rate_hz, &tremor_masks),
        accel_tremor: input.accel.and_then(tremor::analyze_accel),
        one_over_f: one_over_f::analyze(input.samples, sample_rate_hz),
        signal_noise: signal_noise::analyze(input.samples),
        cross_axis: cross_axis::analyze(input.samples, input.pulses),
        pulse_response: pulse_features,
        cognitive: cognitive::analyze(
            input.samples,
            input.flashes,
            input.cog_answer,
            input.true_target_count,
        ),
        min_jerk: min_jerk::analyze(&pulse_traces),
        sample_rate_hz,
        sample_count: input.samples.len(),
    }
}
