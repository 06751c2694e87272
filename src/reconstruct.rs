//! Server-authoritative target reconstruction.
//!
//! Clients report raw pointer positions only; the target and perturbation
//! they were tracking at any timestamp is rebuilt here from server-held
//! challenge parameters. The computation is pure f64 arithmetic, so repeated
//! evaluation at the same inputs is bit-identical on both sides of a replay.

use crate::challenge::{EmbedParams, Pulse, StandaloneParams};
use crate::types::{Canvas, Phases};
use std::f64::consts::TAU;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReconstructedPoint {
    pub target_x: f64,
    pub target_y: f64,
    pub pert_x: f64,
    pub pert_y: f64,
    pub is_pulse: bool,
    pub pulse_idx: Option<usize>,
}

/// Envelope of a pulse at `dt` ms after its start: full amplitude through
/// the hold, then a quadratic ease-out over the return window.
pub fn pulse_envelope(dt: f64, hold_ms: f64, return_ms: f64) -> f64 {
    if dt < 0.0 {
        0.0
    } else if dt < hold_ms {
        1.0
    } else if dt < hold_ms + return_ms {
        let frac = (dt - hold_ms) / return_ms;
        1.0 - frac * frac
    } else {
        0.0
    }
}

fn pulse_sum(pulses: &[Pulse], hold_ms: f64, return_ms: f64, rel_t: f64) -> (f64, f64, Option<usize>) {
    let mut px = 0.0;
    let mut py = 0.0;
    let mut active = None;
    for (i, pulse) in pulses.iter().enumerate() {
        let dt = rel_t - pulse.at_ms;
        let env = pulse_envelope(dt, hold_ms, return_ms);
        if env > 0.0 {
            px += pulse.amp_x * env;
            py += pulse.amp_y * env;
            active = Some(i);
        }
    }
    (px, py, active)
}

fn probe_sum(elapsed_s: f64, probes: &[crate::challenge::Probe]) -> (f64, f64) {
    let mut px = 0.0;
    let mut py = 0.0;
    for probe in probes {
        let phase = TAU * probe.freq_hz * elapsed_s;
        px += probe.amp_x * phase.sin();
        py += probe.amp_y * (phase + probe.phase_offset).sin();
    }
    (px, py)
}

/// Reconstruct the standalone target at wall time `t` (ms since navigation
/// start). Samples before the tracking phase return `None` and are dropped
/// from analysis.
pub fn standalone(
    params: &StandaloneParams,
    phases: &Phases,
    canvas: &Canvas,
    t: f64,
) -> Option<ReconstructedPoint> {
    if t < phases.tracking_start {
        return None;
    }

    // The path keeps advancing through the dualtask phase as if tracking had
    // run its full configured duration.
    let path_time = if t < phases.dualtask_start {
        t - phases.tracking_start
    } else {
        params.tracking_ms + (t - phases.dualtask_start)
    };

    let cx = canvas.width / 2.0;
    let cy = canvas.height / 2.0;
    let ax = canvas.width * params.path.padding;
    let ay = canvas.height * params.path.padding;

    let smooth_x = cx + ax * (TAU * params.path.freq_x * path_time / 1000.0 + params.path.phase).sin();
    let smooth_y = cy + ay * (TAU * params.path.freq_y * path_time / 1000.0).sin();

    let elapsed_s = (t - phases.tracking_start) / 1000.0;
    let (probe_x, probe_y) = probe_sum(elapsed_s, &params.probes);

    let rel_t = t - phases.tracking_start;
    let (pulse_x, pulse_y, pulse_idx) =
        pulse_sum(&params.pulses, params.pulse_hold_ms, params.pulse_return_ms, rel_t);

    let pert_x = probe_x + pulse_x;
    let pert_y = probe_y + pulse_y;
    Some(ReconstructedPoint {
        target_x: smooth_x + pert_x,
        target_y: smooth_y + pert_y,
        pert_x,
        pert_y,
        is_pulse: pulse_idx.is_some(),
        pulse_idx,
    })
}

/// Reconstruct the embed perturbation at cumulative hover time `hover_t`.
/// There is no smooth path in embed mode; the caller anchors the result to
/// the hovered element's rect.
pub fn embed(params: &EmbedParams, hover_t: f64) -> ReconstructedPoint {
    let (probe_x, probe_y) = probe_sum(hover_t / 1000.0, &params.probes);
    let (pulse_x, pulse_y, pulse_idx) =
        pulse_sum(&params.pulses, params.pulse_hold_ms, params.pulse_return_ms, hover_t);

    let pert_x = probe_x + pulse_x;
    let pert_y = probe_y + pulse_y;
    ReconstructedPoint {
        target_x: pert_x,
        target_y: pert_y,
        pert_x,
        pert_y,
        is_pulse: pulse_idx.is_some(),
        pulse_idx,
    }
}
