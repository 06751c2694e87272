//! Minimum-jerk fit of the pulse corrections.
//!
//! Point-to-point limb reaches follow the quintic blend
//! x(tau) = x0 + (xf - x0)(10 tau^3 - 15 tau^4 + 6 tau^5). The correction
//! segment between onset and peak is compared against that profile; servo
//! controllers and replay scripts fit it poorly.

use super::pulse_response::PulseTrace;
use crate::dsp::mean;

const MIN_FIT_SAMPLES: usize = 4;
const MIN_DURATION_MS: f64 = 30.0;

#[derive(Clone, Copy, Debug)]
pub struct MinJerkFeatures {
    pub mean_r_squared: f64,
    pub fitted_count: usize,
}

pub fn minimum_jerk_blend(tau: f64) -> f64 {
    let t3 = tau * tau * tau;
    10.0 * t3 - 15.0 * t3 * tau + 6.0 * t3 * tau * tau
}

pub fn analyze(traces: &[PulseTrace]) -> Option<MinJerkFeatures> {
    let mut fits = Vec::new();

    for trace in traces {
        let t0 = trace.latency_ms;
        let t1 = trace.peak_time_ms;
        if t1 - t0 < MIN_DURATION_MS {
            continue;
        }

        let mut seg_t = Vec::new();
        let mut seg_c = Vec::new();
        for (t, c) in trace.times_ms.iter().zip(trace.corrections.iter()) {
            if *t >= t0 && *t <= t1 {
                seg_t.push(*t);
                seg_c.push(*c);
            }
        }
        if seg_t.len() < MIN_FIT_SAMPLES {
            continue;
        }

        let x0 = seg_c[0];
        let xf = seg_c[seg_c.len() - 1];
        let span = t1 - t0;

        let mean_c = mean(&seg_c);
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        for (t, c) in seg_t.iter().zip(seg_c.iter()) {
            let tau = (t - t0) / span;
            let model = x0 + (xf - x0) * minimum_jerk_blend(tau);
            ss_res += (c - model) * (c - model);
            ss_tot += (c - mean_c) * (c - mean_c);
        }
        if ss_tot <= 0.0 {
            continue;
        }
        fits.push(1.0 - ss_res / ss_tot);
    }

    if fits.is_empty() {
        return None;
    }
    Some(MinJerkFeatures {
        mean_r_squared: mean(&fits),
        fitted_count: fits.len(),
    })
}
