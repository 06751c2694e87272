//! Physiological tremor detection, 8-12 Hz band.
//!
//! Pulse transients are masked out of the cursor estimate: a target step
//! answered (or mirrored) within a frame or two is broadband and would
//! otherwise swamp the tremor band.

use super::TrackingSample;
use crate::dsp::{estimate_sample_rate_hz, moving_average, psd, resample_uniform};
use crate::types::AccelSample;

const CURSOR_MAX_RATE_HZ: f64 = 120.0;
const ACCEL_MAX_RATE_HZ: f64 = 100.0;
const ACCEL_MIN_RATE_HZ: f64 = 20.0;
const MIN_SAMPLES: usize = 64;
const MIN_SPAN_MS: f64 = 2_000.0;

#[derive(Clone, Copy, Debug)]
pub struct TremorFeatures {
    /// Share of >1 Hz power concentrated in the 8-12 Hz band.
    pub band_ratio: f64,
    /// Strongest frequency above 1 Hz.
    pub peak_freq_hz: Option<f64>,
}

/// Band-ratio of a magnitude series sampled at `rate`: detrend with a
/// moving average (window = rate / 3), then compare 8-12 Hz power against
/// everything above 1 Hz.
fn band_ratio(series: &[f64], rate_hz: f64) -> Option<TremorFeatures> {
    band_ratio_masked(series, rate_hz, &[], &[])
}

/// `masked` holds time intervals (same axis as the samples) whose speed
/// content is excluded, typically the pulse transient windows.
pub fn analyze_cursor(
    samples: &[TrackingSample],
    sample_rate_hz: f64,
    masked: &[(f64, f64)],
) -> Option<TremorFeatures> {
    if samples.len() < MIN_SAMPLES || sample_rate_hz <= 0.0 {
        return None;
    }
    let span = samples[samples.len() - 1].t - samples[0].t;
    if span < MIN_SPAN_MS {
        return None;
    }
    let rate = sample_rate_hz.min(CURSOR_MAX_RATE_HZ);

    let ts: Vec<f64> = samples.iter().map(|s| s.t).collect();
    let xs: Vec<f64> = samples.iter().map(|s| s.x).collect();
    let ys: Vec<f64> = samples.iter().map(|s| s.y).collect();
    let (grid, xu) = resample_uniform(&ts, &xs, rate);
    let (_, yu) = resample_uniform(&ts, &ys, rate);
    if xu.len() < MIN_SAMPLES {
        return None;
    }

    let dt_s = 1.0 / rate;
    let speeds: Vec<f64> = xu
        .windows(2)
        .zip(yu.windows(2))
        .map(|(xw, yw)| {
            let vx = (xw[1] - xw[0]) / dt_s;
            let vy = (yw[1] - yw[0]) / dt_s;
            (vx * vx + vy * vy).sqrt()
        })
        .collect();

    band_ratio_masked(&speeds, rate, &grid, masked)
}

fn band_ratio_masked(
    series: &[f64],
    rate_hz: f64,
    grid: &[f64],
    masked: &[(f64, f64)],
) -> Option<TremorFeatures> {
    if series.len() < MIN_SAMPLES {
        return None;
    }
    let window = (rate_hz / 3.0).round().max(1.0) as usize;
    let trend = moving_average(series, window);
    let mut residual: Vec<f64> = series.iter().zip(trend.iter()).map(|(v, m)| v - m).collect();
    if !masked.is_empty() {
        for (i, r) in residual.iter_mut().enumerate() {
            let Some(t) = grid.get(i) else { break };
            if masked.iter().any(|(lo, hi)| t >= lo && t <= hi) {
                *r = 0.0;
            }
        }
    }

    let spectrum = psd(&residual, rate_hz);
    let broad = spectrum.band_power(1.0 + 1e-9, rate_hz);
    if broad <= 0.0 {
        return None;
    }
    let band = spectrum.band_power(8.0, 12.0);
    Some(TremorFeatures {
        band_ratio: band / broad,
        peak_freq_hz: spectrum.peak_above(1.0),
    })
}

pub fn analyze_accel(samples: &[AccelSample]) -> Option<TremorFeatures> {
    if samples.len() < MIN_SAMPLES {
        return None;
    }
    // Rate estimated from the leading samples only; motion events can thin
    // out when a page is backgrounded.
    let head = &samples[..samples.len().min(500)];
    let ts_head: Vec<f64> = head.iter().map(|s| s.t).collect();
    let native_rate = estimate_sample_rate_hz(&ts_head);
    if native_rate < ACCEL_MIN_RATE_HZ {
        return None;
    }
    let rate = native_rate.min(ACCEL_MAX_RATE_HZ);

    let ts: Vec<f64> = samples.iter().map(|s| s.t).collect();
    let mags: Vec<f64> = samples
        .iter()
        .map(|s| (s.ax * s.ax + s.ay * s.ay + s.az * s.az).sqrt())
        .collect();
    let (_, mu) = resample_uniform(&ts, &mags, rate);
    band_ratio(&mu, rate)
}
