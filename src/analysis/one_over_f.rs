//! 1/f structure of the tracking-error velocity.
//!
//! Biological motor noise has a power spectrum falling roughly as 1/f^a
//! with a between 0 and 2.5; scripted controllers tend to produce flat or
//! rising spectra.

use super::TrackingSample;
use crate::dsp::{forward_velocity, linear_regression, psd, resample_uniform};

const MIN_SAMPLES: usize = 128;
const FIT_MIN_HZ: f64 = 0.3;
const MIN_FIT_POINTS: usize = 8;

#[derive(Clone, Copy, Debug)]
pub struct OneOverFFeatures {
    pub slope: f64,
    pub r_squared: f64,
}

pub fn analyze(samples: &[TrackingSample], sample_rate_hz: f64) -> Option<OneOverFFeatures> {
    if samples.len() < MIN_SAMPLES || sample_rate_hz <= 0.0 {
        return None;
    }
    let rate = sample_rate_hz.clamp(10.0, 250.0);

    let ts: Vec<f64> = samples.iter().map(|s| s.t).collect();
    let errs: Vec<f64> = samples.iter().map(|s| s.error_x()).collect();
    let (grid, err_u) = resample_uniform(&ts, &errs, rate);
    if err_u.len() < MIN_SAMPLES {
        return None;
    }

    let vel: Vec<f64> = forward_velocity(&grid, &err_u).into_iter().map(|(_, v)| v).collect();
    let spectrum = psd(&vel, rate);

    let hi = rate / 4.0;
    let mut log_f = Vec::new();
    let mut log_p = Vec::new();
    for (f, p) in spectrum.freqs.iter().zip(spectrum.power.iter()) {
        if *f >= FIT_MIN_HZ && *f <= hi && *p > 0.0 {
            log_f.push(f.log10());
            log_p.push(p.log10());
        }
    }
    if log_f.len() < MIN_FIT_POINTS {
        return None;
    }

    let fit = linear_regression(&log_f, &log_p)?;
    Some(OneOverFFeatures {
        slope: fit.slope,
        r_squared: fit.r_squared,
    })
}
