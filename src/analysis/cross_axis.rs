//! Cross-axis coupling around pulses.
//!
//! Pulses displace the target along x only. A limb correcting along x drags
//! some y with it (wrist/arm geometry); a synthetic controller that mirrors
//! the x displacement produces no y response at all.

use super::{PulseWindow, TrackingSample};
use crate::dsp::{mean, population_std};

const WINDOW_MS: f64 = 400.0;
const MIN_DELTA_X: f64 = 2.0;
const MIN_PULSES: usize = 2;

#[derive(Clone, Copy, Debug)]
pub struct CrossAxisFeatures {
    pub mean_ratio: f64,
    pub std_ratio: f64,
    pub pulse_count: usize,
}

pub fn analyze(samples: &[TrackingSample], pulses: &[PulseWindow]) -> Option<CrossAxisFeatures> {
    let mut ratios = Vec::new();

    for pulse in pulses {
        let win: Vec<&TrackingSample> = samples
            .iter()
            .filter(|s| s.t >= pulse.start_ms && s.t < pulse.start_ms + WINDOW_MS)
            .collect();
        let (Some(first), Some(last)) = (win.first(), win.last()) else {
            continue;
        };
        if win.len() < 2 {
            continue;
        }
        let dx = last.x - first.x;
        let dy = last.y - first.y;
        if dx.abs() <= MIN_DELTA_X {
            continue;
        }
        ratios.push((dy / dx).abs());
    }

    if ratios.len() < MIN_PULSES {
        return None;
    }
    Some(CrossAxisFeatures {
        mean_ratio: mean(&ratios),
        std_ratio: population_std(&ratios),
        pulse_count: ratios.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse(index: usize, start_ms: f64) -> PulseWindow {
        PulseWindow {
            index,
            start_ms,
            amp_x: 20.0,
            amp_y: 0.0,
            hold_ms: 600.0,
            return_ms: 200.0,
        }
    }

    /// Cursor steps 20 px right shortly after each pulse start and returns
    /// after the hold; y comes from the caller.
    fn mirroring_samples(y_of: impl Fn(f64) -> f64) -> Vec<TrackingSample> {
        let stepped = |t: f64| (1050.0..1600.0).contains(&t) || (4050.0..4600.0).contains(&t);
        (0..800)
            .map(|i| {
                let t = i as f64 * 10.0;
                let x = if stepped(t) { 120.0 } else { 100.0 };
                TrackingSample {
                    t,
                    x,
                    y: y_of(t),
                    target_x: x,
                    target_y: 0.0,
                    pert_x: 0.0,
                    pert_y: 0.0,
                }
            })
            .collect()
    }

    #[test]
    fn zero_y_response_has_zero_coupling() {
        let samples = mirroring_samples(|_| 250.0);
        let f = analyze(&samples, &[pulse(0, 1000.0), pulse(1, 4000.0)]).unwrap();
        assert_eq!(f.mean_ratio, 0.0);
        assert_eq!(f.std_ratio, 0.0);
        assert_eq!(f.pulse_count, 2);
    }

    #[test]
    fn coupled_y_response_is_measured() {
        let samples = mirroring_samples(|t| {
            if (1050.0..1600.0).contains(&t) || (4050.0..4600.0).contains(&t) {
                256.0
            } else {
                250.0
            }
        });
        let f = analyze(&samples, &[pulse(0, 1000.0), pulse(1, 4000.0)]).unwrap();
        assert!((f.mean_ratio - 0.3).abs() < 0.05, "ratio {}", f.mean_ratio);
    }

    #[test]
    fn one_usable_pulse_is_insufficient() {
        let samples = mirroring_samples(|_| 250.0);
        assert!(analyze(&samples, &[pulse(0, 1000.0)]).is_none());
    }
}
