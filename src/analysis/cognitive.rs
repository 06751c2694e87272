//! Cognitive-motor interference around the flash schedule.
//!
//! Attending to a target flash steals resources from the tracking loop and
//! briefly inflates the position error; distractor flashes should not.
//! The reported count is compared against the true target count, which the
//! client never receives.

use super::{FlashWindow, TrackingSample};
use crate::dsp::mean;

const PRE_LO_MS: f64 = -500.0;
const POST_LO_MS: f64 = 200.0;
const POST_HI_MS: f64 = 700.0;
const MIN_BASELINE: f64 = 1e-6;

#[derive(Clone, Copy, Debug)]
pub struct CognitiveFeatures {
    /// Mean fractional error increase across target flashes.
    pub target_effect: f64,
    /// Same across distractor flashes.
    pub nontarget_effect: f64,
    /// target_effect - nontarget_effect.
    pub attention_effect: f64,
    pub true_count: usize,
    pub answer: Option<i64>,
}

pub fn analyze(
    samples: &[TrackingSample],
    flashes: &[FlashWindow],
    answer: Option<i64>,
    true_count: Option<usize>,
) -> Option<CognitiveFeatures> {
    if flashes.is_empty() {
        return None;
    }

    let mut target_effects = Vec::new();
    let mut nontarget_effects = Vec::new();

    for flash in flashes {
        let window_mean = |lo: f64, hi: f64| -> Option<f64> {
            let errs: Vec<f64> = samples
                .iter()
                .filter(|s| s.t >= flash.at_ms + lo && s.t < flash.at_ms + hi)
                .map(TrackingSample::error_mag)
                .collect();
            (!errs.is_empty()).then(|| mean(&errs))
        };

        let Some(pre) = window_mean(PRE_LO_MS, 0.0) else {
            continue;
        };
        let Some(post) = window_mean(POST_LO_MS, POST_HI_MS) else {
            continue;
        };
        if pre <= MIN_BASELINE {
            continue;
        }

        let effect = (post - pre) / pre;
        if flash.is_target {
            target_effects.push(effect);
        } else {
            nontarget_effects.push(effect);
        }
    }

    if target_effects.is_empty() || nontarget_effects.is_empty() {
        return None;
    }
    let target_effect = mean(&target_effects);
    let nontarget_effect = mean(&nontarget_effects);
    Some(CognitiveFeatures {
        target_effect,
        nontarget_effect,
        attention_effect: target_effect - nontarget_effect,
        true_count: true_count.unwrap_or(0),
        answer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flash(at_ms: f64, is_target: bool) -> FlashWindow {
        FlashWindow { at_ms, is_target }
    }

    /// Error baseline of 2 px, inflated by 60% for 500 ms starting 200 ms
    /// after each target flash.
    fn samples_with_interference(target_times: &[f64]) -> Vec<TrackingSample> {
        (0..3_000)
            .map(|i| {
                let t = i as f64 * 10.0;
                let mut err = 2.0;
                for &ft in target_times {
                    if t >= ft + 200.0 && t < ft + 700.0 {
                        err = 3.2;
                    }
                }
                TrackingSample {
                    t,
                    x: 100.0 + err,
                    y: 0.0,
                    target_x: 100.0,
                    target_y: 0.0,
                    pert_x: 0.0,
                    pert_y: 0.0,
                }
            })
            .collect()
    }

    #[test]
    fn target_flashes_show_an_attention_effect() {
        let samples = samples_with_interference(&[5_000.0, 12_000.0]);
        let flashes = [
            flash(5_000.0, true),
            flash(12_000.0, true),
            flash(8_000.0, false),
            flash(20_000.0, false),
        ];
        let f = analyze(&samples, &flashes, Some(2), Some(2)).unwrap();
        assert!((f.target_effect - 0.6).abs() < 0.05, "target {}", f.target_effect);
        assert!(f.nontarget_effect.abs() < 0.05, "nontarget {}", f.nontarget_effect);
        assert!(f.attention_effect > 0.5);
        assert_eq!(f.true_count, 2);
        assert_eq!(f.answer, Some(2));
    }

    #[test]
    fn zero_baseline_error_is_insufficient() {
        let samples: Vec<TrackingSample> = (0..2_000)
            .map(|i| TrackingSample {
                t: i as f64 * 10.0,
                x: 100.0,
                y: 0.0,
                target_x: 100.0,
                target_y: 0.0,
                pert_x: 0.0,
                pert_y: 0.0,
            })
            .collect();
        let flashes = [flash(5_000.0, true), flash(8_000.0, false)];
        assert!(analyze(&samples, &flashes, None, Some(1)).is_none());
    }

    #[test]
    fn no_flashes_is_insufficient() {
        assert!(analyze(&[], &[], None, None).is_none());
    }
}
