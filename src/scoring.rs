//! Sub-scoring and verdict aggregation.
//!
//! Every threshold and weight in here is server-secret; nothing in this
//! module is ever serialized toward a client beyond the final overall score
//! and verdict. The whole table lives in one [`ScoringPolicy`] value that
//! the engine owns, so threshold experiments touch exactly one place.

use crate::analysis::AnalysisReport;
use crate::types::{InputMethod, VerdictClass};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const VERDICT_BIOLOGICAL: &str = "BIOLOGICAL CONTROLLER DETECTED";
pub const VERDICT_UNCERTAIN: &str = "INSUFFICIENT EVIDENCE — UNCERTAIN";
pub const VERDICT_NON_BIOLOGICAL: &str = "NON-BIOLOGICAL CONTROLLER SUSPECTED";

/// Per-pipeline sub-score as persisted in the session log.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MetricScore {
    pub valid: bool,
    pub score: f64,
}

// Older log lines stored bare scalars; the aggregator still reads them.
impl<'de> Deserialize<'de> for MetricScore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Scalar(f64),
            Full { valid: bool, score: f64 },
        }
        Ok(match Wire::deserialize(deserializer)? {
            Wire::Scalar(score) => MetricScore { valid: true, score },
            Wire::Full { valid, score } => MetricScore { valid, score },
        })
    }
}

#[derive(Clone, Debug)]
pub struct Weights {
    pub transfer_fn: f64,
    pub tremor: f64,
    pub one_over_f: f64,
    pub signal_dep_noise: f64,
    pub cross_axis: f64,
    pub pulse_response: f64,
    pub cog_interference: f64,
    pub min_jerk: f64,
}

/// A sigmoid-windowed band: full credit inside [lo, hi], smooth shoulders
/// with the given steepness outside.
#[derive(Clone, Copy, Debug)]
pub struct Band {
    pub lo: f64,
    pub hi: f64,
    pub steepness: f64,
}

impl Band {
    pub fn score(&self, x: f64) -> f64 {
        sigmoid(self.steepness * (x - self.lo)) * sigmoid(self.steepness * (self.hi - x))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[derive(Clone, Debug)]
pub struct ScoringPolicy {
    pub weights: Weights,

    pub rolloff_credit: f64,
    pub delay_gate_ms: f64,
    pub delay_credit: f64,
    pub delay_plausible_credit: f64,

    pub tremor_ratio_norm: f64,
    pub tremor_peak_lo_hz: f64,
    pub tremor_peak_hi_hz: f64,
    pub tremor_peak_bonus: f64,

    pub slope_band: Band,

    pub noise_corr_norm: f64,

    pub cross_axis_touch_ideal_max: f64,
    pub cross_axis_touch_denom: f64,
    pub cross_axis_ideal_max: f64,
    pub cross_axis_denom: f64,

    pub latency_mean_band: Band,
    pub latency_std_band: Band,
    pub latency_mean_weight: f64,
    pub latency_std_weight: f64,

    pub cog_effect_norm: f64,
    pub cog_base_cap: f64,
    pub cog_attention_floor: f64,
    pub cog_attention_credit: f64,
    pub cog_answer_credit: f64,
    pub cog_close_answer_credit: f64,

    pub min_jerk_r2_norm: f64,

    pub biological_floor: f64,
    pub uncertain_floor: f64,
    pub embed_verified_floor: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            weights: Weights {
                transfer_fn: 3.0,
                tremor: 2.5,
                one_over_f: 2.0,
                signal_dep_noise: 2.5,
                cross_axis: 2.0,
                pulse_response: 3.0,
                cog_interference: 2.0,
                min_jerk: 1.5,
            },
            rolloff_credit: 0.7,
            delay_gate_ms: 50.0,
            delay_credit: 0.15,
            delay_plausible_credit: 0.15,
            tremor_ratio_norm: 0.015,
            tremor_peak_lo_hz: 7.0,
            tremor_peak_hi_hz: 13.0,
            tremor_peak_bonus: 0.2,
            slope_band: Band {
                lo: -2.5,
                hi: 0.0,
                steepness: 3.0,
            },
            noise_corr_norm: 0.4,
            cross_axis_touch_ideal_max: 8.0,
            cross_axis_touch_denom: 1.0,
            cross_axis_ideal_max: 2.0,
            cross_axis_denom: 0.3,
            latency_mean_band: Band {
                lo: 120.0,
                hi: 380.0,
                steepness: 0.05,
            },
            latency_std_band: Band {
                lo: 15.0,
                hi: 180.0,
                steepness: 0.08,
            },
            latency_mean_weight: 0.6,
            latency_std_weight: 0.4,
            cog_effect_norm: 0.3,
            cog_base_cap: 0.55,
            cog_attention_floor: 0.02,
            cog_attention_credit: 0.2,
            cog_answer_credit: 0.1,
            cog_close_answer_credit: 0.15,
            min_jerk_r2_norm: 0.6,
            biological_floor: 0.65,
            uncertain_floor: 0.35,
            embed_verified_floor: 0.60,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Scorecard {
    pub overall: f64,
    pub verdict_class: VerdictClass,
    pub verdict: String,
    pub metrics: BTreeMap<String, MetricScore>,
    pub valid_metric_count: usize,
}

impl ScoringPolicy {
    pub fn verdict_class(&self, overall: f64) -> VerdictClass {
        if overall >= self.biological_floor {
            VerdictClass::Biological
        } else if overall >= self.uncertain_floor {
            VerdictClass::Uncertain
        } else {
            VerdictClass::NonBiological
        }
    }

    pub fn score(&self, report: &AnalysisReport, input_method: InputMethod) -> Scorecard {
        let transfer = report.transfer.as_ref().map(|f| {
            let mut s = 0.0;
            if f.has_rolloff {
                s += self.rolloff_credit;
            }
            if f.mean_delay_ms.is_some_and(|d| d > self.delay_gate_ms) {
                s += self.delay_credit;
            }
            if f.delay_plausible {
                s += self.delay_plausible_credit;
            }
            s.min(1.0)
        });

        let tremor_sub = |f: &crate::analysis::tremor::TremorFeatures| {
            let base = (f.band_ratio / self.tremor_ratio_norm).min(1.0);
            let bonus = f
                .peak_freq_hz
                .is_some_and(|p| p >= self.tremor_peak_lo_hz && p <= self.tremor_peak_hi_hz)
                .then_some(self.tremor_peak_bonus)
                .unwrap_or(0.0);
            (base + bonus).min(1.0)
        };
        let tremor = match (&report.cursor_tremor, &report.accel_tremor) {
            (None, None) => None,
            (cursor, accel) => {
                let c = cursor.as_ref().map(&tremor_sub).unwrap_or(0.0);
                let a = accel.as_ref().map(&tremor_sub).unwrap_or(0.0);
                Some(c.max(a))
            }
        };

        let one_over_f = report.one_over_f.as_ref().map(|f| self.slope_band.score(f.slope));

        let signal_noise = report
            .signal_noise
            .as_ref()
            .map(|f| (f.correlation / self.noise_corr_norm).clamp(0.0, 1.0));

        let cross_axis = report.cross_axis.as_ref().map(|f| {
            let (ideal_max, denom) = if input_method == InputMethod::Touch {
                (self.cross_axis_touch_ideal_max, self.cross_axis_touch_denom)
            } else {
                (self.cross_axis_ideal_max, self.cross_axis_denom)
            };
            let base = (f.mean_ratio / denom).min(1.0);
            if f.mean_ratio < ideal_max {
                base
            } else {
                base * 0.5
            }
        });

        let pulse = report.pulse_response.as_ref().map(|f| {
            self.latency_mean_weight * self.latency_mean_band.score(f.latency_mean_ms)
                + self.latency_std_weight * self.latency_std_band.score(f.latency_std_ms)
        });

        let cognitive = report.cognitive.as_ref().map(|f| {
            let effect = f.target_effect.max(f.nontarget_effect);
            let mut s = self.cog_base_cap * (effect / self.cog_effect_norm).clamp(0.0, 1.0);
            if f.attention_effect > self.cog_attention_floor {
                s += self.cog_attention_credit;
            }
            if f.answer.is_some() {
                s += self.cog_answer_credit;
            }
            if f
                .answer
                .is_some_and(|a| (a - f.true_count as i64).abs() <= 1)
            {
                s += self.cog_close_answer_credit;
            }
            s.min(1.0)
        });

        let min_jerk = report
            .min_jerk
            .as_ref()
            .map(|f| (f.mean_r_squared / self.min_jerk_r2_norm).clamp(0.0, 1.0));

        let entries: [(&str, f64, Option<f64>); 8] = [
            ("transferFn", self.weights.transfer_fn, transfer),
            ("tremor", self.weights.tremor, tremor),
            ("oneOverF", self.weights.one_over_f, one_over_f),
            ("signalDepNoise", self.weights.signal_dep_noise, signal_noise),
            ("crossAxis", self.weights.cross_axis, cross_axis),
            ("pulseResponse", self.weights.pulse_response, pulse),
            ("cogInterference", self.weights.cog_interference, cognitive),
            ("minJerk", self.weights.min_jerk, min_jerk),
        ];

        let mut metrics = BTreeMap::new();
        let mut weighted = 0.0;
        let mut weight_sum = 0.0;
        let mut valid_metric_count = 0;
        for (name, weight, sub) in entries {
            match sub {
                Some(score) => {
                    weighted += weight * score;
                    weight_sum += weight;
                    valid_metric_count += 1;
                    metrics.insert(name.to_string(), MetricScore { valid: true, score });
                }
                None => {
                    metrics.insert(
                        name.to_string(),
                        MetricScore {
                            valid: false,
                            score: 0.0,
                        },
                    );
                }
            }
        }

        let overall = if weight_sum > 0.0 { weighted / weight_sum } else { 0.0 };
        let verdict_class = self.verdict_class(overall);
        let verdict = match verdict_class {
            VerdictClass::Biological => VERDICT_BIOLOGICAL,
            VerdictClass::Uncertain => VERDICT_UNCERTAIN,
            VerdictClass::NonBiological => VERDICT_NON_BIOLOGICAL,
        };

        Scorecard {
            overall,
            verdict_class,
            verdict: verdict.to_string(),
            metrics,
            valid_metric_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::pulse_response::PulseResponseFeatures;
    use crate::analysis::transfer_fn::TransferFnFeatures;
    use crate::analysis::tremor::TremorFeatures;

    #[test]
    fn verdict_thresholds_are_inclusive() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.verdict_class(0.64), VerdictClass::Uncertain);
        assert_eq!(policy.verdict_class(0.65), VerdictClass::Biological);
        assert_eq!(policy.verdict_class(0.35), VerdictClass::Uncertain);
        assert_eq!(policy.verdict_class(0.34), VerdictClass::NonBiological);
    }

    #[test]
    fn empty_report_scores_zero_with_no_valid_metrics() {
        let policy = ScoringPolicy::default();
        let card = policy.score(&AnalysisReport::default(), InputMethod::Mouse);
        assert_eq!(card.overall, 0.0);
        assert_eq!(card.valid_metric_count, 0);
        assert_eq!(card.verdict_class, VerdictClass::NonBiological);
        assert_eq!(card.metrics.len(), 8);
        assert!(card.metrics.values().all(|m| !m.valid));
    }

    #[test]
    fn transfer_sub_score_composes_rolloff_and_delay() {
        let policy = ScoringPolicy::default();
        let mut report = AnalysisReport::default();
        report.transfer = Some(TransferFnFeatures {
            has_rolloff: true,
            mean_delay_ms: Some(210.0),
            delay_plausible: true,
            coherent_probe_count: 5,
            responses: vec![],
        });
        let card = policy.score(&report, InputMethod::Mouse);
        let m = &card.metrics["transferFn"];
        assert!(m.valid);
        assert!((m.score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tremor_takes_the_better_of_cursor_and_accel() {
        let policy = ScoringPolicy::default();
        let mut report = AnalysisReport::default();
        report.cursor_tremor = Some(TremorFeatures {
            band_ratio: 0.003,
            peak_freq_hz: Some(4.0),
        });
        report.accel_tremor = Some(TremorFeatures {
            band_ratio: 0.012,
            peak_freq_hz: Some(10.0),
        });
        let card = policy.score(&report, InputMethod::Mouse);
        let m = &card.metrics["tremor"];
        // accel: min(1, 0.012/0.015) + 0.2 bonus = 1.0 capped.
        assert!((m.score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn slope_band_is_high_inside_and_low_outside() {
        let policy = ScoringPolicy::default();
        assert!(policy.slope_band.score(-1.2) > 0.9);
        assert!(policy.slope_band.score(1.5) < 0.05);
        assert!(policy.slope_band.score(-4.0) < 0.05);
    }

    #[test]
    fn pulse_sub_score_prefers_human_latency_statistics() {
        let policy = ScoringPolicy::default();
        let human = PulseResponseFeatures {
            latency_mean_ms: 230.0,
            latency_std_ms: 60.0,
            overshoot_mean: 0.1,
            detected_count: 5,
        };
        let machine = PulseResponseFeatures {
            latency_mean_ms: 80.0,
            latency_std_ms: 0.5,
            overshoot_mean: 0.0,
            detected_count: 5,
        };
        let mut report = AnalysisReport::default();
        report.pulse_response = Some(human);
        let human_score = policy.score(&report, InputMethod::Mouse).metrics["pulseResponse"].score;
        report.pulse_response = Some(machine);
        let machine_score = policy.score(&report, InputMethod::Mouse).metrics["pulseResponse"].score;
        assert!(human_score > 0.85, "human {human_score}");
        assert!(machine_score < 0.3, "machine {machine_score}");
    }

    #[test]
    fn aggregate_is_weight_normalized_over_valid_pipelines() {
        let policy = ScoringPolicy::default();
        let mut report = AnalysisReport::default();
        report.transfer = Some(TransferFnFeatures {
            has_rolloff: true,
            mean_delay_ms: Some(210.0),
            delay_plausible: true,
            coherent_probe_count: 5,
            responses: vec![],
        });
        report.cursor_tremor = Some(TremorFeatures {
            band_ratio: 0.015,
            peak_freq_hz: Some(9.0),
        });
        // transfer 1.0 (w 3.0) + tremor 1.0 (w 2.5), nothing else valid.
        let card = policy.score(&report, InputMethod::Mouse);
        assert!((card.overall - 1.0).abs() < 1e-12);
        assert_eq!(card.valid_metric_count, 2);
        assert_eq!(card.verdict_class, VerdictClass::Biological);
    }

    #[test]
    fn metric_score_deserializes_from_bare_scalars() {
        let m: MetricScore = serde_json::from_str("0.75").unwrap();
        assert!(m.valid);
        assert!((m.score - 0.75).abs() < 1e-12);
        let m: MetricScore = serde_json::from_str(r#"{"valid":false,"score":0.0}"#).unwrap();
        assert!(!m.valid);
    }
}
