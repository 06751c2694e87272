//! Signal-dependent noise: biological motor noise grows with movement
//! speed. Sliding windows correlate mean speed against the spread of the
//! position error.

use super::TrackingSample;
use crate::dsp::{linear_regression, mean, pearson, population_std};

const WINDOW: usize = 15;
const STEP: usize = WINDOW / 2;
const MIN_WINDOWS: usize = 6;
const MIN_MEAN_SPEED: f64 = 10.0;

#[derive(Clone, Copy, Debug)]
pub struct SignalNoiseFeatures {
    pub correlation: f64,
    pub slope: f64,
    pub window_count: usize,
}

pub fn analyze(samples: &[TrackingSample]) -> Option<SignalNoiseFeatures> {
    if samples.len() < WINDOW * 2 {
        return None;
    }

    let mut speeds = Vec::new();
    let mut spreads = Vec::new();

    let mut start = 0usize;
    while start + WINDOW <= samples.len() {
        let win = &samples[start..start + WINDOW];
        start += STEP;

        let mut seg_speeds = Vec::with_capacity(WINDOW - 1);
        for pair in win.windows(2) {
            let dt = pair[1].t - pair[0].t;
            if dt <= 0.0 {
                continue;
            }
            let dx = pair[1].x - pair[0].x;
            let dy = pair[1].y - pair[0].y;
            seg_speeds.push((dx * dx + dy * dy).sqrt() / (dt / 1000.0));
        }
        if seg_speeds.is_empty() {
            continue;
        }
        let mean_speed = mean(&seg_speeds);
        if mean_speed <= MIN_MEAN_SPEED {
            continue;
        }

        let errors: Vec<f64> = win.iter().map(TrackingSample::error_mag).collect();
        speeds.push(mean_speed);
        spreads.push(population_std(&errors));
    }

    if speeds.len() < MIN_WINDOWS {
        return None;
    }
    let correlation = pearson(&speeds, &spreads)?;
    let slope = linear_regression(&speeds, &spreads)?.slope;
    Some(SignalNoiseFeatures {
        correlation,
        slope,
        window_count: speeds.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lcg(state: &mut u64) -> f64 {
        *state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((*state >> 11) as f64 / (1u64 << 53) as f64) - 0.5
    }

    /// Noise amplitude proportional to speed yields a strong positive
    /// correlation between window speed and error spread.
    #[test]
    fn speed_scaled_noise_correlates() {
        let mut state = 7u64;
        let samples: Vec<TrackingSample> = (0..600)
            .map(|i| {
                let t = i as f64 * 10.0;
                // Speed sweeps slowly between ~20 and ~380 px/s.
                let speed = 200.0 + 180.0 * (t / 6000.0 * std::f64::consts::TAU).sin();
                let target_x = speed * t / 1000.0 * 0.5;
                let noise = lcg(&mut state) * (0.2 + speed * 0.02);
                TrackingSample {
                    t,
                    x: target_x + noise,
                    y: 0.0,
                    target_x,
                    target_y: 0.0,
                    pert_x: 0.0,
                    pert_y: 0.0,
                }
            })
            .collect();

        let f = analyze(&samples).unwrap();
        assert!(f.correlation > 0.3, "correlation {}", f.correlation);
        assert!(f.slope > 0.0);
    }

    #[test]
    fn stationary_pointer_is_insufficient() {
        let samples: Vec<TrackingSample> = (0..600)
            .map(|i| TrackingSample {
                t: i as f64 * 10.0,
                x: 100.0,
                y: 100.0,
                target_x: 100.0,
                target_y: 100.0,
                pert_x: 0.0,
                pert_y: 0.0,
            })
            .collect();
        assert!(analyze(&samples).is_none());
    }
}
