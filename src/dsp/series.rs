/// Piecewise-linear resampling from irregular timestamps (ms) onto a uniform
/// grid at `rate_hz`. The grid starts at the first input timestamp and ends
/// at the last; step is `1000 / rate_hz` ms. Returns (grid_ts, values).
pub fn resample_uniform(ts: &[f64], vs: &[f64], rate_hz: f64) -> (Vec<f64>, Vec<f64>) {
    let n = ts.len().min(vs.len());
    if n < 2 || rate_hz <= 0.0 {
        return (Vec::new(), Vec::new());
    }
    let start = ts[0];
    let end = ts[n - 1];
    let step = 1000.0 / rate_hz;
    if end <= start {
        return (Vec::new(), Vec::new());
    }

    let count = ((end - start) / step).floor() as usize + 1;
    let mut grid = Vec::with_capacity(count);
    let mut out = Vec::with_capacity(count);

    let mut seg = 0usize;
    for k in 0..count {
        let t = start + k as f64 * step;
        while seg + 2 < n && ts[seg + 1] <= t {
            seg += 1;
        }
        let (t0, t1) = (ts[seg], ts[seg + 1]);
        let (v0, v1) = (vs[seg], vs[seg + 1]);
        let v = if t1 > t0 {
            let frac = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
            v0 + (v1 - v0) * frac
        } else {
            v1
        };
        grid.push(t);
        out.push(v);
    }
    (grid, out)
}

/// Forward-difference velocity in units/second over timestamps in ms.
/// Segments with non-positive dt are skipped; output pairs (t, v) are
/// stamped at the segment start.
pub fn forward_velocity(ts: &[f64], vs: &[f64]) -> Vec<(f64, f64)> {
    let n = ts.len().min(vs.len());
    let mut out = Vec::with_capacity(n.saturating_sub(1));
    for i in 0..n.saturating_sub(1) {
        let dt = ts[i + 1] - ts[i];
        if dt <= 0.0 {
            continue;
        }
        out.push((ts[i], (vs[i + 1] - vs[i]) / (dt / 1000.0)));
    }
    out
}

/// Centered moving average with clamped edges; output has the input length.
pub fn moving_average(vs: &[f64], window: usize) -> Vec<f64> {
    let n = vs.len();
    let w = window.max(1);
    let half = w / 2;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(n);
        let sum: f64 = vs[lo..hi].iter().sum();
        out.push(sum / (hi - lo) as f64);
    }
    out
}

/// Mean sample rate in Hz implied by a span of millisecond timestamps.
pub fn estimate_sample_rate_hz(ts: &[f64]) -> f64 {
    if ts.len() < 2 {
        return 0.0;
    }
    let span = ts[ts.len() - 1] - ts[0];
    if span <= 0.0 {
        return 0.0;
    }
    (ts.len() - 1) as f64 / span * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_reproduces_a_line_exactly() {
        let ts = [0.0, 7.0, 13.0, 29.0, 40.0];
        let vs: Vec<f64> = ts.iter().map(|t| 3.0 * t + 1.0).collect();
        let (grid, out) = resample_uniform(&ts, &vs, 100.0);
        assert_eq!(grid.len(), 5);
        for (t, v) in grid.iter().zip(out.iter()) {
            assert!((v - (3.0 * t + 1.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn resample_grid_spacing_matches_rate() {
        let ts: Vec<f64> = (0..50).map(|i| i as f64 * 16.7).collect();
        let vs = vec![1.0; 50];
        let (grid, _) = resample_uniform(&ts, &vs, 60.0);
        for pair in grid.windows(2) {
            assert!((pair[1] - pair[0] - 1000.0 / 60.0).abs() < 1e-9);
        }
    }

    #[test]
    fn velocity_skips_non_positive_dt() {
        let ts = [0.0, 10.0, 10.0, 20.0];
        let vs = [0.0, 1.0, 5.0, 6.0];
        let v = forward_velocity(&ts, &vs);
        assert_eq!(v.len(), 2);
        assert!((v[0].1 - 100.0).abs() < 1e-9);
        assert!((v[1].1 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn moving_average_flattens_a_constant() {
        let vs = vec![4.2; 30];
        for v in moving_average(&vs, 7) {
            assert!((v - 4.2).abs() < 1e-12);
        }
    }

    #[test]
    fn sample_rate_estimate() {
        let ts: Vec<f64> = (0..101).map(|i| i as f64 * 10.0).collect();
        assert!((estimate_sample_rate_hz(&ts) - 100.0).abs() < 1e-9);
    }
}
