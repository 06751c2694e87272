pub fn mean(vs: &[f64]) -> f64 {
    if vs.is_empty() {
        return 0.0;
    }
    vs.iter().sum::<f64>() / vs.len() as f64
}

/// Population standard deviation.
pub fn population_std(vs: &[f64]) -> f64 {
    if vs.is_empty() {
        return 0.0;
    }
    let m = mean(vs);
    (vs.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / vs.len() as f64).sqrt()
}

pub fn min(vs: &[f64]) -> f64 {
    vs.iter().copied().fold(f64::INFINITY, f64::min)
}

pub fn max(vs: &[f64]) -> f64 {
    vs.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Ordinary least squares over paired slices. `None` when there are fewer
/// than two points or the x values do not vary.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let xs = &xs[..n];
    let ys = &ys[..n];
    let mx = mean(xs);
    let my = mean(ys);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = xs[i] - mx;
        let dy = ys[i] - my;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    let r_squared = if syy == 0.0 { 1.0 } else { (sxy * sxy) / (sxx * syy) };
    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Pearson correlation, guarding against zero variance on either side.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mx = mean(&xs[..n]);
    let my = mean(&ys[..n]);
    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for i in 0..n {
        let dx = xs[i] - mx;
        let dy = ys[i] - my;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx.sqrt() * syy.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regression_fits_a_perfect_line() {
        let xs: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| -2.0 * x + 5.0).collect();
        let fit = linear_regression(&xs, &ys).unwrap();
        assert!((fit.slope + 2.0).abs() < 1e-12);
        assert!((fit.intercept - 5.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn regression_rejects_constant_x() {
        let xs = vec![3.0; 10];
        let ys: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert!(linear_regression(&xs, &ys).is_none());
    }

    #[test]
    fn pearson_guards_zero_variance() {
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let flat = vec![1.0; 10];
        assert!(pearson(&xs, &flat).is_none());
        assert!((pearson(&xs, &xs).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn population_std_of_known_set() {
        let vs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std(&vs) - 2.0).abs() < 1e-12);
        assert!((mean(&vs) - 5.0).abs() < 1e-12);
        assert!((min(&vs) - 2.0).abs() < 1e-12);
        assert!((max(&vs) - 9.0).abs() < 1e-12);
    }
}
