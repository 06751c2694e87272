use crate::dsp::fft::{fft, hann_window, Complex};

const EPS: f64 = 1e-12;

/// One-sided power spectral density with its bin frequencies.
#[derive(Clone, Debug)]
pub struct Psd {
    pub freqs: Vec<f64>,
    pub power: Vec<f64>,
}

impl Psd {
    /// Total power over bins with `lo <= f <= hi`.
    pub fn band_power(&self, lo: f64, hi: f64) -> f64 {
        self.freqs
            .iter()
            .zip(self.power.iter())
            .filter(|(f, _)| **f >= lo && **f <= hi)
            .map(|(_, p)| *p)
            .sum()
    }

    /// Frequency of the strongest bin with `f > above`, if any.
    pub fn peak_above(&self, above: f64) -> Option<f64> {
        self.freqs
            .iter()
            .zip(self.power.iter())
            .filter(|(f, _)| **f > above)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(f, _)| *f)
    }
}

/// Hann-windowed PSD: magnitude-squared half spectrum divided by the FFT
/// size, bins at `i * sample_rate / n`.
pub fn psd(signal: &[f64], sample_rate_hz: f64) -> Psd {
    let mut buf = windowed(signal);
    fft(&mut buf);
    let n = buf.len();
    let half = n / 2;

    let mut freqs = Vec::with_capacity(half);
    let mut power = Vec::with_capacity(half);
    for (i, v) in buf.iter().take(half).enumerate() {
        freqs.push(i as f64 * sample_rate_hz / n as f64);
        power.push(v.norm_sqr() / n as f64);
    }
    Psd { freqs, power }
}

/// Gain, phase, and coherence at one frequency bin. `phase` is the output
/// phase relative to the input, so a lagging response has negative phase.
#[derive(Clone, Copy, Debug)]
pub struct TransferPoint {
    pub freq: f64,
    pub gain: f64,
    pub phase: f64,
    pub coherence: f64,
}

/// Single-segment transfer function estimate between an input drive and an
/// output response sampled on the same uniform grid.
pub fn transfer_function(input: &[f64], output: &[f64], sample_rate_hz: f64) -> Vec<TransferPoint> {
    let len = input.len().min(output.len());
    let mut x = windowed(&input[..len]);
    let mut y = windowed(&output[..len]);
    fft(&mut x);
    fft(&mut y);

    let n = x.len();
    let half = n / 2;
    let mut out = Vec::with_capacity(half);
    for i in 0..half {
        let sxx = x[i].norm_sqr() + EPS;
        let syy = y[i].norm_sqr() + EPS;
        let sxy = y[i] * x[i].conj();
        out.push(TransferPoint {
            freq: i as f64 * sample_rate_hz / n as f64,
            gain: sxy.abs() / sxx,
            phase: sxy.arg(),
            coherence: sxy.norm_sqr() / (sxx * syy),
        });
    }
    out
}

/// Index of the bin nearest `freq` for a spectrum of `half` bins from an
/// `n`-point transform at `sample_rate_hz`.
pub fn nearest_bin(freq: f64, half: usize, sample_rate_hz: f64) -> usize {
    let n = half * 2;
    let idx = (freq * n as f64 / sample_rate_hz).round() as usize;
    idx.min(half.saturating_sub(1))
}

fn windowed(signal: &[f64]) -> Vec<Complex> {
    let w = hann_window(signal.len());
    signal
        .iter()
        .zip(w.iter())
        .map(|(&s, &w)| Complex::new(s * w, 0.0))
        .collect()
}
