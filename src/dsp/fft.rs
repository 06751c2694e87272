use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };

    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn from_polar(r: f64, theta: f64) -> Self {
        Self {
            re: r * theta.cos(),
            im: r * theta.sin(),
        }
    }

    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }

    pub fn norm_sqr(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    pub fn abs(self) -> f64 {
        self.norm_sqr().sqrt()
    }

    pub fn arg(self) -> f64 {
        self.im.atan2(self.re)
    }
}

impl Add for Complex {
    type Output = Complex;
    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Complex;
    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;
    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

/// In-place iterative Cooley-Tukey. Pads the buffer with zeros up to the
/// next power of two before transforming.
pub fn fft(buf: &mut Vec<Complex>) {
    pad_pow2(buf);
    transform(buf, false);
}

/// Inverse transform with 1/N scaling. Pads like [`fft`].
pub fn ifft(buf: &mut Vec<Complex>) {
    pad_pow2(buf);
    transform(buf, true);
    let n = buf.len() as f64;
    for v in buf.iter_mut() {
        v.re /= n;
        v.im /= n;
    }
}

/// Hann window of length `n`.
pub fn hann_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (n - 1) as f64).cos()))
        .collect()
}

fn pad_pow2(buf: &mut Vec<Complex>) {
    let n = buf.len().max(1).next_power_of_two();
    buf.resize(n, Complex::ZERO);
}

fn transform(buf: &mut [Complex], inverse: bool) {
    let n = buf.len();
    if n <= 1 {
        return;
    }

    // Bit-reversal permutation.
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            buf.swap(i, j);
        }
    }

    let sign = if inverse { 1.0 } else { -1.0 };
    let mut len = 2;
    while len <= n {
        let ang = sign * 2.0 * PI / len as f64;
        let wlen = Complex::from_polar(1.0, ang);
        let mut start = 0;
        while start < n {
            let mut w = Complex::new(1.0, 0.0);
            for k in 0..len / 2 {
                let u = buf[start + k];
                let v = buf[start + k + len / 2] * w;
                buf[start + k] = u + v;
                buf[start + k + len / 2] = u - v;
                w = w * wlen;
            }
            start += len;
        }
        len <<= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(n: usize) {
        let signal: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                (2.0 * PI * 3.0 * t).sin() + 0.5 * (2.0 * PI * 17.0 * t).cos() + 0.1 * i as f64
            })
            .collect();

        let mut buf: Vec<Complex> = signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
        fft(&mut buf);
        ifft(&mut buf);

        for (orig, got) in signal.iter().zip(buf.iter()) {
            let scale = orig.abs().max(1.0);
            assert!(
                (orig - got.re).abs() / scale < 1e-9,
                "re mismatch at n={n}: {orig} vs {}",
                got.re
            );
            assert!(got.im.abs() / scale < 1e-9);
        }
    }

    #[test]
    fn fft_ifft_roundtrip() {
        roundtrip(64);
        roundtrip(128);
        roundtrip(256);
    }

    #[test]
    fn fft_pads_to_power_of_two() {
        let mut buf = vec![Complex::new(1.0, 0.0); 100];
        fft(&mut buf);
        assert_eq!(buf.len(), 128);
    }

    #[test]
    fn fft_locates_a_pure_tone() {
        let n = 256;
        let mut buf: Vec<Complex> = (0..n)
            .map(|i| Complex::new((2.0 * PI * 8.0 * i as f64 / n as f64).sin(), 0.0))
            .collect();
        fft(&mut buf);

        let peak = (1..n / 2)
            .max_by(|&a, &b| buf[a].norm_sqr().total_cmp(&buf[b].norm_sqr()))
            .unwrap();
        assert_eq!(peak, 8);
    }

    #[test]
    fn hann_window_is_symmetric_and_zero_edged() {
        let w = hann_window(64);
        assert!(w[0].abs() < 1e-12);
        assert!(w[63].abs() < 1e-12);
        for i in 0..32 {
            assert!((w[i] - w[63 - i]).abs() < 1e-12);
        }
    }
}
