//! Numeric kernel shared by the analysis pipelines: FFT, spectral
//! estimators, resampling, and small-sample statistics. Everything operates
//! on dense `f64` slices; FFT buffers are padded to a power of two up front.

pub mod fft;
pub mod series;
pub mod spectral;
pub mod stats;

pub use fft::{fft, hann_window, ifft, Complex};
pub use series::{estimate_sample_rate_hz, forward_velocity, moving_average, resample_uniform};
pub use spectral::{psd, transfer_function, Psd, TransferPoint};
pub use stats::{linear_regression, mean, pearson, population_std, LinearFit};
