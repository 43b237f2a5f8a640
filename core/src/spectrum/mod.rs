//! Spectrum

mod rgb_spectrum;

// Re-export.
pub use rgb_spectrum::*;

/// The spectral representation used by the renderer.
pub type Spectrum = RGBSpectrum;

/// Number of spectral channels written per path-length bin.
pub const SPECTRUM_SAMPLES: usize = 3;
