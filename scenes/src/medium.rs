//! Homogeneous Medium

use tof_core::base::*;
use tof_core::sampling::*;
use tof_core::spectrum::*;

/// A participating medium filling all of space with constant σa and σs and an
/// isotropic phase function.
#[derive(Copy, Clone, Debug)]
pub struct HomogeneousMedium {
    /// Absorption coefficient `σa`.
    pub sigma_a: Spectrum,

    /// Scattering coefficient `σs`.
    pub sigma_s: Spectrum,

    /// Extinction coefficient `σt = σs + σa`.
    pub sigma_t: Spectrum,
}

impl HomogeneousMedium {
    /// Create a new `HomogeneousMedium`.
    ///
    /// * `sigma_a` - Absorption coefficient `σa`.
    /// * `sigma_s` - Scattering coefficient `σs`.
    pub fn new(sigma_a: Spectrum, sigma_s: Spectrum) -> Self {
        Self {
            sigma_a,
            sigma_s,
            sigma_t: sigma_s + sigma_a,
        }
    }

    /// Returns a medium that neither absorbs nor scatters.
    pub fn vacuum() -> Self {
        Self::new(Spectrum::ZERO, Spectrum::ZERO)
    }

    /// Returns `true` if no scattering events can be sampled.
    pub fn is_vacuum(&self) -> bool {
        self.sigma_t.is_black()
    }

    /// Returns the beam transmittance over a distance.
    ///
    /// * `distance` - Length of the segment.
    pub fn tr(&self, distance: Float) -> Spectrum {
        (self.sigma_t * -min(distance, Float::MAX)).exp()
    }

    /// Samples a free-flight distance. A spectral channel is chosen uniformly
    /// and the distance drawn from its exponential distribution. Returns `None`
    /// when the chosen channel has no extinction and the walk escapes.
    ///
    /// * `u_channel` - Sample value selecting the channel.
    /// * `u`         - Sample value for the distance.
    pub fn sample_distance(&self, u_channel: Float, u: Float) -> Option<Float> {
        let channel = min((u_channel * SPECTRUM_SAMPLES as Float) as usize, SPECTRUM_SAMPLES - 1);
        let sigma_t = self.sigma_t[channel];
        if sigma_t > 0.0 {
            Some(sample_exponential(sigma_t, u))
        } else {
            None
        }
    }

    /// Returns the density of `sample_distance()` generating a distance. This
    /// is the average of the per channel densities.
    ///
    /// * `distance` - The distance.
    pub fn distance_pdf(&self, distance: Float) -> Float {
        (self.sigma_t * self.tr(distance)).average()
    }

    /// Returns the value of the isotropic phase function.
    #[inline]
    pub fn phase(&self) -> Float {
        INV_FOUR_PI
    }
}

// ---- Tests ----
