//! Path Length Decomposition

mod path_length;
mod wire;

pub use path_length::*;

use crate::base::*;
use crate::filter::*;
use crate::geometry::*;
use crate::paramset::*;
use crate::spectrum::*;

// Binned output stores three channels per frame.
const _: () = assert!(SPECTRUM_SAMPLES == 3);

/// How contributions are resolved by path length.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecompositionKind {
    /// Sum over all path lengths.
    SteadyState,

    /// Bin by physical path length.
    Transient,

    /// Bin by number of bounces.
    Bounce,

    /// Bin by physical path length and constrain connections to a target length with ellipsoidal sampling.
    TransientEllipse,
}

impl DecompositionKind {
    /// Returns the code used in serialized configurations.
    pub fn code(self) -> u32 {
        match self {
            Self::SteadyState => 0,
            Self::Transient => 1,
            Self::Bounce => 2,
            Self::TransientEllipse => 3,
        }
    }

    /// Returns the kind for a serialized code.
    ///
    /// * `code` - Serialized code.
    pub fn from_code(code: u32) -> Result<Self, String> {
        match code {
            0 => Ok(Self::SteadyState),
            1 => Ok(Self::Transient),
            2 => Ok(Self::Bounce),
            3 => Ok(Self::TransientEllipse),
            _ => Err(format!("Unknown decomposition code {code}")),
        }
    }

    /// Returns `true` for the kinds that resolve contributions by path length.
    pub fn is_transient(self) -> bool {
        self != Self::SteadyState
    }
}

impl TryFrom<&str> for DecompositionKind {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "steadystate" => Ok(Self::SteadyState),
            "transient" => Ok(Self::Transient),
            "bounce" => Ok(Self::Bounce),
            "transientellipse" => Ok(Self::TransientEllipse),
            _ => Err(format!(
                "Unknown decomposition '{s}'; expected none, transient, bounce or transientellipse"
            )),
        }
    }
}

/// Parameters of adaptive per-pixel sampling.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AdaptiveParams {
    /// Target relative error of the per-pixel estimate.
    pub max_error: Float,

    /// Significance level of the confidence interval.
    pub p_value: Float,

    /// Hard cap on samples as a multiple of the per-bin budget; negative for no cap.
    pub max_sample_factor: Float,
}

impl Default for AdaptiveParams {
    fn default() -> Self {
        Self {
            max_error: 0.05,
            p_value: 0.05,
            max_sample_factor: 8.0,
        }
    }
}

/// Read-only description of the output of a render job: image window, path length binning and the reconstruction
/// filter.
#[derive(Clone)]
pub struct DecompositionConfig {
    /// Full image resolution.
    pub size: Point2i,

    /// Upper left corner of the rendered window.
    pub crop_offset: Point2i,

    /// Size of the rendered window.
    pub crop_size: Point2i,

    /// Sample pixels just outside the crop window so the filter footprint near the edges is complete.
    pub high_quality_edges: bool,

    /// Decomposition kind.
    pub kind: DecompositionKind,

    /// Combine unconstrained and ellipsoidal connections.
    pub combine_samplings: bool,

    /// Smallest resolved path length.
    pub min_bound: Float,

    /// Largest resolved path length.
    pub max_bound: Float,

    /// Width of one bin.
    pub bin_width: Float,

    /// Number of bins (frames) in the output.
    pub frames: usize,

    /// Sensor sub-paths traced per emitter sub-path.
    pub sub_samples: usize,

    /// Only evaluate the strategy `(s_bounce, t_bounce)`.
    pub force_bounce: bool,

    /// Emitter prefix length of the forced strategy.
    pub s_bounce: usize,

    /// Sensor prefix length of the forced strategy.
    pub t_bounce: usize,

    /// Reconstruction filter.
    pub filter: ArcFilter,

    /// Target length sampler and sensor modulation.
    pub path_length_sampler: PathLengthSampler,

    /// Stratify target lengths over the bins.
    pub ld_sampling: bool,

    /// Adaptive sampling parameters; `None` when disabled.
    pub adaptive: Option<AdaptiveParams>,
}

impl DecompositionConfig {
    /// Returns the number of frames for a decomposition.
    ///
    /// * `kind`      - Decomposition kind.
    /// * `modulated` - Whether a sensor modulation is active.
    /// * `min_bound` - Smallest path length.
    /// * `max_bound` - Largest path length.
    /// * `bin_width` - Bin width.
    pub fn frame_count(kind: DecompositionKind, modulated: bool, min_bound: Float, max_bound: Float, bin_width: Float) -> usize {
        if !kind.is_transient() || modulated {
            1
        } else {
            max(((max_bound - min_bound) / bin_width).ceil() as usize, 1)
        }
    }

    /// Checks the configuration for incompatible settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.size.x <= 0 || self.size.y <= 0 {
            return Err(format!("Image size {}x{} is empty", self.size.x, self.size.y));
        }
        if self.crop_offset.x < 0
            || self.crop_offset.y < 0
            || self.crop_size.x <= 0
            || self.crop_size.y <= 0
            || self.crop_offset.x + self.crop_size.x > self.size.x
            || self.crop_offset.y + self.crop_size.y > self.size.y
        {
            return Err(format!(
                "Invalid crop window: offset {} size {} for image {}",
                self.crop_offset, self.crop_size, self.size
            ));
        }

        if self.combine_samplings && self.kind != DecompositionKind::TransientEllipse {
            return Err(String::from(
                "decomposition 'transientellipse' is required when combinesamplings is set",
            ));
        }
        if self.ld_sampling && self.adaptive.is_some() {
            return Err(String::from("ldSampling and adapSampling cannot be used together"));
        }
        if self.ld_sampling || self.adaptive.is_some() {
            let name = if self.ld_sampling { "ldSampling" } else { "adapSampling" };
            if self.kind != DecompositionKind::TransientEllipse {
                return Err(format!("{name} requires decomposition 'transientellipse'"));
            }
            if self.path_length_sampler.is_modulated() {
                return Err(format!("{name} cannot be used with a modulation"));
            }
        }
        if let Some(adaptive) = self.adaptive {
            if adaptive.max_error <= 0.0 {
                return Err(format!("adapMaxError must be positive; got {}", adaptive.max_error));
            }
            if adaptive.p_value <= 0.0 || adaptive.p_value >= 1.0 {
                return Err(format!("adapPValue must lie in (0, 1); got {}", adaptive.p_value));
            }
        }

        if self.kind.is_transient() {
            if self.bin_width <= 0.0 {
                return Err(format!("binWidth must be positive; got {}", self.bin_width));
            }
            if self.max_bound <= self.min_bound {
                return Err(format!(
                    "maxBound ({}) must be greater than minBound ({})",
                    self.max_bound, self.min_bound
                ));
            }
        }

        if self.sub_samples == 0 {
            return Err(String::from("subSamples must be at least 1"));
        }
        if self.force_bounce && self.s_bounce + self.t_bounce < 2 {
            return Err(format!(
                "forceBounce strategy ({}, {}) does not form a path",
                self.s_bounce, self.t_bounce
            ));
        }

        let expected = Self::frame_count(self.kind, self.is_modulated(), self.min_bound, self.max_bound, self.bin_width);
        if self.frames != expected {
            return Err(format!("Frame count {} does not match the bounds; expected {expected}", self.frames));
        }

        Ok(())
    }

    /// Checks that the per-pixel sample count is compatible with stratified or adaptive sampling.
    ///
    /// * `sample_count` - Samples per pixel.
    pub fn check_sample_count(&self, sample_count: usize) -> Result<(), String> {
        if sample_count == 0 {
            return Err(String::from("sampleCount must be positive"));
        }
        if (self.ld_sampling || self.adaptive.is_some()) && sample_count % self.frames != 0 {
            return Err(format!(
                "sampleCount ({sample_count}) must be a multiple of the number of frames ({})",
                self.frames
            ));
        }
        Ok(())
    }

    /// Returns `true` when a sensor modulation folds every path length into a single frame.
    #[inline]
    pub fn is_modulated(&self) -> bool {
        self.kind.is_transient() && self.path_length_sampler.is_modulated()
    }

    /// Returns `true` when contributions are written to path length bins.
    #[inline]
    pub fn is_binned(&self) -> bool {
        self.kind.is_transient() && !self.path_length_sampler.is_modulated()
    }

    /// Returns the number of channels per pixel: three per frame followed by the filter weight and alpha.
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.frames * SPECTRUM_SAMPLES + 2
    }

    /// Returns the bin a path length falls into or `None` when it lies outside the resolved range.
    ///
    /// * `length` - Path length.
    pub fn bin_index(&self, length: Float) -> Option<usize> {
        if !(length >= self.min_bound && length <= self.max_bound) {
            return None;
        }
        let bin = ((length - self.min_bound) / self.bin_width).floor() as usize;
        (bin < self.frames).then_some(bin)
    }

    /// Returns `true` when a path length lies within `[min_bound, max_bound]`.
    ///
    /// * `length` - Path length.
    #[inline]
    pub fn in_range(&self, length: Float) -> bool {
        length >= self.min_bound && length <= self.max_bound
    }

    /// Draws the target length of a constrained connection.
    ///
    /// * `stratum` - Bin to stratify into; `None` draws uniformly over all bins.
    /// * `u`       - Sample value in `[0, 1)`.
    pub fn sample_target(&self, stratum: Option<usize>, u: Float) -> Float {
        match stratum {
            Some(j) => self.min_bound + self.bin_width * ((j % self.frames) as Float + u),
            None => self.path_length_sampler.sample_target(u),
        }
    }

    /// Returns the width of the interval that constrained target lengths are drawn from. Stratified targets cover
    /// whole bins, so the interval may extend past `max_bound` by part of the last bin.
    pub fn target_range(&self) -> Float {
        if self.ld_sampling || self.adaptive.is_some() {
            self.bin_width * self.frames as Float
        } else {
            self.max_bound - self.min_bound
        }
    }

    /// Returns the per-frame sample budget of a pixel.
    ///
    /// * `sample_count` - Samples per pixel.
    pub fn budget(&self, sample_count: usize) -> usize {
        max(sample_count / self.frames, 1)
    }

    /// Returns the bounds of the pixels that receive samples.
    pub fn sample_bounds(&self) -> Bounds2i {
        let border = if self.high_quality_edges { self.filter.border_size() } else { 0 };
        Bounds2i::new(
            Point2i::new(self.crop_offset.x - border, self.crop_offset.y - border),
            Point2i::new(
                self.crop_offset.x + self.crop_size.x + border,
                self.crop_offset.y + self.crop_size.y + border,
            ),
        )
    }
}

impl TryFrom<(&ParamSet, ArcFilter)> for DecompositionConfig {
    type Error = String;

    /// Create a `DecompositionConfig` from `ParamSet` and a reconstruction filter.
    ///
    /// * `p` - Tuple containing the parameter set and the filter.
    fn try_from(p: (&ParamSet, ArcFilter)) -> Result<Self, Self::Error> {
        let (params, filter) = p;

        let size = Point2i::new(params.find_one_int("width", 768), params.find_one_int("height", 576));
        let crop_offset = Point2i::new(
            params.find_one_int("cropOffsetX", 0),
            params.find_one_int("cropOffsetY", 0),
        );
        let mut crop_size = Point2i::new(
            params.find_one_int("cropWidth", size.x - crop_offset.x),
            params.find_one_int("cropHeight", size.y - crop_offset.y),
        );
        if crop_offset.x >= 0
            && crop_offset.y >= 0
            && (crop_offset.x + crop_size.x > size.x || crop_offset.y + crop_size.y > size.y)
        {
            let clipped = Point2i::new(
                min(crop_size.x, size.x - crop_offset.x),
                min(crop_size.y, size.y - crop_offset.y),
            );
            warn!("Crop window {crop_size} at {crop_offset} exceeds the image {size}; clipped to {clipped}");
            crop_size = clipped;
        }

        let kind = DecompositionKind::try_from(params.find_one_string("decomposition", String::from("none")).as_str())?;
        let min_bound = params.find_one_float("minBound", 0.0);
        let max_bound = params.find_one_float("maxBound", 0.0);
        let bin_width = params.find_one_float("binWidth", 1.0);
        let path_length_sampler = PathLengthSampler::try_from((params, min_bound, max_bound))?;

        let adaptive = params.find_one_bool("adapSampling", false).then(|| AdaptiveParams {
            max_error: params.find_one_float("adapMaxError", 0.05),
            p_value: params.find_one_float("adapPValue", 0.05),
            max_sample_factor: params.find_one_float("adapMaxSampleFactor", 8.0),
        });

        let sub_samples = params.find_one_int("subSamples", 1);
        let s_bounce = params.find_one_int("sBounce", 0);
        let t_bounce = params.find_one_int("tBounce", 0);
        if sub_samples < 1 || s_bounce < 0 || t_bounce < 0 {
            return Err(format!(
                "subSamples ({sub_samples}), sBounce ({s_bounce}) and tBounce ({t_bounce}) must not be negative and \
                 subSamples must be at least 1"
            ));
        }

        let frames = if kind.is_transient() && bin_width > 0.0 && max_bound > min_bound {
            Self::frame_count(kind, path_length_sampler.is_modulated(), min_bound, max_bound, bin_width)
        } else {
            1
        };

        let config = Self {
            size,
            crop_offset,
            crop_size,
            high_quality_edges: params.find_one_bool("highQualityEdges", false),
            kind,
            combine_samplings: params.find_one_bool("combinesamplings", false),
            min_bound,
            max_bound,
            bin_width,
            frames,
            sub_samples: sub_samples as usize,
            force_bounce: params.find_one_bool("forceBounce", false),
            s_bounce: s_bounce as usize,
            t_bounce: t_bounce as usize,
            filter,
            path_length_sampler,
            ld_sampling: params.find_one_bool("ldSampling", false),
            adaptive,
        };
        config.validate()?;
        Ok(config)
    }
}
