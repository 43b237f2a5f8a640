//! Path Length Sampler

use crate::base::*;
use crate::paramset::*;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Temporal modulation of the sensor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Modulation {
    /// No modulation; every path length correlates fully.
    None,

    /// Sinusoidal amplitude modulation.
    Sinusoid,

    /// Square wave modulation.
    Square,
}

impl Modulation {
    /// Returns the code used in serialized configurations.
    pub fn code(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Sinusoid => 1,
            Self::Square => 2,
        }
    }

    /// Returns the modulation for a serialized code.
    ///
    /// * `code` - Serialized code.
    pub fn from_code(code: u32) -> Result<Self, String> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Sinusoid),
            2 => Ok(Self::Square),
            _ => Err(format!("Unknown modulation code {code}")),
        }
    }
}

impl TryFrom<&str> for Modulation {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "sinusoid" => Ok(Self::Sinusoid),
            "square" => Ok(Self::Square),
            _ => Err(format!("Unknown modulation '{s}'; expected none, sinusoid or square")),
        }
    }
}

/// Draws target path lengths for constrained connections and models the temporal correlation of the sensor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathLengthSampler {
    /// Sensor modulation.
    pub modulation: Modulation,

    /// Modulation frequency in cycles per unit of path length.
    pub frequency: Float,

    /// Modulation phase in radians.
    pub phase: Float,

    /// Smallest target length.
    pub min_bound: Float,

    /// Largest target length.
    pub max_bound: Float,
}

impl PathLengthSampler {
    /// Tag identifying this sampler in serialized configurations.
    pub const TYPE_TAG: u32 = 1;

    /// Create a new `PathLengthSampler`.
    ///
    /// * `modulation` - Sensor modulation.
    /// * `frequency`  - Modulation frequency.
    /// * `phase`      - Modulation phase.
    /// * `min_bound`  - Smallest target length.
    /// * `max_bound`  - Largest target length.
    pub fn new(modulation: Modulation, frequency: Float, phase: Float, min_bound: Float, max_bound: Float) -> Self {
        Self {
            modulation,
            frequency,
            phase,
            min_bound,
            max_bound,
        }
    }

    /// Returns `true` when a modulation is active.
    pub fn is_modulated(&self) -> bool {
        self.modulation != Modulation::None
    }

    /// Draws a target length uniformly in `[min_bound, max_bound]`.
    ///
    /// * `u` - Sample value in `[0, 1)`.
    pub fn sample_target(&self, u: Float) -> Float {
        lerp(u, self.min_bound, self.max_bound)
    }

    /// Returns the density of `sample_target()` over path length.
    pub fn pdf(&self) -> Float {
        let range = self.max_bound - self.min_bound;
        if range > 0.0 {
            1.0 / range
        } else {
            0.0
        }
    }

    /// Returns the correlation of the sensor with light arriving after travelling a given length, in `[0, 1]`.
    ///
    /// * `length` - Path length.
    pub fn correlation(&self, length: Float) -> Float {
        let arg = TWO_PI * self.frequency * length + self.phase;
        match self.modulation {
            Modulation::None => 1.0,
            Modulation::Sinusoid => clamp(0.5 * (1.0 + arg.cos()), 0.0, 1.0),
            Modulation::Square => {
                if arg.cos() >= 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Writes the sampler parameters. The type tag is written by the caller.
    ///
    /// * `w` - Output stream.
    pub fn serialize(&self, w: &mut dyn Write) -> std::io::Result<()> {
        w.write_u32::<LittleEndian>(self.modulation.code())?;
        w.write_f32::<LittleEndian>(self.frequency)?;
        w.write_f32::<LittleEndian>(self.phase)?;
        w.write_f32::<LittleEndian>(self.min_bound)?;
        w.write_f32::<LittleEndian>(self.max_bound)
    }

    /// Reads the sampler parameters written by `serialize()`.
    ///
    /// * `r` - Input stream.
    pub fn deserialize(r: &mut dyn Read) -> Result<Self, String> {
        let code = r.read_u32::<LittleEndian>().map_err(|e| e.to_string())?;
        let mut read_f32 = || r.read_f32::<LittleEndian>().map_err(|e| e.to_string());
        let frequency = read_f32()?;
        let phase = read_f32()?;
        let min_bound = read_f32()?;
        let max_bound = read_f32()?;
        Ok(Self::new(Modulation::from_code(code)?, frequency, phase, min_bound, max_bound))
    }
}

impl TryFrom<(&ParamSet, Float, Float)> for PathLengthSampler {
    type Error = String;

    /// Create a `PathLengthSampler` from `ParamSet` and the path length bounds.
    ///
    /// * `p` - Tuple containing the parameter set, smallest and largest target length.
    fn try_from(p: (&ParamSet, Float, Float)) -> Result<Self, Self::Error> {
        let (params, min_bound, max_bound) = p;
        let modulation = Modulation::try_from(params.find_one_string("modulation", String::from("none")).as_str())?;
        let frequency = params.find_one_float("modulationFrequency", 1.0);
        let phase = params.find_one_float("modulationPhase", 0.0);
        if modulation != Modulation::None && frequency <= 0.0 {
            return Err(format!("modulationFrequency must be positive; got {frequency}"));
        }
        Ok(Self::new(modulation, frequency, phase, min_bound, max_bound))
    }
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    #[test]
    fn correlation_of_each_modulation() {
        let mut s = PathLengthSampler::new(Modulation::None, 0.25, 0.0, 0.0, 10.0);
        assert_eq!(s.correlation(3.3), 1.0);

        s.modulation = Modulation::Sinusoid;
        assert!(approx_eq!(f32, s.correlation(0.0), 1.0, epsilon = 1e-6));
        assert!(approx_eq!(f32, s.correlation(1.0), 0.5, epsilon = 1e-6));
        assert!(approx_eq!(f32, s.correlation(2.0), 0.0, epsilon = 1e-6));

        s.modulation = Modulation::Square;
        assert_eq!(s.correlation(0.5), 1.0);
        assert_eq!(s.correlation(1.5), 0.0);
    }

    #[test]
    fn params_and_names() {
        let mut ps = ParamSet::new();
        ps.add_string("modulation", &[String::from("Sinusoid")]);
        ps.add_float("modulationFrequency", &[2.0]);
        let s = PathLengthSampler::try_from((&ps, 1.0, 3.0)).unwrap();
        assert!(s.is_modulated());
        assert_eq!(s.frequency, 2.0);
        assert_eq!(s.pdf(), 0.5);

        ps.add_string("modulation", &[String::from("triangle")]);
        assert!(PathLengthSampler::try_from((&ps, 1.0, 3.0)).is_err());
    }

    proptest! {
        #[test]
        fn targets_stay_in_bounds(u in 0.0f32..1.0, min in 0.0f32..10.0, range in 0.1f32..10.0) {
            let s = PathLengthSampler::new(Modulation::None, 1.0, 0.0, min, min + range);
            let t = s.sample_target(u);
            prop_assert!(t >= min && t <= min + range);
        }

        #[test]
        fn correlation_is_a_probability(len in 0.0f32..100.0, f in 0.01f32..5.0, phase in -3.0f32..3.0) {
            for m in [Modulation::Sinusoid, Modulation::Square] {
                let c = PathLengthSampler::new(m, f, phase, 0.0, 1.0).correlation(len);
                prop_assert!((0.0..=1.0).contains(&c));
            }
        }
    }
}
