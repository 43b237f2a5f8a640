//! Scene

use crate::base::*;
use crate::geometry::*;
use crate::path::*;
use crate::spectrum::*;

/// Result of sampling an endpoint directly from a vertex.
#[derive(Copy, Clone, Debug)]
pub struct DirectSample {
    /// The sampled emitter or sensor position.
    pub vertex: PathVertex,

    /// Emitted radiance or importance towards the reference vertex, including the foreshortening at the sampled
    /// endpoint and the inverse squared distance, divided by the sampling density. Transmittance and the foreshortening
    /// at the reference vertex are not included.
    pub value: Spectrum,

    /// Density of the sampled position in area measure.
    pub pdf: Float,
}

/// Scene queries used to evaluate and connect path vertices.
///
/// Methods taking a `TransportMode` select the side of the path: `Importance` for the emitter sub-path and `Radiance`
/// for the sensor sub-path. Densities are expressed in area measure of the generated vertex.
pub trait Scene: Send + Sync {
    /// Evaluates the emission profile or scattering function at `v` for light leaving towards `succ`. Foreshortening
    /// is not included.
    ///
    /// * `v`    - The vertex to evaluate.
    /// * `pred` - The vertex preceding `v` on its sub-path; `None` when `v` is an endpoint.
    /// * `succ` - The vertex `v` connects to.
    /// * `mode` - Side of the sub-path `v` belongs to.
    fn eval(&self, v: &PathVertex, pred: Option<&PathVertex>, succ: &PathVertex, mode: TransportMode) -> Spectrum;

    /// Returns the density of generating `succ` by sampling at `v`.
    ///
    /// * `v`    - The vertex that samples.
    /// * `pred` - The vertex preceding `v`; `None` when `v` is an endpoint or a supernode.
    /// * `succ` - The generated vertex.
    /// * `mode` - Side of the sub-path `v` belongs to.
    fn pdf(&self, v: &PathVertex, pred: Option<&PathVertex>, succ: &PathVertex, mode: TransportMode) -> Float;

    /// Samples an endpoint directly as seen from `v`.
    ///
    /// * `v`    - The reference vertex.
    /// * `u`    - Sample value.
    /// * `side` - `Importance` samples an emitter and `Radiance` samples the sensor.
    fn sample_direct(&self, v: &PathVertex, u: &Point2f, side: TransportMode) -> Option<DirectSample>;

    /// Returns the density with which `sample_direct()` generates `endpoint` from `v`.
    ///
    /// * `v`        - The reference vertex.
    /// * `endpoint` - An emitter or sensor sample.
    /// * `side`     - `Importance` for an emitter and `Radiance` for the sensor.
    fn pdf_direct(&self, v: &PathVertex, endpoint: &PathVertex, side: TransportMode) -> Float;

    /// Traces the segment between two vertices and returns its transmittance if it is unoccluded.
    ///
    /// * `a`         - Vertex on the emitter side.
    /// * `b`         - Vertex on the sensor side.
    /// * `remaining` - Number of index-matched interfaces that may be crossed; negative for unlimited.
    fn connect(&self, a: &PathVertex, b: &PathVertex, remaining: Int) -> Option<Spectrum>;

    /// Returns the raster position at which a sensor sample sees `target`.
    ///
    /// * `sensor` - Sensor sample vertex.
    /// * `target` - The vertex it connects to.
    fn sensor_position(&self, sensor: &PathVertex, target: &PathVertex) -> Option<Point2f>;

    /// Samples an outgoing direction at `v` from its scattering or emission profile.
    ///
    /// Returns the unit direction and its solid angle density.
    ///
    /// * `v`    - The vertex that samples.
    /// * `pred` - The vertex preceding `v`; `None` when `v` is an endpoint.
    /// * `u`    - Sample value.
    /// * `mode` - Side of the sub-path `v` belongs to.
    fn sample_direction(
        &self,
        v: &PathVertex,
        pred: Option<&PathVertex>,
        u: &Point2f,
        mode: TransportMode,
    ) -> Option<(Vector3f, Float)>;

    /// Returns the scattering vertex at `p`, reached along direction `w`, if `p` can hold one.
    ///
    /// * `p` - Position.
    /// * `w` - Direction of arrival.
    fn locate(&self, p: &Point3f, w: &Vector3f) -> Option<PathVertex>;

    /// Returns the film resolution of the sensor.
    fn film_resolution(&self) -> Point2i;
}
