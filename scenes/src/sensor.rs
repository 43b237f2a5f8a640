//! Pinhole Sensor

use tof_core::base::*;
use tof_core::geometry::*;
use tof_core::path::*;

/// An ideal pinhole camera. Importance is normalised so that it integrates to
/// one over the image plane at unit distance.
#[derive(Copy, Clone, Debug)]
pub struct PinholeSensor {
    /// Position of the pinhole.
    pub p: Point3f,

    /// Camera frame; `n` is the viewing direction, `s` points right and `t` up.
    pub frame: Frame,

    /// Film resolution.
    pub resolution: Point2i,

    /// Half extent of the screen window at unit distance along `s` and `t`.
    half_extent: Vector2f,

    /// Area of the screen window at unit distance.
    area: Float,
}

impl PinholeSensor {
    /// Create a new `PinholeSensor`. The field of view spans the shorter image
    /// axis.
    ///
    /// * `p`          - Position of the pinhole.
    /// * `look_at`    - Point the camera looks at.
    /// * `up`         - Up vector.
    /// * `fov`        - Field of view in degrees.
    /// * `resolution` - Film resolution.
    pub fn new(p: Point3f, look_at: Point3f, up: Vector3f, fov: Float, resolution: Point2i) -> Result<Self, String> {
        if resolution.x <= 0 || resolution.y <= 0 {
            return Err(format!("invalid film resolution {resolution}"));
        }
        if !(fov > 0.0 && fov < 180.0) {
            return Err(format!("field of view {fov} must lie in (0, 180)"));
        }

        let n = (look_at - p).normalize();
        let right = up.cross(&n);
        if n.has_nans() || !(right.length() > 0.0) {
            return Err("degenerate camera orientation".to_string());
        }
        let s = right.normalize();
        let t = n.cross(&s);

        let tan_half = (fov.to_radians() * 0.5).tan();
        let aspect = resolution.x as Float / resolution.y as Float;
        let half_extent = if aspect >= 1.0 {
            Vector2f::new(tan_half * aspect, tan_half)
        } else {
            Vector2f::new(tan_half, tan_half / aspect)
        };

        Ok(Self {
            p,
            frame: Frame { s, t, n },
            resolution,
            half_extent,
            area: 4.0 * half_extent.x * half_extent.y,
        })
    }

    /// Returns the area of the screen window at unit distance.
    pub fn area(&self) -> Float {
        self.area
    }

    /// Returns the unit world space direction through a raster position.
    ///
    /// * `raster` - Raster position.
    pub fn direction(&self, raster: &Point2f) -> Vector3f {
        let x = (2.0 * raster.x / self.resolution.x as Float - 1.0) * self.half_extent.x;
        let y = (1.0 - 2.0 * raster.y / self.resolution.y as Float) * self.half_extent.y;
        self.frame.to_world(&Vector3f::new(x, y, 1.0)).normalize()
    }

    /// Returns the raster position seen along a world space direction or `None`
    /// if it lies outside the film.
    ///
    /// * `w` - Direction leaving the pinhole.
    pub fn project(&self, w: &Vector3f) -> Option<Point2f> {
        let local = self.frame.to_local(w);
        if local.z <= 0.0 {
            return None;
        }

        let x = local.x / local.z / self.half_extent.x;
        let y = local.y / local.z / self.half_extent.y;
        let raster = Point2f::new(
            0.5 * (x + 1.0) * self.resolution.x as Float,
            0.5 * (1.0 - y) * self.resolution.y as Float,
        );

        let inside = raster.x >= 0.0
            && raster.y >= 0.0
            && raster.x < self.resolution.x as Float
            && raster.y < self.resolution.y as Float;
        inside.then_some(raster)
    }

    /// Returns the cosine between a direction and the viewing direction.
    ///
    /// * `w` - Unit direction.
    pub fn cos_theta(&self, w: &Vector3f) -> Float {
        w.dot(&self.frame.n)
    }

    /// Returns the emitted importance along a unit direction; zero outside the
    /// field of view.
    ///
    /// * `w` - Direction leaving the pinhole.
    pub fn importance(&self, w: &Vector3f) -> Float {
        if self.project(w).is_none() {
            return 0.0;
        }
        let cos_theta = self.cos_theta(w);
        1.0 / (self.area * sqr(sqr(cos_theta)))
    }

    /// Returns the solid angle density of sampling a direction by choosing a
    /// uniform position on the film.
    ///
    /// * `w` - Direction leaving the pinhole.
    pub fn direction_pdf(&self, w: &Vector3f) -> Float {
        if self.project(w).is_none() {
            return 0.0;
        }
        let cos_theta = self.cos_theta(w);
        1.0 / (self.area * cos_theta * cos_theta * cos_theta)
    }

    /// Returns the supernode that starts every sensor sub-path.
    pub fn supernode(&self) -> PathVertex {
        let mut v = PathVertex::new(VertexKind::SensorSupernode, Point3f::default());
        v.measure = Measure::Discrete;
        v.pdf = [1.0; 2];
        v
    }

    /// Returns the position sample on the aperture.
    ///
    /// * `sample_pos` - Raster position the sample contributes to.
    pub fn sample(&self, sample_pos: Point2f) -> PathVertex {
        let mut v = PathVertex::new(VertexKind::SensorSample, self.p);
        v.flags = VertexFlags::DELTA_POSITION;
        v.measure = Measure::Discrete;
        v.n = Some(self.frame.n);
        v.pdf[TransportMode::Radiance.index()] = 1.0;
        v.sample_pos = sample_pos;
        v
    }
}

// ---- Tests ----
