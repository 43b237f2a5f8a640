//! Image I/O

use crate::base::*;
use crate::geometry::*;
use exr::prelude::write_rgb_file;
use image::{ImageBuffer, ImageFormat, Rgb};
use std::path::Path;

/// Writes an RGB image. The format is selected by the file extension: `.exr` keeps the floating point values and
/// `.png` stores gamma corrected 8-bit values.
///
/// * `path`       - Output path.
/// * `rgb`        - Three values per pixel in scanline order.
/// * `resolution` - Image resolution.
pub fn write_image(path: &str, rgb: &[Float], resolution: &Point2i) -> Result<(), String> {
    let res_x = resolution.x as usize;
    let res_y = resolution.y as usize;
    if rgb.len() != 3 * res_x * res_y {
        return Err(format!(
            "Image {path} has {} values; expected {} for {res_x}x{res_y}",
            rgb.len(),
            3 * res_x * res_y
        ));
    }

    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("exr") => write_exr(path, rgb, res_x, res_y),
        Some("png") => write_8_bit(path, rgb, res_x as u32, res_y as u32, ImageFormat::Png),
        Some(extension) => Err(format!("Extension {extension} is not supported")),
        None => Err(format!("Can't determine file type from suffix of filename {path}")),
    }
}

/// Writes an OpenEXR file.
///
/// * `path`  - Output path.
/// * `rgb`   - Three values per pixel.
/// * `res_x` - Width.
/// * `res_y` - Height.
fn write_exr(path: &str, rgb: &[Float], res_x: usize, res_y: usize) -> Result<(), String> {
    info!("Writing image {path} with resolution {res_x}x{res_y}");

    match write_rgb_file(path, res_x, res_y, |x, y| {
        let offset = 3 * (y * res_x + x);
        (rgb[offset], rgb[offset + 1], rgb[offset + 2])
    }) {
        Ok(()) => Ok(()),
        Err(err) => Err(format!("Error saving output image {path}: {err}")),
    }
}

/// Writes an 8-bit image.
///
/// * `path`         - Output path.
/// * `rgb`          - Three values per pixel.
/// * `res_x`        - Width.
/// * `res_y`        - Height.
/// * `image_format` - Output format.
fn write_8_bit(path: &str, rgb: &[Float], res_x: u32, res_y: u32, image_format: ImageFormat) -> Result<(), String> {
    info!("Writing image {path} with resolution {res_x}x{res_y}");

    let imgbuf = ImageBuffer::from_fn(res_x, res_y, |x, y| {
        let offset = 3 * (y * res_x + x) as usize;
        Rgb([
            clamp_byte(rgb[offset]),
            clamp_byte(rgb[offset + 1]),
            clamp_byte(rgb[offset + 2]),
        ])
    });

    match imgbuf.save_with_format(path, image_format) {
        Ok(()) => Ok(()),
        Err(err) => Err(format!("Error saving output image {path}: {err}.")),
    }
}

/// Applies the sRGB transfer curve to a linear value.
///
/// * `value` - Linear value.
#[inline]
pub fn gamma_correct(value: Float) -> Float {
    if value <= 0.0031308 {
        12.92 * value
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

/// Clamp floating point value to 8-bit range [0, 255].
///
/// * `v` - Value to clamp.
#[inline]
fn clamp_byte(v: Float) -> u8 {
    clamp(255.0 * gamma_correct(v) + 0.5, 0.0, 255.0) as u8
}

// ---- Tests ----
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamma_curve_end_points() {
        assert_eq!(clamp_byte(0.0), 0);
        assert_eq!(clamp_byte(1.0), 255);
        assert_eq!(clamp_byte(7.0), 255);
        assert_eq!(clamp_byte(-1.0), 0);
        assert!(gamma_correct(0.5) > 0.5);
    }

    #[test]
    fn rejects_bad_input() {
        let rgb = vec![0.0; 12];
        assert!(write_image("out.png", &rgb, &Point2i::new(3, 3)).is_err());
        assert!(write_image("out.tiff", &rgb, &Point2i::new(2, 2)).is_err());
        assert!(write_image("out", &rgb, &Point2i::new(2, 2)).is_err());
    }

    #[test]
    fn writes_both_formats() {
        let dir = std::env::temp_dir();
        let rgb: Vec<Float> = (0..12).map(|i| i as Float / 12.0).collect();
        for name in ["tof_image_io_test.exr", "tof_image_io_test.png"] {
            let path = dir.join(name);
            let path = path.to_str().unwrap();
            write_image(path, &rgb, &Point2i::new(2, 2)).unwrap();
            assert!(std::fs::metadata(path).unwrap().len() > 0);
            std::fs::remove_file(path).unwrap();
        }
    }
}
