//! Skew correction before recognition.
//!
//! The angle comes from a caller-supplied [`SkewEstimator`]; this module only
//! decides whether the angle is worth acting on and rotates the page.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Estimates how far the text on a page is rotated
pub trait SkewEstimator {
    /// Skew in degrees, positive clockwise
    fn skew_angle(&self, image: &GrayImage) -> f64;
}

impl<F> SkewEstimator for F
where
    F: Fn(&GrayImage) -> f64,
{
    fn skew_angle(&self, image: &GrayImage) -> f64 {
        self(image)
    }
}

/// Outcome of [`correct_skew`]
#[derive(Debug)]
pub struct Deskewed {
    pub image: DynamicImage,
    /// Estimated skew in degrees
    pub angle: f64,
    /// False when the angle was below the threshold and the page was kept as is
    pub rotated: bool,
}

/// Rotate `image` by the estimated skew when it exceeds `min_angle` degrees.
///
/// Corrected pages come back as 8-bit grayscale on a white background; pages
/// below the threshold are returned unchanged.
pub fn correct_skew(image: DynamicImage, estimator: &dyn SkewEstimator, min_angle: f64) -> Deskewed {
    let gray = image.to_luma8();
    let angle = estimator.skew_angle(&gray);

    if !angle.is_finite() || angle.abs() <= min_angle {
        tracing::debug!("Skew {:.3} deg within threshold {}, not rotating", angle, min_angle);
        return Deskewed {
            image,
            angle,
            rotated: false,
        };
    }

    tracing::debug!("Correcting skew of {:.3} deg", angle);
    let background = Luma([255u8]);
    let rotated = rotate_about_center(
        &gray,
        (-angle).to_radians() as f32,
        Interpolation::Bilinear,
        background,
    );

    Deskewed {
        image: DynamicImage::ImageLuma8(rotated),
        angle,
        rotated: true,
    }
}
