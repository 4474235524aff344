//! Image marshalling
//!
//! Converts decoded images into the raw byte layout `TessBaseAPISetImage`
//! expects: row-major, top-to-bottom, with an explicit bytes-per-pixel and
//! bytes-per-line. Only 1, 8, 24 and 32 bit layouts exist natively; every
//! other decoded format is normalized to one of them here, and raw buffers
//! with any other depth are rejected.

use crate::error::OcrError;
use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Native pixel layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PixelLayout {
    /// 1 bit per pixel, packed MSB-first; a set bit is white
    Binary,
    /// 8-bit grayscale
    Gray8,
    /// 8-bit R, G, B
    Rgb24,
    /// 8-bit R, G, B, A
    Rgba32,
}

impl PixelLayout {
    /// Value passed as `bytes_per_pixel` (0 for packed binary)
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelLayout::Binary => 0,
            PixelLayout::Gray8 => 1,
            PixelLayout::Rgb24 => 3,
            PixelLayout::Rgba32 => 4,
        }
    }

    pub fn bits_per_pixel(self) -> u32 {
        match self {
            PixelLayout::Binary => 1,
            other => other.bytes_per_pixel() * 8,
        }
    }

    /// Smallest valid row stride for an image of `width` pixels
    pub fn min_bytes_per_line(self, width: u32) -> usize {
        (width as usize * self.bits_per_pixel() as usize).div_ceil(8)
    }

    pub fn from_bytes_per_pixel(bytes_per_pixel: u32) -> Result<Self, OcrError> {
        match bytes_per_pixel {
            0 => Ok(PixelLayout::Binary),
            1 => Ok(PixelLayout::Gray8),
            3 => Ok(PixelLayout::Rgb24),
            4 => Ok(PixelLayout::Rgba32),
            other => Err(OcrError::UnsupportedFormat(format!(
                "{} bits per pixel (supported: 1, 8, 24, 32)",
                u64::from(other) * 8
            ))),
        }
    }
}

/// A caller-owned pixel region ready to hand to the engine.
///
/// The data is borrowed when the decoded image already has a native layout
/// and owned when it had to be converted.
#[derive(Debug, Clone)]
pub struct PixelBuffer<'a> {
    data: Cow<'a, [u8]>,
    width: u32,
    height: u32,
    layout: PixelLayout,
    bytes_per_line: u32,
}

impl<'a> PixelBuffer<'a> {
    /// Wrap raw pixel data, validating it against the declared geometry
    pub fn from_raw(
        data: impl Into<Cow<'a, [u8]>>,
        width: u32,
        height: u32,
        bytes_per_pixel: u32,
        bytes_per_line: u32,
    ) -> Result<Self, OcrError> {
        let data = data.into();
        let layout = PixelLayout::from_bytes_per_pixel(bytes_per_pixel)?;

        if width == 0 || height == 0 {
            return Err(OcrError::UnsupportedFormat(format!(
                "empty image ({}x{})",
                width, height
            )));
        }

        let min_line = layout.min_bytes_per_line(width);
        if (bytes_per_line as usize) < min_line {
            return Err(OcrError::UnsupportedFormat(format!(
                "bytes per line {} is smaller than one row ({} bytes)",
                bytes_per_line, min_line
            )));
        }

        let needed = (bytes_per_line as usize).saturating_mul(height as usize);
        if data.len() < needed {
            return Err(OcrError::UnsupportedFormat(format!(
                "buffer holds {} bytes, {}x{} at {} bytes per line needs {}",
                data.len(),
                width,
                height,
                bytes_per_line,
                needed
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            layout,
            bytes_per_line,
        })
    }

    /// Marshal a decoded image, borrowing its pixels when possible
    pub fn from_image(image: &'a DynamicImage) -> Result<Self, OcrError> {
        let (width, height) = (image.width(), image.height());

        let (data, layout): (Cow<'a, [u8]>, PixelLayout) = match image {
            DynamicImage::ImageLuma8(img) => (Cow::Borrowed(img.as_raw().as_slice()), PixelLayout::Gray8),
            DynamicImage::ImageRgb8(img) => (Cow::Borrowed(img.as_raw().as_slice()), PixelLayout::Rgb24),
            DynamicImage::ImageRgba8(img) => (Cow::Borrowed(img.as_raw().as_slice()), PixelLayout::Rgba32),
            DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
                (Cow::Owned(image.to_luma8().into_raw()), PixelLayout::Gray8)
            }
            DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_) => {
                (Cow::Owned(image.to_rgb8().into_raw()), PixelLayout::Rgb24)
            }
            _ => (Cow::Owned(image.to_rgba8().into_raw()), PixelLayout::Rgba32),
        };

        tracing::debug!(
            "Marshalled {}x{} image as {:?} ({})",
            width,
            height,
            layout,
            if matches!(data, Cow::Borrowed(_)) { "borrowed" } else { "converted" }
        );

        let bytes_per_line = layout.min_bytes_per_line(width) as u32;
        Self::from_raw(data, width, height, layout.bytes_per_pixel(), bytes_per_line)
    }

    /// Pack a grayscale image into 1-bit rows; pixels brighter than
    /// `threshold` become white
    pub fn binary(gray: &GrayImage, threshold: u8) -> Result<PixelBuffer<'static>, OcrError> {
        let (width, height) = gray.dimensions();
        let bytes_per_line = PixelLayout::Binary.min_bytes_per_line(width);
        let mut data = vec![0u8; bytes_per_line * height as usize];

        for (x, y, pixel) in gray.enumerate_pixels() {
            if pixel.0[0] > threshold {
                let row = y as usize * bytes_per_line;
                data[row + x as usize / 8] |= 0x80 >> (x % 8);
            }
        }

        PixelBuffer::from_raw(data, width, height, 0, bytes_per_line as u32)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.layout.bytes_per_pixel()
    }

    pub fn bytes_per_line(&self) -> u32 {
        self.bytes_per_line
    }

    /// Whole-image rectangle
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn into_owned(self) -> PixelBuffer<'static> {
        PixelBuffer {
            data: Cow::Owned(self.data.into_owned()),
            width: self.width,
            height: self.height,
            layout: self.layout,
            bytes_per_line: self.bytes_per_line,
        }
    }
}

/// Region of interest in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.left.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.top.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersect with a `width` x `height` image
    pub fn clip_to(&self, width: u32, height: u32) -> Result<Rect, OcrError> {
        let right = self.right().min(width);
        let bottom = self.bottom().min(height);

        if self.left >= right || self.top >= bottom {
            return Err(OcrError::InvalidRegion(format!(
                "{} does not intersect the {}x{} image",
                self, width, height
            )));
        }

        Ok(Rect::new(self.left, self.top, right - self.left, bottom - self.top))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.width, self.height)
    }
}

impl FromStr for Rect {
    type Err = OcrError;

    /// Parses `left,top,width,height`
    fn from_str(s: &str) -> Result<Self, OcrError> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| OcrError::InvalidRegion(format!("'{}': {}", s, e)))?;

        match parts.as_slice() {
            [left, top, width, height] => Ok(Rect::new(*left, *top, *width, *height)),
            _ => Err(OcrError::InvalidRegion(format!(
                "'{}' must be left,top,width,height",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, LumaA, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_rgb_is_borrowed_with_tight_stride() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([10, 20, 30]));
        let dynamic = DynamicImage::ImageRgb8(img);

        let buf = PixelBuffer::from_image(&dynamic).unwrap();
        assert_eq!(buf.bytes_per_pixel(), 3);
        assert_eq!(buf.bytes_per_line(), 9);
        assert!(matches!(buf.data, Cow::Borrowed(_)));
        // last pixel of the second row, row-major top-to-bottom
        assert_eq!(&buf.data()[15..18], &[10, 20, 30]);
    }

    #[test]
    fn test_rgba_keeps_channel_order() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(1, 0, Rgba([1, 2, 3, 4]));
        let dynamic = DynamicImage::ImageRgba8(img);

        let buf = PixelBuffer::from_image(&dynamic).unwrap();
        assert_eq!(buf.layout(), PixelLayout::Rgba32);
        assert_eq!(buf.bytes_per_line(), 8);
        assert_eq!(&buf.data()[4..8], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_gray_alpha_and_sixteen_bit_are_normalized() {
        let gray_alpha: ImageBuffer<LumaA<u8>, Vec<u8>> = ImageBuffer::from_pixel(4, 2, LumaA([200, 255]));
        let dynamic = DynamicImage::ImageLumaA8(gray_alpha);
        let buf = PixelBuffer::from_image(&dynamic).unwrap();
        assert_eq!(buf.layout(), PixelLayout::Gray8);
        assert_eq!(buf.data().len(), 8);
        assert!(buf.data().iter().all(|&v| v == 200));

        let deep: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_pixel(2, 2, Luma([u16::MAX]));
        let dynamic = DynamicImage::ImageLuma16(deep);
        let buf = PixelBuffer::from_image(&dynamic).unwrap();
        assert_eq!(buf.layout(), PixelLayout::Gray8);
        assert!(buf.data().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_raw_rejects_unsupported_depth() {
        let err = PixelBuffer::from_raw(vec![0u8; 16], 4, 2, 2, 8).unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_raw_rejects_huge_depth_without_overflow() {
        let err = PixelBuffer::from_raw(vec![0u8; 16], 4, 2, u32::MAX, 8).unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
        assert!(err.to_string().contains("34359738360 bits"), "{}", err);

        let err = PixelBuffer::from_raw(vec![0u8; 16], 4, 2, 1 << 29, 8).unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_raw_rejects_short_stride_and_short_buffer() {
        assert!(PixelBuffer::from_raw(vec![0u8; 32], 4, 2, 3, 11).is_err());
        assert!(PixelBuffer::from_raw(vec![0u8; 20], 4, 2, 3, 12).is_err());
        assert!(PixelBuffer::from_raw(vec![0u8; 0], 0, 2, 1, 0).is_err());
    }

    #[test]
    fn test_raw_accepts_padded_stride() {
        // 24-bit rows padded to four bytes, as BMP stores them
        let buf = PixelBuffer::from_raw(vec![0u8; 24], 3, 2, 3, 12).unwrap();
        assert_eq!(buf.bytes_per_line(), 12);
    }

    #[test]
    fn test_binary_packs_msb_first_with_white_bits() {
        let mut gray = GrayImage::from_pixel(10, 1, Luma([0]));
        gray.put_pixel(0, 0, Luma([255]));
        gray.put_pixel(9, 0, Luma([255]));

        let buf = PixelBuffer::binary(&gray, 127).unwrap();
        assert_eq!(buf.bytes_per_pixel(), 0);
        assert_eq!(buf.bytes_per_line(), 2);
        assert_eq!(buf.data(), &[0b1000_0000, 0b0100_0000]);
    }

    #[test]
    fn test_rect_clips_to_image() {
        let rect = Rect::new(0, 0, 1024, 800).clip_to(640, 480).unwrap();
        assert_eq!(rect, Rect::new(0, 0, 640, 480));

        let err = Rect::new(700, 10, 50, 50).clip_to(640, 480).unwrap_err();
        assert_eq!(err.code(), "INVALID_REGION");
    }

    #[test]
    fn test_rect_parses_from_cli_form() {
        assert_eq!("0, 0,1024,800".parse::<Rect>().unwrap(), Rect::new(0, 0, 1024, 800));
        assert!("1,2,3".parse::<Rect>().is_err());
        assert!("a,b,c,d".parse::<Rect>().is_err());
    }
}
