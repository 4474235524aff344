//! Page loading: raster image files through the `image` crate, PDFs by
//! pulling their embedded image XObjects out with `lopdf`.

use crate::error::OcrError;
use image::{DynamicImage, GrayImage, RgbImage};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Decode every page of `path`, in document order
pub fn load_pages(path: &Path) -> Result<Vec<DynamicImage>, OcrError> {
    if !path.is_file() {
        return Err(OcrError::MissingFile(path.display().to_string()));
    }

    if is_pdf(path)? {
        let pages = extract_images_from_pdf(path)?;
        if pages.is_empty() {
            return Err(OcrError::UnsupportedFormat(format!(
                "{} contains no decodable page images",
                path.display()
            )));
        }
        tracing::debug!("Extracted {} page image(s) from {:?}", pages.len(), path);
        return Ok(pages);
    }

    let image = image::open(path)?;
    tracing::debug!(
        "Decoded {:?}: {}x{} {:?}",
        path,
        image.width(),
        image.height(),
        image.color()
    );
    Ok(vec![image])
}

/// Check if a file is a PDF by extension or its `%PDF-` magic bytes
pub fn is_pdf(path: &Path) -> Result<bool, OcrError> {
    if path
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
    {
        return Ok(true);
    }

    let mut file = File::open(path).map_err(|e| OcrError::ProcessingError(format!("Failed to open file: {}", e)))?;

    let mut magic = [0u8; 5];
    if file.read_exact(&mut magic).is_ok() {
        return Ok(&magic == b"%PDF-");
    }

    Ok(false)
}

/// Colour spaces an embedded page image can be decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PdfColorSpace {
    Gray,
    Rgb,
    Cmyk,
}

impl PdfColorSpace {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"DeviceGray" | b"CalGray" => Some(PdfColorSpace::Gray),
            b"DeviceRGB" | b"CalRGB" | b"ICCBased" => Some(PdfColorSpace::Rgb),
            b"DeviceCMYK" => Some(PdfColorSpace::Cmyk),
            _ => None,
        }
    }

    fn components(self) -> usize {
        match self {
            PdfColorSpace::Gray => 1,
            PdfColorSpace::Rgb => 3,
            PdfColorSpace::Cmyk => 4,
        }
    }
}

fn extract_images_from_pdf(path: &Path) -> Result<Vec<DynamicImage>, OcrError> {
    let doc = lopdf::Document::load(path).map_err(|e| OcrError::ProcessingError(format!("Failed to load PDF: {}", e)))?;
    let masks = mask_ids(&doc);

    let mut images = Vec::new();
    for (page_number, page_id) in doc.get_pages() {
        for (name, image_id, stream) in page_images(&doc, page_id) {
            if image_id.is_some_and(|id| masks.contains(&id)) {
                continue;
            }
            match decode_image_stream(&doc, stream) {
                Ok(img) => images.push(img),
                Err(e) => tracing::warn!(
                    "Skipping image /{} on page {}: {}",
                    String::from_utf8_lossy(&name),
                    page_number,
                    e
                ),
            }
        }
    }

    Ok(images)
}

fn resolve<'d>(doc: &'d lopdf::Document, object: &'d lopdf::Object) -> Option<&'d lopdf::Object> {
    match object.as_reference() {
        Ok(id) => doc.get_object(id).ok(),
        Err(_) => Some(object),
    }
}

/// Objects used as `/SMask` or `/Mask` of another image
fn mask_ids(doc: &lopdf::Document) -> HashSet<lopdf::ObjectId> {
    doc.objects
        .values()
        .filter_map(|object| object.as_stream().ok())
        .flat_map(|stream| {
            [b"SMask".as_slice(), b"Mask".as_slice()]
                .into_iter()
                .filter_map(move |key| stream.dict.get(key).ok()?.as_reference().ok())
        })
        .collect()
}

/// Resources of a page, inherited from its ancestors when the page has none
fn page_resources(doc: &lopdf::Document, page_id: lopdf::ObjectId) -> Option<&lopdf::Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    // bounded walk up the page tree
    for _ in 0..64 {
        if let Some(resources) = node
            .get(b"Resources")
            .ok()
            .and_then(|r| resolve(doc, r))
            .and_then(|r| r.as_dict().ok())
        {
            return Some(resources);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Image XObjects a page draws, in resource-dictionary order
fn page_images(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Vec<(Vec<u8>, Option<lopdf::ObjectId>, &lopdf::Stream)> {
    let Some(xobjects) = page_resources(doc, page_id)
        .and_then(|resources| resources.get(b"XObject").ok())
        .and_then(|x| resolve(doc, x))
        .and_then(|x| x.as_dict().ok())
    else {
        return Vec::new();
    };

    xobjects
        .iter()
        .filter_map(|(name, value)| {
            let id = value.as_reference().ok();
            let stream = resolve(doc, value)?.as_stream().ok()?;
            let is_image = stream
                .dict
                .get(b"Subtype")
                .and_then(|s| s.as_name())
                .is_ok_and(|subtype| subtype == b"Image");
            is_image.then(|| (name.clone(), id, stream))
        })
        .collect()
}

fn dict_u32(stream: &lopdf::Stream, key: &[u8]) -> Option<u32> {
    stream
        .dict
        .get(key)
        .ok()
        .and_then(|v| v.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
}

fn decode_image_stream(doc: &lopdf::Document, stream: &lopdf::Stream) -> Result<DynamicImage, OcrError> {
    // JPEG-compressed scans carry a complete JPEG file as their content
    if stream_filter(stream).as_deref() == Some(b"DCTDecode".as_slice()) {
        return Ok(image::load_from_memory(&stream.content)?);
    }

    let width = dict_u32(stream, b"Width").ok_or_else(|| OcrError::ProcessingError("Missing image width".to_string()))?;
    let height =
        dict_u32(stream, b"Height").ok_or_else(|| OcrError::ProcessingError("Missing image height".to_string()))?;
    let bits = dict_u32(stream, b"BitsPerComponent").unwrap_or(8);

    let color_space = color_space_name(doc, stream);
    let space = PdfColorSpace::from_name(color_space.as_bytes())
        .ok_or_else(|| OcrError::UnsupportedFormat(format!("PDF color space {}", color_space)))?;

    let data = match stream_filter(stream) {
        None => Cow::Borrowed(stream.content.as_slice()),
        Some(_) => Cow::Owned(
            stream
                .decompressed_content()
                .map_err(|e| OcrError::ProcessingError(format!("Failed to decompress image: {}", e)))?,
        ),
    };

    decode_samples(&data, width, height, bits, space)
}

fn stream_filter(stream: &lopdf::Stream) -> Option<Vec<u8>> {
    let filter = stream.dict.get(b"Filter").ok()?;
    if let Ok(name) = filter.as_name() {
        return Some(name.to_vec());
    }
    filter
        .as_array()
        .ok()?
        .last()
        .and_then(|f| f.as_name().ok())
        .map(|n| n.to_vec())
}

/// Turn decompressed sample data into an image
fn decode_samples(
    data: &[u8],
    width: u32,
    height: u32,
    bits: u32,
    space: PdfColorSpace,
) -> Result<DynamicImage, OcrError> {
    let pixels = width as usize * height as usize;

    if space == PdfColorSpace::Gray && bits == 1 {
        // 1-bit rows are byte aligned; a set bit is white in DeviceGray
        let row_bytes = (width as usize).div_ceil(8);
        if data.len() < row_bytes * height as usize {
            return Err(OcrError::ProcessingError("Truncated 1-bit image data".to_string()));
        }
        let gray = GrayImage::from_fn(width, height, |x, y| {
            let byte = data[y as usize * row_bytes + x as usize / 8];
            let white = byte & (0x80 >> (x % 8)) != 0;
            image::Luma([if white { 255 } else { 0 }])
        });
        return Ok(DynamicImage::ImageLuma8(gray));
    }

    if bits != 8 {
        return Err(OcrError::UnsupportedFormat(format!(
            "{} bits per component in {:?} image",
            bits, space
        )));
    }

    let needed = pixels * space.components();
    if data.len() < needed {
        return Err(OcrError::ProcessingError(format!(
            "Image data holds {} bytes, {}x{} {:?} needs {}",
            data.len(),
            width,
            height,
            space,
            needed
        )));
    }
    let data = &data[..needed];

    let image = match space {
        PdfColorSpace::Gray => GrayImage::from_raw(width, height, data.to_vec()).map(DynamicImage::ImageLuma8),
        PdfColorSpace::Rgb => RgbImage::from_raw(width, height, data.to_vec()).map(DynamicImage::ImageRgb8),
        PdfColorSpace::Cmyk => {
            let rgb = data
                .chunks_exact(4)
                .flat_map(|px| {
                    let k = 1.0 - px[3] as f32 / 255.0;
                    [px[0], px[1], px[2]].map(|c| ((1.0 - c as f32 / 255.0) * k * 255.0) as u8)
                })
                .collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
    };

    image.ok_or_else(|| OcrError::ProcessingError(format!("Invalid {:?} image data", space)))
}

/// Colour space name of an image stream, following one indirect reference
/// and taking the family name of array forms like `[/ICCBased 12 0 R]`
fn color_space_name(doc: &lopdf::Document, stream: &lopdf::Stream) -> String {
    fn name_of(object: &lopdf::Object) -> Option<String> {
        if let Ok(name) = object.as_name() {
            return Some(String::from_utf8_lossy(name).to_string());
        }
        let first = object.as_array().ok()?.first()?;
        first.as_name().ok().map(|n| String::from_utf8_lossy(n).to_string())
    }

    let Ok(object) = stream.dict.get(b"ColorSpace") else {
        return "DeviceRGB".to_string();
    };

    if let Some(name) = name_of(object) {
        return name;
    }

    object
        .as_reference()
        .ok()
        .and_then(|id| doc.get_object(id).ok())
        .and_then(name_of)
        .unwrap_or_else(|| "DeviceRGB".to_string())
}
