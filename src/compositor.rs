//! Flattens the base image and the annotation layer into one raster at the
//! image's native resolution.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::{AnnotateError, Result};

/// Something the compositor can load the base image from.
pub trait ImageSource {
    fn load(&self) -> Result<DynamicImage>;
}

impl ImageSource for Path {
    fn load(&self) -> Result<DynamicImage> {
        image::open(self).map_err(|source| AnnotateError::ImageLoad {
            source_name: self.display().to_string(),
            source,
        })
    }
}

impl ImageSource for PathBuf {
    fn load(&self) -> Result<DynamicImage> {
        self.as_path().load()
    }
}

/// Encoded image bytes held in memory.
pub struct EncodedImage<'a>(pub &'a [u8]);

impl ImageSource for EncodedImage<'_> {
    fn load(&self) -> Result<DynamicImage> {
        image::load_from_memory(self.0).map_err(|source| AnnotateError::ImageLoad {
            source_name: format!("<{} bytes in memory>", self.0.len()),
            source,
        })
    }
}

impl ImageSource for DynamicImage {
    fn load(&self) -> Result<DynamicImage> {
        Ok(self.clone())
    }
}

/// Draw the base image at 1:1 and, if given, the annotation layer
/// stretched to the same native size on top of it.
pub fn composite(
    source: &(impl ImageSource + ?Sized),
    layer: Option<&RgbaImage>,
) -> Result<RgbaImage> {
    let mut out = source.load()?.to_rgba8();
    if let Some(layer) = layer {
        let (w, h) = out.dimensions();
        if layer.dimensions() == (w, h) {
            imageops::overlay(&mut out, layer, 0, 0);
        } else {
            let scaled = scale_layer(layer, w, h);
            imageops::overlay(&mut out, &scaled, 0, 0);
        }
    }
    Ok(out)
}

/// Resize a straight-alpha layer. Filtering runs on premultiplied colour,
/// otherwise transparent black bleeds into the edges of strokes.
fn scale_layer(layer: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut premultiplied = layer.clone();
    for pixel in premultiplied.pixels_mut() {
        let a = u16::from(pixel[3]);
        for c in &mut pixel.0[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }

    let mut scaled = imageops::resize(&premultiplied, width, height, FilterType::Triangle);
    for pixel in scaled.pixels_mut() {
        let a = u32::from(pixel[3]);
        if a == 0 {
            pixel.0 = [0; 4];
            continue;
        }
        for c in &mut pixel.0[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    scaled
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(AnnotateError::Encode)?;
    Ok(bytes.into_inner())
}
