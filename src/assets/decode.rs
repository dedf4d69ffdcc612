use anyhow::Context as _;

use crate::assets::fetch::FetchedImage;
use crate::foundation::error::{MontageError, MontageResult};
use crate::foundation::math::mul_div255_u8;

/// A decoded source image flattened to opaque RGB8.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    /// Source reference as given by the caller.
    pub source_ref: String,
    /// Length of the encoded input in bytes.
    pub encoded_len: usize,
    /// Opaque RGB pixels at the source resolution.
    pub rgb: image::RgbImage,
}

impl DecodedImage {
    /// Decoded width in pixels.
    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    /// Decoded height in pixels.
    pub fn height(&self) -> u32 {
        self.rgb.height()
    }
}

/// Decode a fetched image and flatten any alpha or palette mode onto black.
pub fn decode_image(fetched: &FetchedImage) -> MontageResult<DecodedImage> {
    let rgb = decode_rgb8(&fetched.bytes)
        .map_err(|e| MontageError::decode(&fetched.source_ref, format!("{e:#}")))?;
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(MontageError::decode(
            &fetched.source_ref,
            "decoded image has zero area",
        ));
    }
    Ok(DecodedImage {
        source_ref: fetched.source_ref.clone(),
        encoded_len: fetched.bytes.len(),
        rgb,
    })
}

fn decode_rgb8(bytes: &[u8]) -> anyhow::Result<image::RgbImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    if !dyn_img.color().has_alpha() {
        return Ok(dyn_img.to_rgb8());
    }

    // Premultiplying by alpha is exactly compositing over black.
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgba8 = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8);

    let mut rgb = Vec::with_capacity((width as usize) * (height as usize) * 3);
    for px in rgba8.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    image::RgbImage::from_raw(width, height, rgb).context("repack rgb8 buffer")
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u8(u16::from(px[0]), a);
        px[1] = mul_div255_u8(u16::from(px[1]), a);
        px[2] = mul_div255_u8(u16::from(px[2]), a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
