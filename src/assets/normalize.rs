//! Letterbox/pillarbox fitting of decoded images into the output canvas.

use image::imageops::FilterType;

use crate::assets::decode::DecodedImage;
use crate::foundation::core::Canvas;
use crate::foundation::error::{MontageError, MontageResult};

/// An opaque RGB8 frame whose size always equals the output canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedFrame {
    canvas: Canvas,
    pixels: image::RgbImage,
}

impl NormalizedFrame {
    /// Wrap `pixels`, rejecting buffers that do not match `canvas`.
    pub fn from_rgb(canvas: Canvas, pixels: image::RgbImage) -> MontageResult<Self> {
        if pixels.dimensions() != (canvas.width, canvas.height) {
            return Err(MontageError::validation(format!(
                "normalized frame is {}x{}, expected {}x{}",
                pixels.width(),
                pixels.height(),
                canvas.width,
                canvas.height
            )));
        }
        Ok(Self { canvas, pixels })
    }

    /// A solid-color frame.
    pub fn solid(canvas: Canvas, rgb: [u8; 3]) -> Self {
        Self {
            canvas,
            pixels: image::RgbImage::from_pixel(canvas.width, canvas.height, image::Rgb(rgb)),
        }
    }

    /// Canvas this frame was normalized to.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Borrow the pixel buffer.
    pub fn pixels(&self) -> &image::RgbImage {
        &self.pixels
    }

    /// Tightly packed RGB8 bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

/// Size of a `src_w × src_h` image scaled by `min(W/src_w, H/src_h)`.
///
/// Integer math with floor rounding; each side is at least one pixel and never exceeds the canvas.
pub fn fit_dimensions(src_w: u32, src_h: u32, canvas: Canvas) -> (u32, u32) {
    let (sw, sh) = (u64::from(src_w.max(1)), u64::from(src_h.max(1)));
    let (cw, ch) = (u64::from(canvas.width), u64::from(canvas.height));

    if sw * ch > sh * cw {
        let h = (sh * cw / sw).clamp(1, ch);
        (canvas.width, h as u32)
    } else {
        let w = (sw * ch / sh).clamp(1, cw);
        (w as u32, canvas.height)
    }
}

/// Fit `image` entirely inside `canvas`, centered on black. Never crops.
#[tracing::instrument(skip(image), fields(source = %image.source_ref, w = image.width(), h = image.height()))]
pub fn normalize_image(image: &DecodedImage, canvas: Canvas) -> MontageResult<NormalizedFrame> {
    normalize_rgb(&image.rgb, canvas)
}

/// Fit raw RGB pixels inside `canvas`; see [`normalize_image`].
pub fn normalize_rgb(rgb: &image::RgbImage, canvas: Canvas) -> MontageResult<NormalizedFrame> {
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(MontageError::validation("cannot normalize an empty image"));
    }
    if rgb.dimensions() == (canvas.width, canvas.height) {
        return NormalizedFrame::from_rgb(canvas, rgb.clone());
    }

    let (fit_w, fit_h) = fit_dimensions(rgb.width(), rgb.height(), canvas);
    let resized;
    let fitted = if rgb.dimensions() == (fit_w, fit_h) {
        rgb
    } else {
        resized = image::imageops::resize(rgb, fit_w, fit_h, FilterType::Lanczos3);
        &resized
    };

    let mut out = image::RgbImage::new(canvas.width, canvas.height);
    let x = i64::from((canvas.width - fit_w) / 2);
    let y = i64::from((canvas.height - fit_h) / 2);
    image::imageops::replace(&mut out, fitted, x, y);

    tracing::debug!(fit_w, fit_h, x, y, "fitted image into canvas");
    NormalizedFrame::from_rgb(canvas, out)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/normalize.rs"]
mod tests;
