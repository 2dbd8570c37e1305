//! PNG post-processing for rendered diagrams.
//!
//! Chrome screenshots arrive as RGBA. Telegram clients show transparent
//! regions as black in some themes, so the image is flattened onto an
//! opaque white background before it is sent.

use std::io::Cursor;

use image::{ImageFormat, RgbImage};

/// Flatten a PNG onto a white background and re-encode it.
///
/// Images without an alpha channel are re-encoded as-is. If the bytes
/// cannot be decoded or encoded the original input is returned unchanged;
/// a screenshot that fails optimization is still worth sending.
pub fn flatten_onto_white(png: &[u8]) -> Vec<u8> {
    match try_flatten(png) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Failed to optimize image: {}", e);
            png.to_vec()
        }
    }
}

fn try_flatten(png: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let decoded = image::load_from_memory(png)?;

    let mut out = Vec::new();
    if decoded.color().has_alpha() {
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut flat = RgbImage::new(width, height);
        for (x, y, pixel) in rgba.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            let a = u32::from(a);
            let blend = |c: u8| (((u32::from(c) * a) + 255 * (255 - a)) / 255) as u8;
            flat.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
        }
        flat.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    } else {
        decoded.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    }

    Ok(out)
}
