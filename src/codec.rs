use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{
    core::Canvas,
    error::{InknoteError, InknoteResult},
    surface::Surface,
};

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode a drawing surface as a PNG data URL.
///
/// PNG stores straight alpha, so channels are unpremultiplied on the way
/// out with round-half-up; [`decode_data_url`] premultiplies with the
/// matching rounding, which makes the round trip pixel-exact.
pub fn encode_data_url(surface: &Surface) -> InknoteResult<String> {
    let straight = premul_to_straight(surface.data());
    let img = image::RgbaImage::from_raw(surface.width(), surface.height(), straight)
        .ok_or_else(|| InknoteError::serde("surface byte length mismatch"))?;

    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| InknoteError::serde(format!("png encode failed: {e}")))?;

    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(&png)))
}

/// Decode a PNG data URL back into a premultiplied surface, rejecting
/// payloads whose dimensions do not match the canvas.
pub fn decode_data_url(url: &str, canvas: Canvas) -> InknoteResult<Surface> {
    let b64 = url
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or_else(|| InknoteError::serde("bitmap is not a png data url"))?;
    let png = STANDARD
        .decode(b64)
        .map_err(|e| InknoteError::serde(format!("bitmap base64 decode failed: {e}")))?;

    let img = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
        .map_err(|e| InknoteError::serde(format!("png decode failed: {e}")))?
        .to_rgba8();

    if img.width() != canvas.width || img.height() != canvas.height {
        return Err(InknoteError::serde(format!(
            "bitmap size mismatch: got {}x{}, expected {}x{}",
            img.width(),
            img.height(),
            canvas.width,
            canvas.height
        )));
    }

    let premul = straight_to_premul(&img.into_raw());
    Surface::from_parts(canvas.width, canvas.height, premul)
}

fn premul_to_straight(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for px in data.chunks_exact(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        for &c in &px[..3] {
            // Round-half-up unpremultiply; the exact inverse of the +127/255
            // premultiply used everywhere else in this crate.
            let s = (510 * u32::from(c) + a) / (2 * a);
            out.push(s.min(255) as u8);
        }
        out.push(px[3]);
    }
    out
}

fn straight_to_premul(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for px in data.chunks_exact(4) {
        let a = u16::from(px[3]);
        for &c in &px[..3] {
            out.push((((u16::from(c) * a) + 127) / 255) as u8);
        }
        out.push(px[3]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{Point, Rgba8},
        stroke,
    };

    fn canvas() -> Canvas {
        Canvas {
            width: 64,
            height: 64,
        }
    }

    #[test]
    fn roundtrip_is_pixel_exact_for_antialiased_content() {
        let mut surface = Surface::new(canvas());
        // A slanted stroke produces plenty of fractional-alpha edge pixels.
        stroke::paint_segment(
            &mut surface,
            Point::new(5.3, 8.7),
            Point::new(58.4, 51.2),
            Rgba8::new(200, 40, 40, 255),
            3.0,
        )
        .unwrap();

        let url = encode_data_url(&surface).unwrap();
        assert!(url.starts_with(PNG_DATA_URL_PREFIX));

        let back = decode_data_url(&url, canvas()).unwrap();
        assert_eq!(back.data(), surface.data());
    }

    #[test]
    fn roundtrip_preserves_full_transparency() {
        let surface = Surface::new(canvas());
        let url = encode_data_url(&surface).unwrap();
        let back = decode_data_url(&url, canvas()).unwrap();
        assert!(back.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn decode_rejects_wrong_dimensions() {
        let surface = Surface::new(canvas());
        let url = encode_data_url(&surface).unwrap();
        let err = decode_data_url(
            &url,
            Canvas {
                width: 32,
                height: 32,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("size mismatch"));
    }

    #[test]
    fn decode_rejects_missing_prefix() {
        assert!(decode_data_url("data:image/jpeg;base64,abcd", canvas()).is_err());
        assert!(decode_data_url("not a url", canvas()).is_err());
    }

    #[test]
    fn decode_rejects_garbage_payload() {
        let url = format!("{PNG_DATA_URL_PREFIX}%%%not-base64%%%");
        assert!(decode_data_url(&url, canvas()).is_err());

        let url = format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(b"not a png"));
        assert!(decode_data_url(&url, canvas()).is_err());
    }
}
