use crate::error::{InknoteError, InknoteResult};

pub type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied RGBA8.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = add_sat_u8(src[i], mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// Destination-out: scale `dst` by the inverse of the coverage alpha.
///
/// This is the eraser compositing rule. Pixels under full coverage become
/// transparent; partial coverage fades them proportionally.
pub fn erase(dst: PremulRgba8, coverage_a: u8) -> PremulRgba8 {
    if coverage_a == 0 {
        return dst;
    }
    if coverage_a == 255 {
        return [0, 0, 0, 0];
    }

    let inv = 255u16 - u16::from(coverage_a);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = mul_div255(u16::from(dst[i]), inv);
    }
    out
}

/// Source-over `src` onto `dst`, pixel by pixel.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> InknoteResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(InknoteError::raster(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Erase `dst` wherever `src` has coverage; only the alpha channel of `src`
/// is consulted.
pub fn erase_in_place(dst: &mut [u8], src: &[u8]) -> InknoteResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(InknoteError::raster(
            "erase_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = erase([d[0], d[1], d[2], d[3]], s[3]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}
