//! 3DMF texture pixel handling
//!
//! The games' metafiles store 16-bit 1-5-5-5 texels with the alpha bit
//! on top; the renderer wants 5-5-5-1 with alpha in the low bit. The
//! swizzle here is a genuine bit rearrangement, not an involution on the
//! raw 16-bit value.

/// Convert one 1-5-5-5 texel (alpha in bit 15) to 5-5-5-1 (alpha in bit
/// 0). With `preserve_alpha` the source alpha bit is carried over;
/// otherwise the texel is known opaque and the bit is forced on.
#[must_use]
pub fn swizzle_1555_to_5551(texel: u16, preserve_alpha: bool) -> u16 {
    let rgb = texel << 1;
    let alpha = if preserve_alpha { texel >> 15 } else { 1 };
    rgb | alpha
}

/// Drop row padding: copy `width` texels per row out of rows of
/// `row_bytes` bytes.
pub(super) fn trim_row_padding(data: &[u8], width: usize, height: usize, row_bytes: usize) -> Vec<u8> {
    let tight = width * 2;
    if row_bytes == tight {
        return data[..tight * height].to_vec();
    }
    let mut out = Vec::with_capacity(tight * height);
    for row in 0..height {
        let start = row * row_bytes;
        out.extend_from_slice(&data[start..start + tight]);
    }
    out
}

/// Bleed opaque colours into adjacent fully transparent texels, along
/// both axes, leaving the alpha bit off. Bilinear sampling at a
/// transparency boundary otherwise blends toward the (usually black)
/// transparent texel and produces a dark fringe.
pub(super) fn pad_transparent_edges(texels: &mut [u16], width: usize, height: usize) {
    let opaque = |t: u16| t & 1 != 0;
    let bleed = |t: u16| t & !1;

    // Only untouched transparent-black texels are candidates; a texel
    // already bled in the horizontal pass keeps its colour.
    // Horizontal pass: prefer the left neighbour.
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            if texels[i] != 0 {
                continue;
            }
            if x > 0 && opaque(texels[i - 1]) {
                texels[i] = bleed(texels[i - 1]);
            } else if x + 1 < width && opaque(texels[i + 1]) {
                texels[i] = bleed(texels[i + 1]);
            }
        }
    }

    // Vertical pass: prefer the upper neighbour.
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            if texels[i] != 0 {
                continue;
            }
            if y > 0 && opaque(texels[i - width]) {
                texels[i] = bleed(texels[i - width]);
            } else if y + 1 < height && opaque(texels[i + width]) {
                texels[i] = bleed(texels[i + width]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swizzle_moves_rgb_up_one_bit() {
        for texel in [0x0000u16, 0x7FFF, 0x8000, 0xABCD, 0xFFFF] {
            let out = swizzle_1555_to_5551(texel, true);
            assert_eq!(out & !1, (texel << 1) & !1, "rgb bits for {texel:#06x}");
            assert_eq!(out & 1, texel >> 15, "alpha bit for {texel:#06x}");
        }
    }

    #[test]
    fn test_swizzle_forces_alpha_when_opaque() {
        for texel in [0x0000u16, 0x7FFF, 0x8000, 0xFFFF] {
            assert_eq!(swizzle_1555_to_5551(texel, false) & 1, 1);
        }
    }

    #[test]
    fn test_trim_row_padding() {
        // 2 texels per row, rows padded to 6 bytes.
        let data = [1, 2, 3, 4, 0xEE, 0xEE, 5, 6, 7, 8, 0xEE, 0xEE];
        let tight = trim_row_padding(&data, 2, 2, 6);
        assert_eq!(tight, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_edge_padding_bleeds_colour_without_alpha() {
        // One opaque red texel surrounded by transparent black.
        let red = (31u16 << 11) | 1;
        let mut texels = vec![0u16; 9];
        texels[4] = red;
        pad_transparent_edges(&mut texels, 3, 3);
        // Direct neighbours picked up the colour with alpha off.
        assert_eq!(texels[3], red & !1);
        assert_eq!(texels[5], red & !1);
        assert_eq!(texels[1], red & !1);
        assert_eq!(texels[7], red & !1);
        // The centre stays opaque.
        assert_eq!(texels[4], red);
    }
}
