//! Truevision TGA decoding
//!
//! Decodes the baseline, RLE, and colour-mapped TGA variants found in the
//! source games' asset folders into a uniform pixel buffer plus a
//! [`PixelFormat`] tag. Right-to-left and bottom-to-top orientations are
//! not implemented and fail fatally rather than producing a flipped image.

use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::mesh::PixelFormat;

// TGA image type bytes.
const TYPE_COLOR_MAPPED: u8 = 1;
const TYPE_TRUE_COLOR: u8 = 2;
const TYPE_GREYSCALE: u8 = 3;
const TYPE_COLOR_MAPPED_RLE: u8 = 9;
const TYPE_TRUE_COLOR_RLE: u8 = 10;
const TYPE_GREYSCALE_RLE: u8 = 11;

/// A decoded TGA image.
#[derive(Debug)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed pixels, top-left origin.
    pub pixels: Vec<u8>,
    /// Layout of `pixels`.
    pub pixel_format: PixelFormat,
}

/// 18-byte TGA header; all multi-byte fields little-endian.
#[derive(Debug)]
struct TgaHeader {
    id_length: u8,
    color_map_type: u8,
    image_type: u8,
    color_map_origin: u16,
    color_map_length: u16,
    color_map_depth: u8,
    width: u16,
    height: u16,
    pixel_depth: u8,
    image_descriptor: u8,
}

impl TgaHeader {
    fn read(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let id_length = cursor.read_u8()?;
        let color_map_type = cursor.read_u8()?;
        let image_type = cursor.read_u8()?;
        let color_map_origin = cursor.read_u16::<LittleEndian>()?;
        let color_map_length = cursor.read_u16::<LittleEndian>()?;
        let color_map_depth = cursor.read_u8()?;
        let _x_origin = cursor.read_u16::<LittleEndian>()?;
        let _y_origin = cursor.read_u16::<LittleEndian>()?;
        let width = cursor.read_u16::<LittleEndian>()?;
        let height = cursor.read_u16::<LittleEndian>()?;
        let pixel_depth = cursor.read_u8()?;
        let image_descriptor = cursor.read_u8()?;
        Ok(Self {
            id_length,
            color_map_type,
            image_type,
            color_map_origin,
            color_map_length,
            color_map_depth,
            width,
            height,
            pixel_depth,
            image_descriptor,
        })
    }
}

/// Format-selection table: (greyscale?, bytes per pixel, alpha bits) as
/// observed in the shipped assets. Anything else is unsupported.
fn select_format(greyscale: bool, bytes_per_pixel: usize, alpha_bits: u8) -> Option<PixelFormat> {
    match (greyscale, bytes_per_pixel, alpha_bits) {
        (true, 1, 0) => Some(PixelFormat::Grey8),
        (true, 2, 0) => Some(PixelFormat::Grey16),
        (true, 2, 8) => Some(PixelFormat::GreyAlpha88),
        (false, 2, 0 | 1) => Some(PixelFormat::Rgba5551),
        (false, 3, 0) => Some(PixelFormat::Rgb888),
        (false, 4, 8) => Some(PixelFormat::Rgba8888),
        _ => None,
    }
}

/// Decode a TGA buffer.
pub fn decode(data: &[u8]) -> Result<DecodedImage> {
    let mut cursor = Cursor::new(data);
    let header = TgaHeader::read(&mut cursor)?;

    let rle = match header.image_type {
        TYPE_COLOR_MAPPED | TYPE_TRUE_COLOR | TYPE_GREYSCALE => false,
        TYPE_COLOR_MAPPED_RLE | TYPE_TRUE_COLOR_RLE | TYPE_GREYSCALE_RLE => true,
        other => return Err(Error::UnsupportedTgaImageType(other)),
    };
    let color_mapped =
        header.image_type == TYPE_COLOR_MAPPED || header.image_type == TYPE_COLOR_MAPPED_RLE;
    let greyscale =
        header.image_type == TYPE_GREYSCALE || header.image_type == TYPE_GREYSCALE_RLE;

    // Bits 4-5 of the descriptor: bit 4 = right-to-left, bit 5 = top origin.
    // Only top-left origin images are handled.
    if header.image_descriptor & 0x10 != 0 || header.image_descriptor & 0x20 == 0 {
        return Err(Error::UnsupportedTgaOrientation(header.image_descriptor));
    }

    let alpha_bits = header.image_descriptor & 0x0F;
    let stored_depth = if color_mapped {
        header.color_map_depth
    } else {
        header.pixel_depth
    };
    let bytes_per_pixel = usize::from(stored_depth.div_ceil(8));
    let format = select_format(greyscale, bytes_per_pixel, alpha_bits).ok_or(
        Error::UnsupportedTgaDepth {
            image_type: header.image_type,
            depth: stored_depth,
        },
    )?;

    // Skip the image id field.
    cursor.seek(SeekFrom::Current(i64::from(header.id_length)))?;

    // Read out the palette, if any.
    let palette = if header.color_map_type == 1 {
        let entry_bytes = usize::from(header.color_map_depth.div_ceil(8));
        let mut palette = vec![0u8; usize::from(header.color_map_length) * entry_bytes];
        cursor.read_exact(&mut palette)?;
        Some(palette)
    } else {
        None
    };
    if color_mapped && palette.is_none() {
        return Err(Error::InvalidTgaColorMap("colour-mapped image without a colour map"));
    }

    let width = usize::from(header.width);
    let height = usize::from(header.height);
    let pixel_count = width * height;
    let index_bytes = usize::from(header.pixel_depth.div_ceil(8));

    // Stored stream: palette indices for colour-mapped images, pixel
    // values otherwise.
    let stream_value_size = if color_mapped { index_bytes } else { bytes_per_pixel };
    let stream = if rle {
        decode_rle(&mut cursor, pixel_count, stream_value_size)?
    } else {
        let mut raw = vec![0u8; pixel_count * stream_value_size];
        cursor.read_exact(&mut raw)?;
        raw
    };

    let mut pixels = if color_mapped {
        expand_color_map(
            &stream,
            index_bytes,
            palette.as_deref().unwrap_or_default(),
            usize::from(header.color_map_origin),
            bytes_per_pixel,
        )?
    } else {
        stream
    };

    match format {
        PixelFormat::Rgba5551 | PixelFormat::Grey16 | PixelFormat::GreyAlpha88 => {
            swap_u16_pixels(&mut pixels);
            if format == PixelFormat::Rgba5551 && alpha_bits == 0 {
                // No alpha channel in the file: force the implicit bit on.
                force_alpha_bit(&mut pixels);
            }
        }
        PixelFormat::Rgb888 => swizzle_bgr(&mut pixels, 3),
        PixelFormat::Rgba8888 => swizzle_bgr(&mut pixels, 4),
        PixelFormat::Grey8 => {}
    }

    tracing::debug!(width, height, ?format, rle, "decoded TGA image");
    Ok(DecodedImage {
        width: header.width.into(),
        height: header.height.into(),
        pixels,
        pixel_format: format,
    })
}

/// Standard TGA RLE: high bit of the packet header selects repeat vs raw,
/// low 7 bits hold the count minus one. A packet running past the last
/// pixel is malformed.
fn decode_rle(
    cursor: &mut Cursor<&[u8]>,
    pixel_count: usize,
    value_size: usize,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(pixel_count * value_size);
    let mut value = vec![0u8; value_size];
    while out.len() < pixel_count * value_size {
        let packet = cursor.read_u8()?;
        let count = usize::from(packet & 0x7F) + 1;
        if out.len() + count * value_size > pixel_count * value_size {
            return Err(Error::TgaRleOverrun {
                expected: pixel_count,
                actual: out.len() / value_size + count,
            });
        }
        if packet & 0x80 != 0 {
            // Repeat packet: one value replicated.
            cursor.read_exact(&mut value)?;
            for _ in 0..count {
                out.extend_from_slice(&value);
            }
        } else {
            // Raw packet: literal values.
            for _ in 0..count {
                cursor.read_exact(&mut value)?;
                out.extend_from_slice(&value);
            }
        }
    }
    Ok(out)
}

/// Expand palette indices into pixel values.
fn expand_color_map(
    indices: &[u8],
    index_bytes: usize,
    palette: &[u8],
    origin: usize,
    entry_bytes: usize,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity((indices.len() / index_bytes) * entry_bytes);
    for chunk in indices.chunks_exact(index_bytes) {
        let index = match index_bytes {
            1 => usize::from(chunk[0]),
            2 => usize::from(u16::from_le_bytes([chunk[0], chunk[1]])),
            _ => return Err(Error::InvalidTgaColorMap("index wider than 16 bits")),
        };
        let index = index
            .checked_sub(origin)
            .ok_or(Error::InvalidTgaColorMap("index below colour map origin"))?;
        let start = index * entry_bytes;
        let entry = palette
            .get(start..start + entry_bytes)
            .ok_or(Error::InvalidTgaColorMap("index past end of colour map"))?;
        out.extend_from_slice(entry);
    }
    Ok(out)
}

/// Byte-swap 16-bit pixels in place.
fn swap_u16_pixels(pixels: &mut [u8]) {
    for chunk in pixels.chunks_exact_mut(2) {
        chunk.swap(0, 1);
    }
}

/// Force the low alpha bit on for 5-5-5-1 pixels (big-endian pairs after
/// the swap).
fn force_alpha_bit(pixels: &mut [u8]) {
    for chunk in pixels.chunks_exact_mut(2) {
        chunk[1] |= 0x01;
    }
}

/// BGR(A) -> RGB(A) in place.
fn swizzle_bgr(pixels: &mut [u8], stride: usize) {
    for chunk in pixels.chunks_exact_mut(stride) {
        chunk.swap(0, 2);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// 18-byte header for a top-left-origin image.
    fn header(image_type: u8, width: u16, height: u16, depth: u8, descriptor: u8) -> Vec<u8> {
        let mut h = vec![0u8; 18];
        h[2] = image_type;
        h[12..14].copy_from_slice(&width.to_le_bytes());
        h[14..16].copy_from_slice(&height.to_le_bytes());
        h[16] = depth;
        h[17] = descriptor;
        h
    }

    #[test]
    fn test_uncompressed_rgba_round_trip() {
        // 2x2 BGRA pixels.
        let mut data = header(TYPE_TRUE_COLOR, 2, 2, 32, 0x28);
        let bgra = [
            [255u8, 0, 0, 255], // blue
            [0, 255, 0, 255],   // green
            [0, 0, 255, 255],   // red
            [10, 20, 30, 40],
        ];
        for px in &bgra {
            data.extend_from_slice(px);
        }
        let image = decode(&data).unwrap();
        assert_eq!(image.width, 2);
        assert_eq!(image.height, 2);
        assert_eq!(image.pixel_format, PixelFormat::Rgba8888);
        assert_eq!(
            image.pixels,
            vec![0, 0, 255, 255, 0, 255, 0, 255, 255, 0, 0, 255, 30, 20, 10, 40]
        );
    }

    #[test]
    fn test_rle_repeat_packet() {
        // 4 identical pixels from one repeat packet.
        let mut data = header(TYPE_TRUE_COLOR_RLE, 2, 2, 32, 0x28);
        data.push(0x80 | 3); // repeat, count 4
        data.extend_from_slice(&[1, 2, 3, 4]);
        let image = decode(&data).unwrap();
        assert_eq!(image.pixels.chunks_exact(4).count(), 4);
        for px in image.pixels.chunks_exact(4) {
            assert_eq!(px, &[3, 2, 1, 4]);
        }
    }

    #[test]
    fn test_rle_raw_packet() {
        // 4 distinct pixels from one raw packet.
        let mut data = header(TYPE_TRUE_COLOR_RLE, 2, 2, 32, 0x28);
        data.push(3); // raw, count 4
        for i in 0..4u8 {
            data.extend_from_slice(&[i, i, i, i]);
        }
        let image = decode(&data).unwrap();
        for (i, px) in image.pixels.chunks_exact(4).enumerate() {
            let v = i as u8;
            assert_eq!(px, &[v, v, v, v]);
        }
    }

    #[test]
    fn test_rle_mixed_packets_cross_row_boundary() {
        // 2x2: one repeat packet of 2 then one raw packet of 2, the
        // repeat crossing into the second row is fine in TGA RLE.
        let mut data = header(TYPE_TRUE_COLOR_RLE, 2, 2, 32, 0x28);
        data.push(0x80 | 1); // repeat, count 2
        data.extend_from_slice(&[9, 9, 9, 9]);
        data.push(1); // raw, count 2
        data.extend_from_slice(&[1, 1, 1, 1]);
        data.extend_from_slice(&[2, 2, 2, 2]);
        let image = decode(&data).unwrap();
        let px: Vec<&[u8]> = image.pixels.chunks_exact(4).collect();
        assert_eq!(px[0], &[9, 9, 9, 9]);
        assert_eq!(px[1], &[9, 9, 9, 9]);
        assert_eq!(px[2], &[1, 1, 1, 1]);
        assert_eq!(px[3], &[2, 2, 2, 2]);
    }

    #[test]
    fn test_rle_packet_overrunning_image_rejected() {
        // 1x1 image but the repeat packet claims 128 pixels.
        let mut data = header(TYPE_TRUE_COLOR_RLE, 1, 1, 32, 0x28);
        data.push(0x80 | 127); // repeat, count 128
        data.extend_from_slice(&[1, 2, 3, 4]);
        assert!(matches!(
            decode(&data),
            Err(Error::TgaRleOverrun {
                expected: 1,
                actual: 128,
            })
        ));
    }

    #[test]
    fn test_16bit_no_alpha_forces_alpha_bit() {
        // One 16-bit pixel, value 0x7FFE little-endian (alpha bit clear
        // after swap), no alpha bits declared.
        let mut data = header(TYPE_TRUE_COLOR, 1, 1, 16, 0x20);
        data.extend_from_slice(&0x7FFEu16.to_le_bytes());
        let image = decode(&data).unwrap();
        assert_eq!(image.pixel_format, PixelFormat::Rgba5551);
        // Bytes are swapped to big-endian order and the low bit is set.
        assert_eq!(image.pixels, vec![0x7F, 0xFF]);
    }

    #[test]
    fn test_colour_mapped_expansion() {
        // 2x1 image, 8-bit indices into a 2-entry 24-bit palette.
        let mut data = vec![0u8; 18];
        data[0] = 0; // no id
        data[1] = 1; // has colour map
        data[2] = TYPE_COLOR_MAPPED;
        data[3..5].copy_from_slice(&0u16.to_le_bytes()); // origin
        data[5..7].copy_from_slice(&2u16.to_le_bytes()); // length
        data[7] = 24; // entry depth
        data[12..14].copy_from_slice(&2u16.to_le_bytes());
        data[14..16].copy_from_slice(&1u16.to_le_bytes());
        data[16] = 8; // index depth
        data[17] = 0x20;
        data.extend_from_slice(&[10, 20, 30]); // entry 0 (BGR)
        data.extend_from_slice(&[40, 50, 60]); // entry 1
        data.extend_from_slice(&[1, 0]); // indices
        let image = decode(&data).unwrap();
        assert_eq!(image.pixel_format, PixelFormat::Rgb888);
        assert_eq!(image.pixels, vec![60, 50, 40, 30, 20, 10]);
    }

    #[test]
    fn test_bottom_origin_rejected() {
        let data = header(TYPE_TRUE_COLOR, 1, 1, 32, 0x08);
        assert!(matches!(
            decode(&data),
            Err(Error::UnsupportedTgaOrientation(0x08))
        ));
    }

    #[test]
    fn test_unknown_image_type_rejected() {
        let data = header(7, 1, 1, 32, 0x28);
        assert!(matches!(decode(&data), Err(Error::UnsupportedTgaImageType(7))));
    }
}
