//! The constant 1x1 transparent GIF served by the open-tracking pixel endpoint.
//!
//! This must never depend on the database: the pixel is returned even when
//! the tracking id is unknown or a lookup failed, so callers always get a
//! valid image.

/// a minimal, valid, transparent single-pixel GIF89a image.
pub const GIF_1X1_PIXEL: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, // "GIF89a"
    0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, // logical screen descriptor
    0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, // global color table (2 colors)
    0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, // graphic control extension (transparent)
    0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, // image descriptor
    0x02, 0x02, 0x44, 0x01, 0x00, // image data
    0x3B, // trailer
];

pub const GIF_CONTENT_TYPE: &str = "image/gif";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_is_well_formed_gif89a() {
        assert_eq!(&GIF_1X1_PIXEL[0..6], b"GIF89a");
        assert_eq!(*GIF_1X1_PIXEL.last().unwrap(), 0x3B);
        assert_eq!(GIF_1X1_PIXEL.len(), 43);
    }
}
