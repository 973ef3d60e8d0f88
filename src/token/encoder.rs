//! QR encoding of token payloads.
//!
//! Every token uses the same [`TokenProfile`], so all cards carry symbols of
//! identical version, module count and pixel size.

use base64::Engine;

use super::payload::TokenPayload;
use crate::error::{Error, Result};

/// Prefix of a cached token data URL.
pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Fixed QR profile shared by every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenProfile {
    /// QR symbol version (1..=40)
    pub version: i16,
    /// Byte-mode capacity at this version and error-correction level
    pub capacity: usize,
    /// Pixels per module
    pub module_px: u32,
    /// Quiet zone (border) in modules
    pub quiet_zone: u32,
}

impl TokenProfile {
    /// The process-wide profile: version 13, error correction M.
    pub const STANDARD: TokenProfile = TokenProfile {
        version: 13,
        capacity: 331,
        module_px: 4,
        quiet_zone: 4,
    };

    /// Modules per side of the symbol, excluding the quiet zone.
    pub fn modules(&self) -> u32 {
        17 + 4 * self.version as u32
    }

    /// Pixel size (width = height) of the rendered image.
    pub fn image_px(&self) -> u32 {
        (self.modules() + 2 * self.quiet_zone) * self.module_px
    }
}

impl Default for TokenProfile {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Raster image of an encoded token (8-bit grayscale PNG).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl EncodedImage {
    /// PNG bytes.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Consume the image, returning its PNG bytes.
    pub fn into_png_bytes(self) -> Vec<u8> {
        self.png
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encode as a `data:image/png;base64,` URL.
    pub fn to_data_url(&self) -> String {
        let mut url = String::from(DATA_URL_PREFIX);
        base64::engine::general_purpose::STANDARD.encode_string(&self.png, &mut url);
        url
    }

    /// Decode a cached token from a data URL.
    ///
    /// Anything after the last `;base64,` marker is taken as the image.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let (_, encoded) = url
            .rsplit_once(";base64,")
            .ok_or_else(|| Error::Image("token is not a base64 data URL".to_string()))?;
        let png = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Image(format!("invalid base64 in token: {}", e)))?;
        Self::from_png(png)
    }

    /// Wrap existing PNG bytes, reading the dimensions from the IHDR chunk.
    pub fn from_png(png: Vec<u8>) -> Result<Self> {
        if png.len() < 24 || &png[..8] != PNG_SIGNATURE || &png[12..16] != b"IHDR" {
            return Err(Error::Image("token is not a PNG image".to_string()));
        }
        let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        Ok(Self { png, width, height })
    }
}

/// Stateless token encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenEncoder {
    profile: TokenProfile,
}

impl TokenEncoder {
    /// Create an encoder using [`TokenProfile::STANDARD`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile in use.
    pub fn profile(&self) -> &TokenProfile {
        &self.profile
    }

    /// Encode a payload into a PNG raster.
    ///
    /// Fails with [`Error::PayloadTooLarge`] when the payload exceeds the
    /// profile's byte capacity.
    pub fn encode(&self, payload: &TokenPayload) -> Result<EncodedImage> {
        use qrcode::bits::Bits;
        use qrcode::types::QrError;
        use qrcode::{EcLevel, QrCode, Version};

        let profile = &self.profile;
        if payload.len() > profile.capacity {
            return Err(Error::PayloadTooLarge {
                len: payload.len(),
                capacity: profile.capacity,
            });
        }

        let map_err = |e: QrError| match e {
            QrError::DataTooLong => Error::PayloadTooLarge {
                len: payload.len(),
                capacity: profile.capacity,
            },
            other => Error::Barcode(format!("QR code encoding error: {}", other)),
        };

        // Single byte-mode segment: capacity is exact and independent of content.
        let mut bits = Bits::new(Version::Normal(profile.version));
        bits.push_byte_data(payload.as_str().as_bytes())
            .map_err(map_err)?;
        bits.push_terminator(EcLevel::M).map_err(map_err)?;
        let code = QrCode::with_bits(bits, EcLevel::M).map_err(map_err)?;

        let modules = code.width();
        let size = profile.image_px();
        let module_px = profile.module_px;
        let quiet_px = profile.quiet_zone * module_px;

        let mut img = image::GrayImage::from_pixel(size, size, image::Luma([255u8]));
        for (y, row) in code.to_colors().chunks(modules).enumerate() {
            for (x, &module) in row.iter().enumerate() {
                if module != qrcode::Color::Dark {
                    continue;
                }
                let start_x = quiet_px + x as u32 * module_px;
                let start_y = quiet_px + y as u32 * module_px;
                for dy in 0..module_px {
                    for dx in 0..module_px {
                        img.put_pixel(start_x + dx, start_y + dy, image::Luma([0u8]));
                    }
                }
            }
        }

        let mut png = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| Error::Image(format!("PNG encoding error: {}", e)))?;

        log::debug!("Encoded {}-byte payload into {}px token", payload.len(), size);
        Ok(EncodedImage {
            png,
            width: size,
            height: size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str) -> TokenPayload {
        TokenPayload::from_fields(name, "Cruz", "S-1700000000-42", "ana@example.edu", "BSCS", 3)
    }

    #[test]
    fn test_profile_dimensions() {
        let profile = TokenProfile::STANDARD;
        assert_eq!(profile.modules(), 69);
        assert_eq!(profile.image_px(), (69 + 8) * 4);
    }

    #[test]
    fn test_encode_produces_png() {
        let image = TokenEncoder::new().encode(&payload("Ana")).unwrap();
        assert_eq!(&image.png_bytes()[..8], PNG_SIGNATURE);
        assert_eq!(image.width(), TokenProfile::STANDARD.image_px());
        assert_eq!(image.height(), image.width());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let encoder = TokenEncoder::new();
        let a = encoder.encode(&payload("Ana")).unwrap();
        let b = encoder.encode(&payload("Ana")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_payload_at_capacity_fits() {
        let text = "x".repeat(TokenProfile::STANDARD.capacity);
        let bare = TokenPayload::from_fields("", "", "", "", "", 1);
        // Pad through the course field up to exactly the capacity.
        let pad = TokenProfile::STANDARD.capacity - bare.len();
        let exact = TokenPayload::from_fields("", "", "", "", &text[..pad], 1);
        assert_eq!(exact.len(), TokenProfile::STANDARD.capacity);
        assert!(TokenEncoder::new().encode(&exact).is_ok());
    }

    #[test]
    fn test_payload_too_large() {
        let course = "y".repeat(400);
        let big = TokenPayload::from_fields("Ana", "Cruz", "S-1", "a@b.c", &course, 1);
        match TokenEncoder::new().encode(&big) {
            Err(Error::PayloadTooLarge { len, capacity }) => {
                assert_eq!(len, big.len());
                assert_eq!(capacity, 331);
            },
            other => panic!("expected PayloadTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_data_url_round_trip() {
        let image = TokenEncoder::new().encode(&payload("Ana")).unwrap();
        let url = image.to_data_url();
        assert!(url.starts_with(DATA_URL_PREFIX));
        let back = EncodedImage::from_data_url(&url).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn test_data_url_rejects_garbage() {
        assert!(EncodedImage::from_data_url("hello").is_err());
        assert!(EncodedImage::from_data_url("data:image/png;base64,!!!").is_err());
        // Valid base64, but not a PNG
        assert!(EncodedImage::from_data_url("data:image/png;base64,aGVsbG8=").is_err());
    }
}
