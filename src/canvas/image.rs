//! Image resources for page canvases.
//!
//! Images are decoded once into the form they are embedded in:
//!
//! - **JPEG**: passed through with the DCTDecode filter
//! - **PNG**: decoded, pixel data Flate-compressed, alpha split into a soft mask
//!
//! Each resource carries a content key (SHA-256 prefix of the source bytes)
//! so a document embeds every distinct image once.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::object::Object;
use crate::token::EncodedImage;

/// Color space for image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Grayscale (1 component per pixel)
    DeviceGray,
    /// RGB color (3 components per pixel)
    DeviceRGB,
    /// CMYK color (4 components per pixel)
    DeviceCMYK,
}

impl ColorSpace {
    /// Get the PDF name for this color space.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
        }
    }
}

/// Stream filter of the embedded pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// JPEG pass-through
    Dct,
    /// Zlib-compressed raw samples
    Flate,
}

/// Decoded image ready for embedding. Cloning is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResource {
    key: String,
    width: u32,
    height: u32,
    color_space: ColorSpace,
    filter: ImageFilter,
    data: Bytes,
    soft_mask: Option<Bytes>,
}

impl ImageResource {
    /// Decode PNG or JPEG bytes, detecting the format from the signature.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
            return Self::from_jpeg(data);
        }
        if data.len() >= 8 && &data[0..8] == b"\x89PNG\r\n\x1a\n" {
            return Self::from_png(data);
        }
        Err(Error::Image("Unsupported image format".to_string()))
    }

    /// Load an asset from disk.
    ///
    /// A missing or unreadable file is reported as
    /// [`Error::AssetUnavailable`] so callers can skip the image.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| Error::AssetUnavailable(format!("{}: {}", path.display(), e)))?;
        Self::decode(&data)
            .map_err(|e| Error::AssetUnavailable(format!("{}: {}", path.display(), e)))
    }

    /// Wrap an encoded token image.
    pub fn from_token(token: &EncodedImage) -> Result<Self> {
        Self::from_png(token.png_bytes())
    }

    fn from_jpeg(data: &[u8]) -> Result<Self> {
        let (width, height, color_space) = parse_jpeg_header(data)?;
        Ok(Self {
            key: content_key(data),
            width,
            height,
            color_space,
            filter: ImageFilter::Dct,
            data: Bytes::copy_from_slice(data),
            soft_mask: None,
        })
    }

    fn from_png(data: &[u8]) -> Result<Self> {
        use image::GenericImageView;

        let img = image::load_from_memory_with_format(data, image::ImageFormat::Png)
            .map_err(|e| Error::Image(format!("Failed to decode PNG: {}", e)))?;
        let (width, height) = img.dimensions();

        let (color_space, pixels, alpha) = match img.color() {
            image::ColorType::L8 | image::ColorType::L16 => {
                (ColorSpace::DeviceGray, img.to_luma8().into_raw(), None)
            },
            image::ColorType::La8 | image::ColorType::La16 => {
                let la = img.to_luma_alpha8();
                let (gray, alpha): (Vec<u8>, Vec<u8>) =
                    la.pixels().map(|p| (p.0[0], p.0[1])).unzip();
                (ColorSpace::DeviceGray, gray, Some(alpha))
            },
            image::ColorType::Rgba8 | image::ColorType::Rgba16 => {
                let rgba = img.to_rgba8();
                let mut rgb = Vec::with_capacity((width * height * 3) as usize);
                let mut alpha = Vec::with_capacity((width * height) as usize);
                for pixel in rgba.pixels() {
                    rgb.extend_from_slice(&pixel.0[..3]);
                    alpha.push(pixel.0[3]);
                }
                (ColorSpace::DeviceRGB, rgb, Some(alpha))
            },
            _ => (ColorSpace::DeviceRGB, img.to_rgb8().into_raw(), None),
        };

        // Fully opaque masks carry no information.
        let alpha = alpha.filter(|a| a.iter().any(|&v| v != 255));

        Ok(Self {
            key: content_key(data),
            width,
            height,
            color_space,
            filter: ImageFilter::Flate,
            data: Bytes::from(compress(&pixels)?),
            soft_mask: alpha.map(|a| compress(&a).map(Bytes::from)).transpose()?,
        })
    }

    /// Content key shared by identical source images.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color space of the samples.
    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    /// Filter of the embedded data.
    pub fn filter(&self) -> ImageFilter {
        self.filter
    }

    /// Whether an alpha soft mask is attached.
    pub fn has_soft_mask(&self) -> bool {
        self.soft_mask.is_some()
    }

    /// Get the aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Largest size inside the box that keeps the aspect ratio.
    pub fn fit_to_box(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        let aspect = self.aspect_ratio();
        if aspect > max_width / max_height {
            (max_width, max_width / aspect)
        } else {
            (max_height * aspect, max_height)
        }
    }

    /// Smallest size covering the box that keeps the aspect ratio.
    pub fn cover_box(&self, min_width: f32, min_height: f32) -> (f32, f32) {
        let aspect = self.aspect_ratio();
        if aspect > min_width / min_height {
            (min_height * aspect, min_height)
        } else {
            (min_width, min_width / aspect)
        }
    }

    /// Image XObject stream. `smask` is the soft-mask object number, if any.
    pub fn to_xobject(&self, smask: Option<u32>) -> Object {
        let mut dict = base_image_dict(self.width, self.height, self.color_space);
        let filter = match self.filter {
            ImageFilter::Dct => "DCTDecode",
            ImageFilter::Flate => "FlateDecode",
        };
        dict.insert("Filter".to_string(), Object::name(filter));
        if let Some(id) = smask {
            dict.insert("SMask".to_string(), Object::reference(id));
        }
        Object::Stream {
            dict,
            data: self.data.clone(),
        }
    }

    /// Soft-mask XObject stream, if the image has transparency.
    pub fn soft_mask_xobject(&self) -> Option<Object> {
        self.soft_mask.as_ref().map(|mask| {
            let mut dict = base_image_dict(self.width, self.height, ColorSpace::DeviceGray);
            dict.insert("Filter".to_string(), Object::name("FlateDecode"));
            Object::Stream {
                dict,
                data: mask.clone(),
            }
        })
    }
}

fn base_image_dict(width: u32, height: u32, color_space: ColorSpace) -> HashMap<String, Object> {
    let mut dict = HashMap::new();
    dict.insert("Type".to_string(), Object::name("XObject"));
    dict.insert("Subtype".to_string(), Object::name("Image"));
    dict.insert("Width".to_string(), Object::Integer(width as i64));
    dict.insert("Height".to_string(), Object::Integer(height as i64));
    dict.insert("ColorSpace".to_string(), Object::name(color_space.pdf_name()));
    dict.insert("BitsPerComponent".to_string(), Object::Integer(8));
    dict
}

fn content_key(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Parse JPEG header to extract dimensions and color space.
fn parse_jpeg_header(data: &[u8]) -> Result<(u32, u32, ColorSpace)> {
    let invalid = |msg: &str| Error::Image(format!("Invalid JPEG: {}", msg));

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        pos += 2;
        if marker == 0xFF || marker == 0x00 {
            continue;
        }

        // Start-of-frame markers (all except DHT, JPG and DAC)
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            if pos + 7 >= data.len() {
                return Err(invalid("truncated frame header"));
            }
            let height = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as u32;
            let width = u16::from_be_bytes([data[pos + 5], data[pos + 6]]) as u32;
            let color_space = match data[pos + 7] {
                1 => ColorSpace::DeviceGray,
                4 => ColorSpace::DeviceCMYK,
                _ => ColorSpace::DeviceRGB,
            };
            return Ok((width, height, color_space));
        }

        if pos + 2 > data.len() {
            break;
        }
        pos += u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
    }

    Err(invalid("no frame header"))
}

fn compress(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
