//! Scannable identity tokens.
//!
//! A record's fields are rendered into a fixed-format [`TokenPayload`], which
//! [`TokenEncoder`] turns into a QR symbol rasterized as a grayscale PNG.
//! Both steps are pure: equal fields give byte-identical images.
//!
//! ```ignore
//! use student_docs::token::{TokenEncoder, TokenPayload};
//!
//! let payload = TokenPayload::from_record(&record);
//! let image = TokenEncoder::new().encode(&payload)?;
//! let cached = image.to_data_url();
//! ```

mod encoder;
mod payload;

pub use encoder::{EncodedImage, TokenEncoder, TokenProfile, DATA_URL_PREFIX};
pub use payload::TokenPayload;
