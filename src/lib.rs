// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::new_without_default)]

//! # student_docs
//!
//! Document generation for a student-records application: scannable QR
//! identity tokens, one-page ID cards, paginated roster exports as PDF, and a
//! flat CSV roster export.
//!
//! ## Pipeline
//!
//! ```text
//! StudentRecord(s)
//!     ↓
//! [TokenEncoder] (record → payload text → QR PNG)
//!     ↓
//! [CardComposer] / [RosterComposer] (layout onto PageCanvas pages)
//!     ↓
//! [DocumentSerializer] (pages → PDF bytes, streamed)
//! ```
//!
//! Composition does every fallible step (token resolution, image decoding,
//! layout validation). A composed [`Document`] can only fail to serialize
//! when the sink fails.
//!
//! ## Quick Start
//!
//! ```ignore
//! use student_docs::{render_card, FsAssets, RenderConfig, StudentRecord};
//!
//! let config = RenderConfig::default().with_asset_root("public");
//! let assets = FsAssets::new(&config.asset_root);
//! let record = StudentRecord::create("Ana", "Cruz", "BSIT", 3, "ana@x.edu")?;
//! let (pdf, attachment) = render_card(&record, &config, &assets)?;
//! assert_eq!(attachment.content_type, "application/pdf");
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Records and tokens
pub mod record;
pub mod token;

// Drawing
pub mod canvas;
pub mod layout;

// Composition
pub mod compose;
pub mod config;

// Output
pub mod export;
pub mod object;
pub mod writer;

// Re-exports
pub use canvas::{Document, DocumentKind, PageCanvas, PageSetup};
pub use compose::{
    AssetSource, CardComposer, FsAssets, NoAssets, RenderContext, RosterComposer, TokenPolicy,
};
pub use config::RenderConfig;
pub use error::{Error, Result};
pub use record::{RecordUpdate, RosterFilter, StudentRecord};
pub use token::{EncodedImage, TokenEncoder, TokenPayload};
pub use writer::{Attachment, DocumentSerializer};

/// Compose and serialize the ID card of `record`.
pub fn render_card(
    record: &StudentRecord,
    config: &RenderConfig,
    assets: &dyn AssetSource,
) -> Result<(Vec<u8>, Attachment)> {
    let ctx = RenderContext::new(config, assets)?;
    let document = CardComposer::new(&ctx).compose(record)?;
    let attachment = Attachment::for_document(&document);
    let bytes = DocumentSerializer::from_config(config).to_vec(document)?;
    log::info!("Rendered {} ({} bytes)", attachment.filename, bytes.len());
    Ok((bytes, attachment))
}

/// Compose and serialize a roster of `records`, echoing `filter` on each page.
pub fn render_roster<'r, I>(
    records: I,
    filter: Option<RosterFilter>,
    config: &RenderConfig,
    assets: &dyn AssetSource,
) -> Result<(Vec<u8>, Attachment)>
where
    I: IntoIterator<Item = &'r StudentRecord>,
{
    let ctx = RenderContext::new(config, assets)?;
    let mut composer = RosterComposer::new(&ctx)?;
    if let Some(filter) = filter {
        composer = composer.with_filter(filter);
    }
    let document = composer.compose(records)?;
    let attachment = Attachment::for_document(&document);
    let pages = document.page_count();
    let bytes = DocumentSerializer::from_config(config).to_vec(document)?;
    log::info!(
        "Rendered {} with {} pages ({} bytes)",
        attachment.filename,
        pages,
        bytes.len()
    );
    Ok((bytes, attachment))
}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
