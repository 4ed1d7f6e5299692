//! # Error Types
//!
//! This module defines error types used throughout the cardpress library.
//!
//! Failures local to one card (a photo that would not download, an
//! unresolved marker) are *not* errors — the renderer recovers from them
//! and reports them as warnings on that card's outcome. The variants here
//! are the failures that make a card, or a whole batch, unusable.

use thiserror::Error;

use crate::batch::CardOutcome;

/// Main error type for cardpress operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Template has no nodes (or no template was supplied). Fatal for the
    /// card; a batch skips the card and continues.
    #[error("template has no nodes to render")]
    EmptyOrMissingDesign,

    /// A photo could not be fetched or decoded. Per-photo and non-fatal
    /// during rendering; surfaced as a warning on the card's outcome.
    #[error("photo load failed: {0}")]
    PhotoLoad(String),

    /// The card cannot fit even a single slot on the page. Fatal for the
    /// whole batch, raised before any rendering starts.
    #[error(
        "card {card_width}x{card_height} does not fit a single slot on page {page_width}x{page_height}"
    )]
    CardTooLargeForPage {
        card_width: u32,
        card_height: u32,
        page_width: u32,
        page_height: u32,
    },

    /// A batch produced zero successfully rendered cards. Carries the
    /// per-card outcomes so callers can still report why each card was
    /// skipped.
    #[error("no renderable cards in batch")]
    NoRenderableCards { outcomes: Vec<CardOutcome> },

    /// The document writer failed or was given an empty document.
    #[error("document assembly failed: {0}")]
    DocumentAssembly(String),

    /// Image processing error (decode, encode, unsupported format).
    #[error("image error: {0}")]
    Image(String),

    /// Font loading or registration error.
    #[error("font error: {0}")]
    Font(String),

    /// Invalid input (malformed template JSON, bad color string, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
