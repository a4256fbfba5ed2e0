//! Travel attestation generation
//!
//! This crate fills a fixed-layout PDF attestation from a traveler profile:
//! identity text, checkbox marks for the selected category and reasons, an
//! "issued at / on" block, and a QR code carrying a plaintext summary.
//!
//! - [`Renderer`] lays out and renders a single attestation
//! - [`Generator`] runs the full submit sequence against a [`ProfileStore`]
//! - [`TemplateLayout`] holds the template coordinates as versioned data

pub mod error;
pub mod generate;
pub mod layout;
pub mod metrics;
pub mod overlay;
pub mod profile;
pub mod qr;
pub mod render;
pub mod store;
pub mod summary;
pub mod validation;

use chrono::NaiveDateTime;

pub use error::AttestationError;
pub use generate::{AttestationRequest, GenerationGuard, GenerationTicket, Generator};
pub use layout::TemplateLayout;
pub use profile::{Category, FormSubmission, Profile, Reason, ReasonSet};
pub use qr::QrImage;
pub use render::{RenderWarning, RenderedDocument, Renderer};
pub use store::{FileStore, KeyValueStore, MemoryStore, ProfileStore};
pub use summary::{build_summary, SummaryRecord};

/// Media type of every rendered document
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Download name for an attestation generated at `at`:
/// `attestation-YYYY-MM-DD_HH-MM.pdf`
pub fn output_file_name(at: &NaiveDateTime) -> String {
    format!("attestation-{}.pdf", at.format("%Y-%m-%d_%H-%M"))
}
