//! VIGIL Notify - rendering and delivery of run summaries
//!
//! The core hands this boundary the ordered change items, the new record
//! (for the metrics comparison table), and the raw text (for a
//! collapsible full-report section). Rendering produces subject + HTML;
//! transport is SMTP. Delivery failure never rolls back a persisted
//! snapshot - the caller decides how to surface it.

mod render;
mod smtp;

pub use render::{render, NotifyInput, RenderedEmail};
pub use smtp::SmtpNotifier;

use async_trait::async_trait;
use vigil_core::VigilResult;

/// Trait for notification transports.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a rendered summary email.
    async fn deliver(&self, email: &RenderedEmail) -> VigilResult<()>;
}
