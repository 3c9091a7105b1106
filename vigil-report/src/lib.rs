//! VIGIL Report - Normalizer and Diff & Classification Engine
//!
//! Pure, synchronous, deterministic: same inputs always produce the same
//! record and the same ordered change-set. No I/O and no clock reads; the
//! record timestamp is supplied by the caller.
//!
//! Pipeline position:
//! ```text
//! Provider raw text
//!     ↓
//! normalize()  - markdown-ish sections → canonical record
//!     ↓
//! diff()       - previous + current → ordered change items
//! ```

mod diff;
mod heuristics;
mod normalize;
mod value;

pub use diff::diff;
pub use heuristics::{contains_phrase, keyword_severity, meaningfully_different, normalize_fragment};
pub use normalize::normalize;
pub use value::parse_magnitude;
