//! Research provider implementations.

pub mod anthropic;
