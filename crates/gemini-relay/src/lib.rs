//! gemini-relay - streaming chat proxy for the Gemini API
//!
//! Reshapes caller chat messages into Gemini's turn format (merging
//! consecutive user messages and injecting a persona preamble once), maps a
//! loose safety policy onto the provider's enums, and relays the streamed
//! completion back to the caller as plain text.

pub mod config;
pub mod conversation;
pub mod error;
pub mod provider;
pub mod proxy;
pub mod relay;
pub mod request;
pub mod safety;
pub mod testing;

pub use error::RelayError;
