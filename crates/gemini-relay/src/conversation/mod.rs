//! Conversation model and normalization

mod normalizer;
mod types;

pub use normalizer::{Normalizer, normalize};
pub use types::{Conversation, Message, MessageRole, Part, Turn, TurnRole};
