//! Message → turn normalization
//!
//! Gemini rejects two consecutive `user` turns, so consecutive user messages
//! are merged into one turn as separate parts. Assistant messages always
//! become their own `model` turn. The persona preamble is prepended to the
//! first user content emitted, exactly once per build.

use tracing::debug;

use super::types::{Conversation, Message, MessageRole, Part, Turn, TurnRole};

/// Builds provider conversations from caller messages.
///
/// Holds only immutable configuration; every call to [`Normalizer::normalize`]
/// starts from fresh fold state, so one instance can serve concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    preamble: Option<String>,
}

impl Normalizer {
    pub fn new(preamble: Option<&str>) -> Self {
        Self {
            preamble: preamble.map(str::to_string),
        }
    }

    pub fn preamble(&self) -> Option<&str> {
        self.preamble.as_deref()
    }

    pub fn normalize(&self, messages: &[Message]) -> Conversation {
        normalize(messages, self.preamble.as_deref())
    }
}

/// Fold state for one normalization call
struct Fold<'a> {
    turns: Vec<Turn>,
    /// Taken on first use; `None` afterwards.
    preamble: Option<&'a str>,
}

impl<'a> Fold<'a> {
    fn new(preamble: Option<&'a str>) -> Self {
        Self {
            turns: Vec::new(),
            preamble,
        }
    }

    fn push_user(&mut self, content: &str) {
        let text = match self.preamble.take() {
            Some(preamble) => format!("{preamble}{content}"),
            None => content.to_string(),
        };

        match self.turns.last_mut() {
            Some(last) if last.role == TurnRole::User => last.parts.push(Part::text(text)),
            _ => self.turns.push(Turn::user(text)),
        }
    }

    fn push_model(&mut self, content: &str) {
        self.turns.push(Turn::model(content));
    }
}

/// Convert caller messages into a conversation with no adjacent user turns.
///
/// Messages with an unrecognized role are dropped without error.
pub fn normalize(messages: &[Message], preamble: Option<&str>) -> Conversation {
    let fold = messages
        .iter()
        .fold(Fold::new(preamble), |mut fold, message| {
            match &message.role {
                MessageRole::User => fold.push_user(&message.content),
                MessageRole::Assistant => fold.push_model(&message.content),
                MessageRole::Unrecognized(role) => {
                    debug!(role = %role, "Dropping message with unrecognized role");
                }
            }
            fold
        });

    Conversation::new(fold.turns)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREAMBLE: &str = "P: ";

    fn texts(turn: &Turn) -> Vec<&str> {
        turn.parts.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        let conversation = normalize(&[], Some(PREAMBLE));
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_single_user_message_gets_preamble() {
        let conversation = normalize(&[Message::user("hello")], Some(PREAMBLE));
        assert_eq!(conversation.turns(), &[Turn::user("P: hello")]);
    }

    #[test]
    fn test_no_preamble() {
        let conversation = normalize(&[Message::user("hello")], None);
        assert_eq!(conversation.turns(), &[Turn::user("hello")]);
    }

    #[test]
    fn test_consecutive_users_merge() {
        let messages = [Message::user("a"), Message::user("b"), Message::user("c")];
        let conversation = normalize(&messages, Some(PREAMBLE));

        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.turns()[0].role, TurnRole::User);
        assert_eq!(texts(&conversation.turns()[0]), vec!["P: a", "b", "c"]);
    }

    #[test]
    fn test_consecutive_assistants_not_merged() {
        let messages = [
            Message::user("q"),
            Message::assistant("a1"),
            Message::assistant("a2"),
        ];
        let conversation = normalize(&messages, None);

        assert_eq!(
            conversation.turns(),
            &[Turn::user("q"), Turn::model("a1"), Turn::model("a2")]
        );
    }

    #[test]
    fn test_preamble_after_leading_assistant() {
        let messages = [
            Message::assistant("greeting"),
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("second"),
        ];
        let conversation = normalize(&messages, Some(PREAMBLE));

        assert_eq!(
            conversation.turns(),
            &[
                Turn::model("greeting"),
                Turn::user("P: first"),
                Turn::model("reply"),
                Turn::user("second"),
            ]
        );
    }

    #[test]
    fn test_unrecognized_role_dropped_and_merge_continues() {
        let messages = [
            Message::user("a"),
            Message::new("system", "ignored"),
            Message::user("b"),
        ];
        let conversation = normalize(&messages, None);

        assert_eq!(conversation.len(), 1);
        assert_eq!(texts(&conversation.turns()[0]), vec!["a", "b"]);
    }

    #[test]
    fn test_unrecognized_only_produces_nothing() {
        let messages = [Message::new("system", "x"), Message::new("tool", "y")];
        assert!(normalize(&messages, Some(PREAMBLE)).is_empty());
    }

    #[test]
    fn test_normalizer_reuse_injects_every_call() {
        let normalizer = Normalizer::new(Some(PREAMBLE));
        let messages = [Message::user("hi")];

        let first = normalizer.normalize(&messages);
        let second = normalizer.normalize(&messages);

        assert_eq!(first, second);
        assert_eq!(texts(&second.turns()[0]), vec!["P: hi"]);
    }

    #[test]
    fn test_input_not_mutated() {
        let messages = vec![Message::user("a"), Message::user("b")];
        let before = messages.clone();
        let _ = normalize(&messages, Some(PREAMBLE));
        assert_eq!(messages, before);
    }
}
