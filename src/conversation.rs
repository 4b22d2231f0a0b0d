//! Conversation history and prompt assembly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in the wire payload sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One recorded turn of the session's conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Append-only conversation history, cleared only by explicit user action.
#[derive(Debug, Clone, Default)]
pub struct History {
    turns: Vec<ConversationTurn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(ConversationTurn {
            role,
            content: content.into(),
            at: Utc::now(),
        });
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }
}

#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Upper bound on prior turns included in the prompt. Oldest turns are
    /// dropped first; the system context is never dropped.
    pub max_history_turns: usize,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            max_history_turns: 20,
        }
    }
}

/// Build the ordered message list for one completion request: exactly one
/// system message carrying the dataset context, prior turns in original
/// order, then the new question last.
pub fn assemble(
    context_text: &str,
    history: &History,
    new_question: &str,
    options: &AssembleOptions,
) -> Vec<ChatMessage> {
    let turns = history.turns();
    let skip = turns.len().saturating_sub(options.max_history_turns);

    let mut messages = Vec::with_capacity(turns.len() - skip + 2);
    messages.push(ChatMessage::new(Role::System, system_message(context_text)));
    for turn in &turns[skip..] {
        messages.push(ChatMessage::new(turn.role, turn.content.clone()));
    }
    messages.push(ChatMessage::new(Role::User, new_question));
    messages
}

/// Fixed system instruction wrapped around the dataset context.
pub fn system_message(context_text: &str) -> String {
    format!(
        r#"You are a data analysis assistant. You have access to the following dataset:

{}

Help the user analyze and extract insights from this data.
When an analysis needs to be computed, provide a SQL query over a single table
named `df` inside a ```sql fenced block so the user can run it in place.
When a visualization would help, describe the most appropriate chart type and
provide the query that produces its data.
Be precise, direct and detailed in your answers."#,
        context_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_order() {
        let mut history = History::new();
        history.push(Role::User, "first question");
        history.push(Role::Assistant, "first answer");

        let messages = assemble("CTX", &history, "second question", &AssembleOptions::default());

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("CTX"));
        assert_eq!(messages[1].content, "first question");
        assert_eq!(messages[2].content, "first answer");
        assert_eq!(messages[3], ChatMessage::new(Role::User, "second question"));
    }

    #[test]
    fn test_assemble_empty_history() {
        let messages = assemble("CTX", &History::new(), "q", &AssembleOptions::default());

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1], ChatMessage::new(Role::User, "q"));
    }

    #[test]
    fn test_assemble_drops_oldest_turns_first() {
        let mut history = History::new();
        for i in 0..10 {
            history.push(Role::User, format!("q{}", i));
            history.push(Role::Assistant, format!("a{}", i));
        }

        let options = AssembleOptions {
            max_history_turns: 4,
        };
        let messages = assemble("CTX", &history, "latest", &options);

        // system + 4 newest turns + new question
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "q8");
        assert_eq!(messages[2].content, "a8");
        assert_eq!(messages[3].content, "q9");
        assert_eq!(messages[4].content, "a9");
        assert_eq!(messages[5].content, "latest");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let message = ChatMessage::new(Role::Assistant, "hi");
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn test_clear_empties_history() {
        let mut history = History::new();
        history.push(Role::User, "q");
        assert!(!history.is_empty());

        history.clear();
        assert!(history.is_empty());
    }
}
