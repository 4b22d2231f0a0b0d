//! Session state and orchestration.
//!
//! Explicit owner of everything one interactive session needs: credential,
//! model choice, loaded dataset, conversation history and the snippets of the
//! most recent reply. No hidden globals; each component is handed what it
//! reads.

use crate::context::{summarize, SummaryOptions};
use crate::conversation::{assemble, AssembleOptions, History, Role};
use crate::dataset::Dataset;
use crate::error::{AssistantError, Result};
use crate::executor::{ExecutionResult, OutputSink, SnippetRunner};
use crate::extract::{extract, CodeSnippet};
use crate::llm::{CompletionClient, DEFAULT_MODEL, MODEL_OPTIONS};
use std::path::Path;
use tracing::{info, warn};

/// What one `ask` produced: the model's reply with any runnable snippets, or
/// a user-facing failure/guidance string.
#[derive(Debug, Clone)]
pub struct AskOutcome {
    pub reply: String,
    pub snippets: Vec<CodeSnippet>,
    pub failure: bool,
}

impl AskOutcome {
    fn guidance(message: String) -> Self {
        Self {
            reply: message,
            snippets: Vec::new(),
            failure: true,
        }
    }
}

pub struct Session {
    credential: Option<String>,
    model: String,
    base_url: Option<String>,
    dataset: Option<Dataset>,
    history: History,
    runner: SnippetRunner,
    summary_options: SummaryOptions,
    assemble_options: AssembleOptions,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            credential: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            dataset: None,
            history: History::new(),
            runner: SnippetRunner::new(),
            summary_options: SummaryOptions::default(),
            assemble_options: AssembleOptions::default(),
        }
    }

    pub fn set_credential(&mut self, key: impl Into<String>) {
        self.credential = Some(key.into());
    }

    pub fn set_model(&mut self, model: &str) -> Result<()> {
        if MODEL_OPTIONS.contains(&model) {
            self.model = model.to_string();
            Ok(())
        } else {
            Err(AssistantError::Completion(format!(
                "Unknown model '{}'; expected one of: {}",
                model,
                MODEL_OPTIONS.join(", ")
            )))
        }
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = Some(base_url.into());
    }

    /// Load (or replace) the session's dataset.
    pub fn load_dataset(&mut self, path: &Path) -> Result<&Dataset> {
        let dataset = Dataset::load(path)?;
        Ok(&*self.dataset.insert(dataset))
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Index of the most recent assistant reply, if any.
    pub fn last_assistant_origin(&self) -> Option<usize> {
        self.history
            .turns()
            .iter()
            .rposition(|turn| turn.role == Role::Assistant)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("Chat history cleared");
    }

    /// Answer one user question, recording the exchange in history.
    ///
    /// Precondition failures (no key, no dataset) come back as guidance text
    /// without touching the network. A completion failure is rendered as one
    /// error string and the attempt still lands in history.
    pub async fn ask(&mut self, question: &str) -> AskOutcome {
        let Some(credential) = self.credential.clone() else {
            return AskOutcome::guidance(AssistantError::MissingCredential.to_string());
        };
        let Some(dataset) = self.dataset.as_ref() else {
            return AskOutcome::guidance(AssistantError::MissingDataset.to_string());
        };

        let context = summarize(dataset, &self.summary_options);
        let messages = assemble(&context, &self.history, question, &self.assemble_options);

        let mut client = CompletionClient::new(credential, self.model.clone());
        if let Some(base_url) = &self.base_url {
            client = client.with_base_url(base_url);
        }

        match client.complete(&messages).await {
            Ok(reply) => {
                self.history.push(Role::User, question);
                self.history.push(Role::Assistant, reply.clone());
                let origin = self.history.len() - 1;
                let snippets = extract(&reply, origin);
                info!("Reply recorded with {} runnable snippet(s)", snippets.len());
                AskOutcome {
                    reply,
                    snippets,
                    failure: false,
                }
            }
            Err(e) => {
                warn!("Completion failed: {}", e);
                // The attempt still lands in history.
                let message = e.to_string();
                self.history.push(Role::User, question);
                self.history.push(Role::Assistant, message.clone());
                AskOutcome::guidance(message)
            }
        }
    }

    /// Run snippet `ordinal` of the assistant reply at history index `origin`.
    ///
    /// Snippets are ephemeral: they are re-extracted from the recorded turn
    /// on every run, so any reply in history stays runnable, not just the
    /// most recent one.
    pub fn run_snippet(
        &self,
        origin: usize,
        ordinal: usize,
        sink: &mut dyn OutputSink,
    ) -> ExecutionResult {
        let Some(dataset) = self.dataset.as_ref() else {
            return ExecutionResult::fail(AssistantError::MissingDataset.to_string());
        };
        let Some(turn) = self.history.turns().get(origin) else {
            return ExecutionResult::fail(format!(
                "Error executing snippet: no message #{} in history",
                origin
            ));
        };
        if turn.role != Role::Assistant {
            return ExecutionResult::fail(format!(
                "Error executing snippet: message #{} is not an assistant reply",
                origin
            ));
        }
        let snippets = extract(&turn.content, origin);
        let Some(snippet) = snippets.iter().find(|s| s.ordinal == ordinal) else {
            return ExecutionResult::fail(format!(
                "Error executing snippet: no snippet #{} in message #{}",
                ordinal, origin
            ));
        };
        self.runner.execute(snippet, dataset, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::OutputSink;
    use polars::prelude::*;

    fn session_with_dataset() -> Session {
        let mut session = Session::new();
        let frame = df![
            "a" => [1i64, 2, 3]
        ]
        .unwrap();
        session.dataset = Some(Dataset::from_frame("t.csv", frame));
        session
    }

    struct NullSink;

    impl OutputSink for NullSink {
        fn table(&mut self, _frame: &DataFrame) {}
        fn text(&mut self, _text: &str) {}
    }

    #[tokio::test]
    async fn test_ask_without_credential_skips_network() {
        let mut session = session_with_dataset();
        let outcome = session.ask("how many rows?").await;

        assert!(outcome.failure);
        assert!(outcome.reply.contains("API key"), "{}", outcome.reply);
        assert!(outcome.snippets.is_empty());
    }

    #[tokio::test]
    async fn test_ask_without_dataset_gives_guidance() {
        let mut session = Session::new();
        session.set_credential("sk-test");
        let outcome = session.ask("how many rows?").await;

        assert!(outcome.failure);
        assert!(outcome.reply.contains("dataset"), "{}", outcome.reply);
    }

    #[test]
    fn test_set_model_validates_against_fixed_set() {
        let mut session = Session::new();
        assert!(session.set_model("gpt-4").is_ok());
        assert_eq!(session.model(), "gpt-4");

        let err = session.set_model("gpt-99").unwrap_err().to_string();
        assert!(err.contains("Unknown model"), "{}", err);
        assert_eq!(session.model(), "gpt-4");
    }

    #[tokio::test]
    async fn test_completion_failure_still_records_attempt() {
        let mut session = session_with_dataset();
        session.set_credential("sk-test");
        // Unroutable endpoint: the call fails without reaching any API.
        session.set_base_url("http://127.0.0.1:1");

        let outcome = session.ask("how many rows?").await;

        assert!(outcome.failure);
        assert!(outcome.snippets.is_empty());
        let turns = session.history().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "how many rows?");
        assert_eq!(turns[1].role, Role::Assistant);
        assert!(
            turns[1].content.contains("API call failed"),
            "{}",
            turns[1].content
        );
    }

    #[test]
    fn test_run_snippet_without_dataset_fails_gracefully() {
        let session = Session::new();
        let mut sink = NullSink;
        let result = session.run_snippet(0, 1, &mut sink);

        assert!(!result.success);
    }

    #[test]
    fn test_run_snippet_from_earlier_reply() {
        let mut session = session_with_dataset();
        session.history.push(Role::User, "show a");
        session
            .history
            .push(Role::Assistant, "```sql\nSELECT a FROM df\n```");
        session.history.push(Role::User, "anything else?");
        session.history.push(Role::Assistant, "No code this time.");

        // The first reply stays runnable after later turns arrive.
        let mut sink = NullSink;
        let result = session.run_snippet(1, 1, &mut sink);
        assert!(result.success, "{}", result.message);

        assert_eq!(session.last_assistant_origin(), Some(3));
    }

    #[test]
    fn test_run_snippet_rejects_user_turn_origin() {
        let mut session = session_with_dataset();
        session.history.push(Role::User, "```sql\nSELECT a FROM df\n```");

        let mut sink = NullSink;
        let result = session.run_snippet(0, 1, &mut sink);

        assert!(!result.success);
        assert!(
            result.message.contains("not an assistant reply"),
            "{}",
            result.message
        );
    }

    #[test]
    fn test_run_snippet_unknown_ordinal() {
        let mut session = session_with_dataset();
        session
            .history
            .push(Role::Assistant, "```sql\nSELECT a FROM df\n```");

        let mut sink = NullSink;
        let result = session.run_snippet(0, 2, &mut sink);

        assert!(!result.success);
        assert!(
            result.message.contains("no snippet #2"),
            "{}",
            result.message
        );
    }

    #[test]
    fn test_run_snippet_unknown_origin() {
        let session = session_with_dataset();
        let mut sink = NullSink;
        let result = session.run_snippet(5, 1, &mut sink);

        assert!(!result.success);
        assert!(
            result.message.contains("no message #5"),
            "{}",
            result.message
        );
    }

    #[test]
    fn test_clear_history() {
        let mut session = session_with_dataset();
        session.history.push(Role::User, "q");
        session.history.push(Role::Assistant, "a");

        session.clear_history();
        assert!(session.history().is_empty());
        assert_eq!(session.last_assistant_origin(), None);
    }
}
