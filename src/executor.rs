//! Snippet execution against the loaded dataset.
//!
//! Runs one extracted snippet in a closed binding set: a fresh SQL context
//! with nothing registered but the dataset, under the name `df`. Nothing from
//! the surrounding session is visible to the snippet and nothing the snippet
//! computes survives the call.
//!
//! This is convenience execution of semi-trusted model output, not a security
//! sandbox. SQL over an in-memory frame has no filesystem or network surface,
//! but there is no timeout: a pathological query blocks the session.

use crate::dataset::Dataset;
use crate::extract::CodeSnippet;
use polars::prelude::*;
use polars::sql::SQLContext;
use tracing::{info, warn};

/// Outcome of running one snippet. Transient, never recorded in history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
}

impl ExecutionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Where executed snippets render their output.
pub trait OutputSink {
    fn table(&mut self, frame: &DataFrame);
    fn text(&mut self, text: &str);
}

/// Sink used by the interactive loop: prints inline.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl OutputSink for TerminalSink {
    fn table(&mut self, frame: &DataFrame) {
        println!("{}", frame);
    }

    fn text(&mut self, text: &str) {
        println!("{}", text);
    }
}

#[derive(Debug, Default)]
pub struct SnippetRunner;

impl SnippetRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run one snippet against the dataset, rendering through `sink`.
    ///
    /// Never returns an error: every fault is captured into the result.
    pub fn execute(
        &self,
        snippet: &CodeSnippet,
        dataset: &Dataset,
        sink: &mut dyn OutputSink,
    ) -> ExecutionResult {
        if let Some(language) = snippet.language.as_deref() {
            if !language.eq_ignore_ascii_case("sql") {
                return ExecutionResult::fail(format!(
                    "Error executing snippet: only sql snippets can run here, got a {} block",
                    language
                ));
            }
        }

        if snippet.code.trim().is_empty() {
            return ExecutionResult::fail("Error executing snippet: snippet is empty");
        }

        info!("Executing snippet {}", snippet.action_key());

        match run_sql(&snippet.code, dataset) {
            Ok(frame) => {
                sink.table(&frame);
                let message = format!("Snippet executed successfully ({} rows)", frame.height());
                sink.text(&message);
                ExecutionResult::ok(message)
            }
            Err(e) => {
                warn!("Snippet {} failed: {}", snippet.action_key(), e);
                ExecutionResult::fail(format!("Error executing snippet: {}", e))
            }
        }
    }
}

// Fresh context per call: each execution gets its own bindings, registered
// from a cheap Arc-backed clone of the session's frame, and the context is
// dropped before returning.
fn run_sql(sql: &str, dataset: &Dataset) -> PolarsResult<DataFrame> {
    let mut ctx = SQLContext::new();
    ctx.register("df", dataset.frame.clone().lazy());
    ctx.execute(sql)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    fn fixture() -> Dataset {
        let frame = df![
            "city" => ["porto", "lisbon", "porto"],
            "sales" => [10.0f64, 20.0, 30.0]
        ]
        .unwrap();
        Dataset::from_frame("sales.csv", frame)
    }

    #[derive(Default)]
    struct RecordingSink {
        tables: Vec<DataFrame>,
        texts: Vec<String>,
    }

    impl OutputSink for RecordingSink {
        fn table(&mut self, frame: &DataFrame) {
            self.tables.push(frame.clone());
        }

        fn text(&mut self, text: &str) {
            self.texts.push(text.to_string());
        }
    }

    fn snippet(code: &str, language: Option<&str>) -> CodeSnippet {
        CodeSnippet {
            code: code.to_string(),
            language: language.map(String::from),
            origin: 0,
            ordinal: 1,
        }
    }

    #[test]
    fn test_select_renders_table() {
        let mut sink = RecordingSink::default();
        let result = SnippetRunner::new().execute(
            &snippet("SELECT city, SUM(sales) AS total FROM df GROUP BY city", Some("sql")),
            &fixture(),
            &mut sink,
        );

        assert!(result.success, "{}", result.message);
        assert_eq!(sink.tables.len(), 1);
        assert_eq!(sink.tables[0].height(), 2);
        // The success line renders inline through the sink as well.
        assert_eq!(sink.texts.len(), 1);
        assert!(sink.texts[0].contains("2 rows"), "{}", sink.texts[0]);
    }

    #[test]
    fn test_untagged_snippet_runs() {
        let mut sink = RecordingSink::default();
        let result = SnippetRunner::new().execute(
            &snippet("SELECT * FROM df", None),
            &fixture(),
            &mut sink,
        );

        assert!(result.success, "{}", result.message);
        assert_eq!(sink.tables[0].height(), 3);
    }

    #[test]
    fn test_failing_snippet_never_raises() {
        let mut sink = RecordingSink::default();
        let result = SnippetRunner::new().execute(
            &snippet("SELECT missing_column FROM df", Some("sql")),
            &fixture(),
            &mut sink,
        );

        assert!(!result.success);
        assert!(result.message.contains("Erro"), "{}", result.message);
        assert!(sink.tables.is_empty());
        assert!(sink.texts.is_empty());
    }

    #[test]
    fn test_non_sql_tag_is_rejected() {
        let mut sink = RecordingSink::default();
        let result = SnippetRunner::new().execute(
            &snippet("print(df.shape)", Some("python")),
            &fixture(),
            &mut sink,
        );

        assert!(!result.success);
        assert!(result.message.contains("python"));
    }

    #[test]
    fn test_empty_snippet_is_rejected() {
        let mut sink = RecordingSink::default();
        let result =
            SnippetRunner::new().execute(&snippet("   ", None), &fixture(), &mut sink);

        assert!(!result.success);
    }

    #[test]
    fn test_execution_does_not_mutate_dataset() {
        let dataset = fixture();
        let mut sink = RecordingSink::default();
        let extracted = extract("```sql\nSELECT city FROM df\n```", 0);
        SnippetRunner::new().execute(&extracted[0], &dataset, &mut sink);

        // The session's frame is untouched by what the snippet computed.
        assert_eq!(dataset.frame.width(), 2);
        assert_eq!(dataset.frame.height(), 3);
    }
}
