//! Fenced code block extraction.
//!
//! Scans a response message line by line for triple-backtick fences. An
//! explicit scanner rather than substring splitting: it handles multiple,
//! adjacent and untagged fences, and drops an unterminated fence instead of
//! treating trailing prose as code.

/// An executable snippet extracted from one assistant message.
///
/// Ephemeral: recomputed each time a message is rendered. Identity is
/// `(origin, ordinal)`, which stays collision-free when history re-renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSnippet {
    pub code: String,
    /// Language tag immediately after the opening fence, if any.
    pub language: Option<String>,
    /// Index of the message this snippet came from.
    pub origin: usize,
    /// 1-based position within the message.
    pub ordinal: usize,
}

impl CodeSnippet {
    /// Stable action key for binding a UI trigger to this snippet.
    pub fn action_key(&self) -> String {
        format!("run_{}_{}", self.origin, self.ordinal)
    }
}

const FENCE: &str = "```";

/// Extract every well-formed fenced block from `text`.
///
/// A line starting with the fence marker opens a segment (anything after the
/// marker is its language tag); the next fence line closes it. Each closer
/// terminates exactly one open segment; nesting is not supported. A fence
/// left open at end of input is dropped, never an error. No fences at all
/// simply yields an empty list.
pub fn extract(text: &str, origin: usize) -> Vec<CodeSnippet> {
    let mut snippets: Vec<CodeSnippet> = Vec::new();
    let mut open: Option<(Option<String>, Vec<&str>)> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix(FENCE) {
            match open.take() {
                Some((language, body)) => {
                    snippets.push(CodeSnippet {
                        code: body.join("\n").trim().to_string(),
                        language,
                        origin,
                        ordinal: snippets.len() + 1,
                    });
                }
                None => {
                    let tag = rest.trim();
                    let language = (!tag.is_empty()).then(|| tag.to_string());
                    open = Some((language, Vec::new()));
                }
            }
        } else if let Some((_, body)) = open.as_mut() {
            body.push(line);
        }
    }

    snippets
}
