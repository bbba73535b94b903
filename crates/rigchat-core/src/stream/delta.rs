use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionChunk {
    fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.as_ref())
            .and_then(|delta| delta.content.as_deref())
    }
}

/// Result of applying one payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    /// A fragment was appended; the full text is in [`DeltaAccumulator::text`].
    Appended,
    /// Valid JSON without usable content.
    Ignored,
    /// Not parseable as JSON; assumed truncated.
    Incomplete,
}

/// Running assistant text for one request.
#[derive(Debug, Default)]
pub struct DeltaAccumulator {
    text: String,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, payload: &str) -> DeltaOutcome {
        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(
                    eof = err.is_eof(),
                    error = %err,
                    "frame payload is not valid JSON"
                );
                return DeltaOutcome::Incomplete;
            }
        };

        let chunk: CompletionChunk = match serde_json::from_value(value) {
            Ok(chunk) => chunk,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring frame with unexpected shape");
                return DeltaOutcome::Ignored;
            }
        };

        match chunk.first_content() {
            Some(fragment) if !fragment.is_empty() => {
                self.text.push_str(fragment);
                DeltaOutcome::Appended
            }
            _ => DeltaOutcome::Ignored,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_accumulate() {
        let mut acc = DeltaAccumulator::new();
        assert_eq!(
            acc.apply(r#"{"choices":[{"delta":{"content":"Hel"}}]}"#),
            DeltaOutcome::Appended
        );
        assert_eq!(
            acc.apply(r#"{"choices":[{"delta":{"content":"lo"}}]}"#),
            DeltaOutcome::Appended
        );
        assert_eq!(acc.text(), "Hello");
    }

    #[test]
    fn test_role_only_and_empty_deltas_are_ignored() {
        let mut acc = DeltaAccumulator::new();
        assert_eq!(
            acc.apply(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#),
            DeltaOutcome::Ignored
        );
        assert_eq!(
            acc.apply(r#"{"choices":[{"delta":{"content":""}}]}"#),
            DeltaOutcome::Ignored
        );
        assert_eq!(
            acc.apply(r#"{"choices":[{"delta":{"content":null}}]}"#),
            DeltaOutcome::Ignored
        );
        assert_eq!(acc.apply(r#"{"choices":[]}"#), DeltaOutcome::Ignored);
        assert_eq!(acc.apply(r#"{"id":"x"}"#), DeltaOutcome::Ignored);
        assert_eq!(acc.text(), "");
    }

    #[test]
    fn test_schema_mismatch_fails_closed() {
        let mut acc = DeltaAccumulator::new();
        assert_eq!(acc.apply(r#"{"choices":"nope"}"#), DeltaOutcome::Ignored);
        assert_eq!(
            acc.apply(r#"{"choices":[{"delta":{"content":42}}]}"#),
            DeltaOutcome::Ignored
        );
        assert_eq!(acc.apply("17"), DeltaOutcome::Ignored);
        assert_eq!(acc.text(), "");
    }

    #[test]
    fn test_truncated_json_is_incomplete() {
        let mut acc = DeltaAccumulator::new();
        assert_eq!(
            acc.apply(r#"{"choices":[{"delta":{"content":"Hel"#),
            DeltaOutcome::Incomplete
        );
        assert_eq!(acc.text(), "");
    }

    #[test]
    fn test_only_first_choice_is_used() {
        let mut acc = DeltaAccumulator::new();
        acc.apply(r#"{"choices":[{"delta":{"content":"a"}},{"delta":{"content":"b"}}]}"#);
        assert_eq!(acc.text(), "a");
    }
}
