/// Newline framing over decoded text.
///
/// Holds everything after the last newline until more text arrives.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: String,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Next complete line without its `\n` (and one trailing `\r`).
    pub fn next_line(&mut self) -> Option<String> {
        let newline = self.buffer.find('\n')?;
        let mut line: String = self.buffer.drain(..=newline).collect();
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    /// Put a line back in front of the buffer so it is handed out again.
    pub fn requeue(&mut self, line: &str) {
        let mut restored = String::with_capacity(line.len() + 1 + self.buffer.len());
        restored.push_str(line);
        restored.push('\n');
        restored.push_str(&self.buffer);
        self.buffer = restored;
    }

    /// Unterminated text seen so far.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    /// Take the unterminated remainder as a final line, if there is one.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.buffer);
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(splitter: &mut LineSplitter) -> Vec<String> {
        std::iter::from_fn(|| splitter.next_line()).collect()
    }

    #[test]
    fn test_splits_complete_lines_and_keeps_remainder() {
        let mut splitter = LineSplitter::new();
        splitter.push("one\ntwo\r\nthr");
        assert_eq!(drain(&mut splitter), vec!["one", "two"]);
        assert_eq!(splitter.remainder(), "thr");

        splitter.push("ee\n");
        assert_eq!(drain(&mut splitter), vec!["three"]);
        assert_eq!(splitter.remainder(), "");
    }

    #[test]
    fn test_only_one_carriage_return_is_stripped() {
        let mut splitter = LineSplitter::new();
        splitter.push("a\r\r\n");
        assert_eq!(splitter.next_line().as_deref(), Some("a\r"));
    }

    #[test]
    fn test_blank_lines_are_emitted() {
        let mut splitter = LineSplitter::new();
        splitter.push("\n\nx\n");
        assert_eq!(drain(&mut splitter), vec!["", "", "x"]);
    }

    #[test]
    fn test_requeue_puts_line_before_remainder() {
        let mut splitter = LineSplitter::new();
        splitter.push("first\nsecond\npart");
        let first = splitter.next_line().unwrap();
        splitter.requeue(&first);
        assert_eq!(splitter.remainder(), "first\nsecond\npart");
        splitter.push("ial\n");
        assert_eq!(drain(&mut splitter), vec!["first", "second", "partial"]);
    }

    #[test]
    fn test_remainder_never_contains_newline_after_drain() {
        let mut splitter = LineSplitter::new();
        for piece in ["a\nb", "c\n\nd", "e"] {
            splitter.push(piece);
            drain(&mut splitter);
            assert!(!splitter.remainder().contains('\n'));
        }
        assert_eq!(splitter.take_remainder().as_deref(), Some("de"));
        assert_eq!(splitter.take_remainder(), None);
    }
}
