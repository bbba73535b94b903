//! Incremental consumption of a streamed chat-completion body.
//!
//! Bytes go through [`Utf8Decoder`], [`LineSplitter`], [`Frame`] and
//! [`DeltaAccumulator`]; every successful delta reports the full accumulated
//! text so far, in frame order.

pub mod decoder;
pub mod delta;
pub mod frame;
pub mod splitter;

pub use decoder::Utf8Decoder;
pub use delta::{DeltaAccumulator, DeltaOutcome};
pub use frame::{Frame, DATA_PREFIX, DONE_SENTINEL};
pub use splitter::LineSplitter;

use crate::error::{ChatError, Result};

/// What to do with a data line whose JSON does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameRecovery {
    /// Requeue the line and wait for more data, indefinitely.
    #[default]
    Lenient,
    /// Requeue at most this many times, then fail the request.
    Bounded(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// More data is expected.
    Pending,
    /// The sentinel was seen; stop reading.
    Done,
}

enum LineOutcome {
    Continue,
    Stop,
}

#[derive(Debug)]
struct RequeuedLine {
    line: String,
    attempts: u32,
}

/// Per-request stream state.
#[derive(Debug, Default)]
pub struct StreamProcessor {
    decoder: Utf8Decoder,
    splitter: LineSplitter,
    accumulator: DeltaAccumulator,
    recovery: FrameRecovery,
    requeued: Option<RequeuedLine>,
    done: bool,
}

impl StreamProcessor {
    pub fn new(recovery: FrameRecovery) -> Self {
        Self {
            recovery,
            ..Self::default()
        }
    }

    /// Process one body chunk. `on_update` receives the full accumulated
    /// text after each delta.
    pub fn feed<F>(&mut self, chunk: &[u8], mut on_update: F) -> Result<StreamStatus>
    where
        F: FnMut(&str),
    {
        if self.done {
            return Ok(StreamStatus::Done);
        }

        let text = self.decoder.decode(chunk);
        self.splitter.push(&text);

        while let Some(line) = self.splitter.next_line() {
            if let LineOutcome::Stop = self.process_line(&line, false, &mut on_update)? {
                break;
            }
        }

        Ok(self.status())
    }

    /// End of body: flush held-back bytes and treat any unterminated text as
    /// a final line. A payload that still doesn't parse is dropped.
    pub fn finish<F>(&mut self, mut on_update: F) -> Result<()>
    where
        F: FnMut(&str),
    {
        if self.done {
            return Ok(());
        }

        let tail = self.decoder.finish();
        self.splitter.push(&tail);

        while let Some(line) = self
            .splitter
            .next_line()
            .or_else(|| self.splitter.take_remainder())
        {
            if let LineOutcome::Stop = self.process_line(&line, true, &mut on_update)? {
                break;
            }
        }

        Ok(())
    }

    pub fn accumulated(&self) -> &str {
        self.accumulator.text()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn status(&self) -> StreamStatus {
        if self.done {
            StreamStatus::Done
        } else {
            StreamStatus::Pending
        }
    }

    /// Unterminated text currently buffered.
    pub fn remainder(&self) -> &str {
        self.splitter.remainder()
    }

    fn process_line<F>(
        &mut self,
        line: &str,
        at_end: bool,
        on_update: &mut F,
    ) -> Result<LineOutcome>
    where
        F: FnMut(&str),
    {
        let payload = match Frame::classify(line) {
            Frame::Ignored => return Ok(LineOutcome::Continue),
            Frame::Done => {
                tracing::debug!(chars = self.accumulated().len(), "stream sentinel received");
                self.done = true;
                return Ok(LineOutcome::Stop);
            }
            Frame::Payload(payload) => payload,
        };

        match self.accumulator.apply(payload) {
            DeltaOutcome::Appended => {
                self.requeued = None;
                on_update(self.accumulator.text());
                Ok(LineOutcome::Continue)
            }
            DeltaOutcome::Ignored => {
                self.requeued = None;
                Ok(LineOutcome::Continue)
            }
            DeltaOutcome::Incomplete if at_end => {
                tracing::warn!(line = %line, "dropping unparseable frame at end of stream");
                self.requeued = None;
                Ok(LineOutcome::Continue)
            }
            DeltaOutcome::Incomplete => {
                self.note_attempt(line)?;
                self.splitter.requeue(line);
                Ok(LineOutcome::Stop)
            }
        }
    }

    fn note_attempt(&mut self, line: &str) -> Result<()> {
        let attempts = match self.requeued.take() {
            Some(mut previous) if previous.line == line => {
                previous.attempts += 1;
                let attempts = previous.attempts;
                self.requeued = Some(previous);
                attempts
            }
            _ => {
                self.requeued = Some(RequeuedLine {
                    line: line.to_string(),
                    attempts: 1,
                });
                1
            }
        };

        if let FrameRecovery::Bounded(max_retries) = self.recovery {
            if attempts > max_retries {
                return Err(ChatError::MalformedFrame {
                    line: line.to_string(),
                    attempts,
                });
            }
        }

        tracing::debug!(attempts, "requeued frame, waiting for more data");
        Ok(())
    }
}
