//! Chat session: transcript, mode and the single in-flight stream.

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::client::Transport;
use crate::error::{ChatError, Result};
use crate::mode::Mode;
use crate::request::{ChatRequest, RequestContext};
use crate::state::{ChatMessage, Transcript};
use crate::stream::{FrameRecovery, StreamProcessor, StreamStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    /// Request submitted, response not yet open.
    Sending,
    /// Response body is being consumed.
    Streaming,
}

/// One chat widget's worth of state.
///
/// At most one request is in flight; `submit` and `send` refuse new input
/// until the session is idle again.
pub struct ChatSession {
    mode: Mode,
    transcript: Transcript,
    status: SessionStatus,
    recovery: FrameRecovery,
    cancel: CancellationToken,
    updates: watch::Sender<Vec<ChatMessage>>,
    rollback_len: usize,
}

impl ChatSession {
    pub fn new(mode: Mode) -> Self {
        let transcript = Transcript::seeded(mode.welcome_message());
        let (updates, _) = watch::channel(transcript.messages().to_vec());
        Self {
            mode,
            rollback_len: transcript.len(),
            transcript,
            status: SessionStatus::Idle,
            recovery: FrameRecovery::default(),
            cancel: CancellationToken::new(),
            updates,
        }
    }

    pub fn with_recovery(mut self, recovery: FrameRecovery) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_busy(&self) -> bool {
        self.status != SessionStatus::Idle
    }

    /// Receiver that sees every published transcript snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.updates.subscribe()
    }

    /// Token that aborts the current request when cancelled.
    ///
    /// A token cancelled while idle is replaced on the next send, so it
    /// never stops a request that had not started yet.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Switch mode, replacing the transcript with the new welcome message.
    /// Anything in flight is cancelled first.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.is_busy() {
            tracing::info!(
                from = self.mode.as_str(),
                to = mode.as_str(),
                "mode switch cancels in-flight request"
            );
            self.cancel.cancel();
            self.refresh_token();
            self.status = SessionStatus::Idle;
        }
        self.mode = mode;
        self.reset();
    }

    /// Start over in the current mode.
    pub fn reset(&mut self) {
        self.transcript = Transcript::seeded(self.mode.welcome_message());
        self.rollback_len = self.transcript.len();
        self.publish();
    }

    /// Validate input, record the user message and build the request body.
    pub(crate) fn submit(&mut self, text: &str, context: &RequestContext) -> Result<ChatRequest> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        if self.is_busy() {
            return Err(ChatError::Busy);
        }
        self.refresh_token();

        self.rollback_len = self.transcript.len();
        self.transcript.push_user(text);
        self.status = SessionStatus::Sending;
        self.publish();

        Ok(ChatRequest::build(self.mode, &self.transcript, context))
    }

    /// Send `text` and stream the reply into the transcript.
    ///
    /// On any failure the transcript is put back the way it was before the
    /// send and the session returns to idle.
    pub async fn send(
        &mut self,
        transport: &dyn Transport,
        text: &str,
        context: &RequestContext,
    ) -> Result<()> {
        let request = self.submit(text, context)?;
        let cancel = self.cancel.clone();

        match self.consume(transport, &request, &cancel).await {
            Ok(()) => {
                self.status = SessionStatus::Idle;
                tracing::info!(messages = self.transcript.len(), "reply complete");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "reply failed, restoring transcript");
                self.abort();
                Err(err)
            }
        }
    }

    async fn consume(
        &mut self,
        transport: &dyn Transport,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            opened = transport.open(request) => opened?,
        };
        self.status = SessionStatus::Streaming;

        let mut processor = StreamProcessor::new(self.recovery);
        let mut received = 0usize;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ChatError::Cancelled),
                next = body.next() => next,
            };

            match next {
                Some(chunk) => {
                    let chunk = chunk?;
                    received += chunk.len();
                    let status = processor.feed(&chunk, |text| self.apply(text))?;
                    if status == StreamStatus::Done {
                        break;
                    }
                }
                None if received == 0 => return Err(ChatError::EmptyBody),
                None => {
                    tracing::debug!("response body closed without sentinel");
                    processor.finish(|text| self.apply(text))?;
                    break;
                }
            }
        }

        Ok(())
    }

    fn apply(&mut self, accumulated: &str) {
        self.transcript.reconcile(accumulated);
        self.publish();
    }

    fn abort(&mut self) {
        self.transcript.truncate(self.rollback_len);
        self.status = SessionStatus::Idle;
        self.refresh_token();
        self.publish();
    }

    /// Replace a spent token so the next request can be cancelled on its own.
    fn refresh_token(&mut self) {
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.transcript.messages().to_vec());
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
