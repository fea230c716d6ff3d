//! Speech-to-text capability
//!
//! The host platform supplies the recogniser; the session manager only
//! starts and aborts it and consumes its events. Every event is tagged
//! with the session id it was started under so events from a superseded
//! session can be told apart from the current one.

pub mod console;

pub use console::ConsoleRecognizer;

use tokio::sync::mpsc;

/// Monotonic recognition session identifier
pub type SessionId = u64;

/// Errors reported by a recogniser
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("No speech detected")]
    NoSpeech,

    #[error("Recognition aborted")]
    Aborted,

    #[error("Audio capture failed")]
    AudioCapture,

    #[error("Recognition service unreachable")]
    Network,

    #[error("Speech recognition is not supported on this device")]
    Unsupported,

    #[error("Recognition failed: {0}")]
    Other(String),
}

impl RecognitionError {
    /// Errors that are absorbed silently and recovered by auto-restart
    pub fn is_transient(&self) -> bool {
        matches!(self, RecognitionError::NoSpeech | RecognitionError::Aborted)
    }

    /// Errors that end hands-free mode
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RecognitionError::PermissionDenied | RecognitionError::Unsupported
        )
    }
}

/// Events produced by a recognition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// The recogniser is capturing audio
    Started,
    /// The session ended (silence timeout, natural end, or abort)
    Ended,
    /// A completed, non-interim transcript
    FinalResult(String),
    Error(RecognitionError),
}

/// Where a recognition session delivers its events
#[derive(Debug, Clone)]
pub struct RecognitionSink {
    session: SessionId,
    tx: mpsc::UnboundedSender<(SessionId, RecognitionEvent)>,
}

impl RecognitionSink {
    pub fn new(session: SessionId, tx: mpsc::UnboundedSender<(SessionId, RecognitionEvent)>) -> Self {
        Self { session, tx }
    }

    /// Session this sink was created for
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Deliver an event; returns false once the manager has gone away
    pub fn emit(&self, event: RecognitionEvent) -> bool {
        self.tx.send((self.session, event)).is_ok()
    }
}

/// Host speech-to-text capability
pub trait SpeechRecognizer: Send {
    /// Whether recognition can run in this environment at all
    fn is_supported(&self) -> bool;

    /// Start a recognition session delivering events to `sink`
    fn start(&mut self, sink: RecognitionSink) -> Result<(), RecognitionError>;

    /// Stop the current session immediately; no-op when idle
    fn abort(&mut self);
}
