//! Line-based recogniser for the console host
//!
//! Each typed line is treated as a final transcript. A session ends after
//! a window of silence, the same way a platform recogniser times out, so
//! the session manager's auto-restart path runs as it would on a device.

use super::{RecognitionError, RecognitionEvent, RecognitionSink, SpeechRecognizer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Recogniser fed by lines of text
pub struct ConsoleRecognizer {
    lines: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    silence: Duration,
    task: Option<JoinHandle<()>>,
}

impl ConsoleRecognizer {
    /// Create a recogniser reading transcripts from `lines`
    pub fn new(lines: mpsc::UnboundedReceiver<String>, silence: Duration) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
            silence,
            task: None,
        }
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    fn start(&mut self, sink: RecognitionSink) -> Result<(), RecognitionError> {
        self.abort();

        let lines = self.lines.clone();
        let silence = self.silence;
        tracing::debug!("Console recognition session {} starting", sink.session());

        self.task = Some(tokio::spawn(async move {
            // Holding the receiver keeps a single session reading at a time
            let mut lines = lines.lock().await;
            sink.emit(RecognitionEvent::Started);

            loop {
                match tokio::time::timeout(silence, lines.recv()).await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if !line.is_empty() {
                            sink.emit(RecognitionEvent::FinalResult(line.to_string()));
                        }
                    }
                    Ok(None) => {
                        sink.emit(RecognitionEvent::Ended);
                        return;
                    }
                    Err(_) => {
                        sink.emit(RecognitionEvent::Error(RecognitionError::NoSpeech));
                        sink.emit(RecognitionEvent::Ended);
                        return;
                    }
                }
            }
        }));

        Ok(())
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ConsoleRecognizer {
    fn drop(&mut self) {
        self.abort();
    }
}
