//! Speech output pipeline
//!
//! Reads text aloud with a remote synthesiser first and a local,
//! on-device synthesiser as the fallback. Callers only see whether
//! something was spoken, never which path produced it. Starting a new
//! utterance always stops the one in flight.

pub mod clean;
pub mod local;
pub mod process;
pub mod remote;

pub use clean::clean_for_speech;
pub use local::LocalSynthesizer;
pub use remote::RemoteSynthesizer;

use crate::config::SpeechConfig;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Error types for speech synthesis and playback
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("No speech synthesis available")]
    Unavailable,

    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Synthesis returned no audio")]
    EmptyAudio,

    #[error("Playback failed: {0}")]
    Playback(String),

    #[error("Speech was cancelled")]
    Cancelled,
}

/// A text-to-speech capability
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Whether this synthesiser can be used in this environment
    fn is_available(&self) -> bool {
        true
    }

    /// Speak `text`, resolving once playback has finished
    async fn speak(&self, text: &str) -> Result<(), SynthesisError>;

    /// Stop the current utterance; its `speak` resolves with `Cancelled`
    fn stop(&self);
}

/// Remote-then-local speech output
pub struct SpeechOutput {
    remote: Option<Arc<dyn Synthesizer>>,
    local: Option<Arc<dyn Synthesizer>>,
    /// Bumped on every new utterance and on stop
    generation: AtomicU64,
    speaking: AtomicBool,
    /// Wakes every utterance in flight on stop
    stop: Notify,
}

impl SpeechOutput {
    pub fn new(remote: Option<Arc<dyn Synthesizer>>, local: Option<Arc<dyn Synthesizer>>) -> Self {
        Self {
            remote,
            local,
            generation: AtomicU64::new(0),
            speaking: AtomicBool::new(false),
            stop: Notify::new(),
        }
    }

    /// Build the pipeline from speech settings
    pub fn from_config(config: &SpeechConfig) -> Self {
        let remote: Option<Arc<dyn Synthesizer>> = if config.remote_enabled {
            match RemoteSynthesizer::from_config(config) {
                Ok(remote) => Some(Arc::new(remote)),
                Err(e) => {
                    tracing::warn!("Remote synthesis disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };
        let local: Arc<dyn Synthesizer> = Arc::new(LocalSynthesizer::new(&config.local_command));

        Self::new(remote, Some(local))
    }

    /// Whether any synthesiser can speak in this environment
    pub fn is_supported(&self) -> bool {
        available(&self.remote).is_some() || available(&self.local).is_some()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Speak `text`, stopping any utterance already in flight
    ///
    /// Returns [`SynthesisError::Cancelled`] if another utterance or
    /// [`stop_speaking`](Self::stop_speaking) superseded this one.
    pub async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        let utterance = self.begin();
        self.speak_as(utterance, text).await
    }

    /// Claim a new utterance, stopping the one in flight
    ///
    /// Callers that speak from a spawned task claim the utterance before
    /// spawning, so a stop issued before the task runs still cancels it.
    pub fn begin(&self) -> u64 {
        self.stop_speaking();
        self.generation.load(Ordering::SeqCst)
    }

    /// Speak `text` as an utterance claimed with [`begin`](Self::begin)
    ///
    /// Resolves with [`SynthesisError::Cancelled`] without speaking when
    /// the utterance was superseded before it started.
    pub async fn speak_as(&self, utterance: u64, text: &str) -> Result<(), SynthesisError> {
        // Registered before the generation check so no stop can slip between
        let stopped = self.stop.notified();
        tokio::pin!(stopped);

        if self.is_superseded(utterance) {
            tracing::debug!("Utterance {} superseded before it started", utterance);
            return Err(SynthesisError::Cancelled);
        }

        let text = clean_for_speech(text);
        if text.is_empty() {
            return Ok(());
        }

        self.speaking.store(true, Ordering::SeqCst);
        let result = tokio::select! {
            result = self.speak_with_fallback(utterance, &text) => result,
            _ = &mut stopped => Err(SynthesisError::Cancelled),
        };
        if !self.is_superseded(utterance) {
            self.speaking.store(false, Ordering::SeqCst);
        }

        match &result {
            Ok(()) => tracing::debug!("Finished speaking {} characters", text.len()),
            Err(SynthesisError::Cancelled) => tracing::debug!("Speech superseded"),
            Err(e) => tracing::warn!("Speech output failed: {}", e),
        }
        result
    }

    async fn speak_with_fallback(&self, utterance: u64, text: &str) -> Result<(), SynthesisError> {
        if let Some(remote) = available(&self.remote) {
            match remote.speak(text).await {
                Ok(()) => return Ok(()),
                Err(_) if self.is_superseded(utterance) => return Err(SynthesisError::Cancelled),
                Err(e) => {
                    tracing::warn!("Remote synthesis failed, using local speech: {}", e);
                }
            }
        }

        let Some(local) = available(&self.local) else {
            return Err(SynthesisError::Unavailable);
        };

        match local.speak(text).await {
            Err(_) if self.is_superseded(utterance) => Err(SynthesisError::Cancelled),
            result => result,
        }
    }

    /// Stop whatever is being spoken
    pub fn stop_speaking(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.speaking.store(false, Ordering::SeqCst);
        self.stop.notify_waiters();
        for synth in [&self.remote, &self.local].into_iter().flatten() {
            synth.stop();
        }
    }

    fn is_superseded(&self, utterance: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != utterance
    }
}

fn available(synth: &Option<Arc<dyn Synthesizer>>) -> Option<&Arc<dyn Synthesizer>> {
    synth.as_ref().filter(|s| s.is_available())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    struct FakeSynth {
        name: &'static str,
        fail: bool,
        duration: Duration,
        spoken: Mutex<Vec<String>>,
        stop: Notify,
    }

    impl FakeSynth {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Self::slow(name, fail, Duration::ZERO)
        }

        fn slow(name: &'static str, fail: bool, duration: Duration) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail,
                duration,
                spoken: Mutex::new(Vec::new()),
                stop: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl Synthesizer for FakeSynth {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
            self.spoken.lock().push(text.to_string());
            tokio::select! {
                _ = tokio::time::sleep(self.duration) => {}
                _ = self.stop.notified() => return Err(SynthesisError::Cancelled),
            }
            if self.fail {
                Err(SynthesisError::ConnectionFailed("offline".to_string()))
            } else {
                Ok(())
            }
        }

        fn stop(&self) {
            self.stop.notify_waiters();
        }
    }

    #[tokio::test]
    async fn test_remote_success_skips_local() {
        let remote = FakeSynth::new("remote", false);
        let local = FakeSynth::new("local", false);
        let output = SpeechOutput::new(Some(remote.clone()), Some(local.clone()));

        output.speak("**Step one**").await.unwrap();
        assert_eq!(*remote.spoken.lock(), vec!["Step one"]);
        assert!(local.spoken.lock().is_empty());
        assert!(!output.is_speaking());
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_local() {
        let remote = FakeSynth::new("remote", true);
        let local = FakeSynth::new("local", false);
        let output = SpeechOutput::new(Some(remote.clone()), Some(local.clone()));

        output.speak("Bake at 350°F").await.unwrap();
        assert_eq!(*local.spoken.lock(), vec!["Bake at 350 degrees F"]);
    }

    #[tokio::test]
    async fn test_both_failing_reports_error() {
        let output = SpeechOutput::new(
            Some(FakeSynth::new("remote", true)),
            Some(FakeSynth::new("local", true)),
        );
        assert!(matches!(
            output.speak("hello").await,
            Err(SynthesisError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_no_synthesiser_is_unsupported() {
        let output = SpeechOutput::new(None, None);
        assert!(!output.is_supported());
        assert!(matches!(
            output.speak("hello").await,
            Err(SynthesisError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn test_empty_text_is_silent() {
        let local = FakeSynth::new("local", false);
        let output = SpeechOutput::new(None, Some(local.clone()));
        output.speak("  ** ").await.unwrap();
        assert!(local.spoken.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_speech_supersedes_old_without_fallback() {
        let remote = FakeSynth::slow("remote", false, Duration::from_secs(5));
        let local = FakeSynth::slow("local", false, Duration::from_secs(5));
        let output = Arc::new(SpeechOutput::new(Some(remote.clone()), Some(local.clone())));

        let first = tokio::spawn({
            let output = output.clone();
            async move { output.speak("first").await }
        });
        tokio::task::yield_now().await;
        assert!(output.is_speaking());

        output.speak("second").await.unwrap();
        assert!(matches!(
            first.await.unwrap(),
            Err(SynthesisError::Cancelled)
        ));
        assert_eq!(*remote.spoken.lock(), vec!["first", "second"]);
        assert!(local.spoken.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_start_cancels_claimed_utterance() {
        let local = FakeSynth::slow("local", false, Duration::from_secs(5));
        let output = SpeechOutput::new(None, Some(local.clone()));

        let utterance = output.begin();
        output.stop_speaking();

        assert!(matches!(
            output.speak_as(utterance, "Step one").await,
            Err(SynthesisError::Cancelled)
        ));
        assert!(local.spoken.lock().is_empty());
        assert!(!output.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_claim_never_overrides_newer() {
        let local = FakeSynth::slow("local", false, Duration::from_secs(1));
        let output = SpeechOutput::new(None, Some(local.clone()));

        let older = output.begin();
        let newer = output.begin();

        // The newer utterance starts first; the older one must not replace it
        output.speak_as(newer, "second").await.unwrap();
        assert!(matches!(
            output.speak_as(older, "first").await,
            Err(SynthesisError::Cancelled)
        ));
        assert_eq!(*local.spoken.lock(), vec!["second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_speaking_cancels() {
        let local = FakeSynth::slow("local", false, Duration::from_secs(5));
        let output = Arc::new(SpeechOutput::new(None, Some(local.clone())));

        let speaking = tokio::spawn({
            let output = output.clone();
            async move { output.speak("a long step").await }
        });
        tokio::task::yield_now().await;
        output.stop_speaking();

        assert!(matches!(
            speaking.await.unwrap(),
            Err(SynthesisError::Cancelled)
        ));
        assert!(!output.is_speaking());
    }
}
