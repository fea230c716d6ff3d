//! Remote speech synthesis over HTTP
//!
//! Posts the text to a synthesis endpoint, writes the returned audio to a
//! temporary file and plays it with the configured player command.

use super::process::CancellableCommand;
use super::{SynthesisError, Synthesizer};
use crate::config::SpeechConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

/// Request body for the synthesis endpoint
#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

/// Remote synthesiser with local audio playback
#[derive(Debug)]
pub struct RemoteSynthesizer {
    url: String,
    voice: String,
    client: reqwest::Client,
    timeout: Duration,
    player: CancellableCommand,
    /// Cancels the request as well as playback
    cancel: Notify,
}

impl RemoteSynthesizer {
    /// Create a remote synthesiser from speech settings
    pub fn from_config(config: &SpeechConfig) -> Result<Self, SynthesisError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SynthesisError::Client(e.to_string()))?;

        Ok(Self {
            url: config.remote_url.clone(),
            voice: config.voice.clone(),
            client,
            timeout,
            player: CancellableCommand::from_command_line(&config.player_command),
            cancel: Notify::new(),
        })
    }

    /// Fetch synthesised audio and its content type
    async fn synthesise(&self, text: &str) -> Result<(Vec<u8>, Option<String>), SynthesisError> {
        let request = SynthesisRequest {
            text,
            voice: &self.voice,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout(self.timeout.as_secs())
                } else {
                    SynthesisError::ConnectionFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SynthesisError::ServerError { status, message });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let audio = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::ConnectionFailed(e.to_string()))?;

        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        Ok((audio.to_vec(), content_type))
    }
}

#[async_trait]
impl Synthesizer for RemoteSynthesizer {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn is_available(&self) -> bool {
        !self.url.is_empty() && self.player.is_available()
    }

    async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);

        let (audio, content_type) = tokio::select! {
            result = self.synthesise(text) => result?,
            _ = &mut cancelled => return Err(SynthesisError::Cancelled),
        };
        tracing::debug!(
            "Remote synthesis returned {} bytes ({:?})",
            audio.len(),
            content_type
        );

        let path = temp_audio_path(content_type.as_deref());
        tokio::fs::write(&path, &audio)
            .await
            .map_err(|e| SynthesisError::Playback(format!("Failed to write audio: {}", e)))?;

        let audio_file = path.to_string_lossy().into_owned();
        let result = tokio::select! {
            result = self.player.run(&audio_file) => result,
            _ = &mut cancelled => Err(SynthesisError::Cancelled),
        };

        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::debug!("Failed to remove {}: {}", path.display(), e);
        }

        result
    }

    fn stop(&self) {
        self.cancel.notify_waiters();
        self.player.stop();
    }
}

/// Unique temporary file for one utterance
fn temp_audio_path(content_type: Option<&str>) -> PathBuf {
    std::env::temp_dir().join(format!(
        "sous-speech-{}.{}",
        Uuid::new_v4(),
        extension_for(content_type)
    ))
}

/// File extension players expect for an audio content type
fn extension_for(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|c| c.split(';').next())
        .map(str::trim)
        .unwrap_or_default();
    match mime {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/ogg" | "audio/opus" => "ogg",
        "audio/aac" => "aac",
        "audio/flac" => "flac",
        _ => "wav",
    }
}
