//! Timer alarm
//!
//! Plays a short three-beep tone and a vibration pattern when a timer
//! completes. Devices without audio get the vibration only, and a failed
//! tone degrades to vibration instead of taking the engine down.

use crate::config::{self, AlarmConfig};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Alarm tone frequency in Hz
pub const ALARM_TONE_HZ: u32 = 880;

/// Number of beeps in one alarm
pub const ALARM_BEEPS: u32 = 3;

/// Length of a single beep in milliseconds
pub const BEEP_MS: u64 = 200;

/// Silence between beeps in milliseconds
pub const BEEP_GAP_MS: u64 = 100;

/// Vibration pattern: on, off, on, off, on (milliseconds)
pub const VIBRATION_PATTERN: [u64; 5] = [200, 100, 200, 100, 200];

/// Errors raised by an alarm output
#[derive(Debug, thiserror::Error)]
pub enum AlarmError {
    #[error("Tone generation is not available")]
    ToneUnavailable,

    #[error("Tone generation failed: {0}")]
    Tone(String),

    #[error("Vibration failed: {0}")]
    Vibration(String),
}

/// Host capability for alarm tone generation and vibration
pub trait AlarmOutput: Send + Sync {
    /// Whether this output can produce sound at all
    fn supports_audio(&self) -> bool;

    /// Play `beeps` beeps at `frequency_hz`
    fn play_tone(&self, frequency_hz: u32, beeps: u32) -> Result<(), AlarmError>;

    /// Vibrate with an on/off pattern in milliseconds
    fn vibrate(&self, pattern: &[u64]) -> Result<(), AlarmError>;
}

/// Alarm raised on timer completion
#[derive(Clone)]
pub struct Alarm {
    output: Arc<dyn AlarmOutput>,
    settings: AlarmConfig,
}

impl Alarm {
    pub fn new(output: Arc<dyn AlarmOutput>, settings: AlarmConfig) -> Self {
        Self { output, settings }
    }

    /// Build an alarm with the settings from the loaded config
    pub fn from_config(output: Arc<dyn AlarmOutput>) -> Self {
        let settings = match config::get_config() {
            Ok(cfg) => cfg.alarm,
            Err(e) => {
                tracing::warn!("Failed to get config for alarm: {}", e);
                AlarmConfig::default()
            }
        };
        Self::new(output, settings)
    }

    /// Sound the alarm for the named timer
    ///
    /// Never fails: every output error is logged and absorbed.
    pub fn sound(&self, timer_name: &str) {
        let settings = &self.settings;
        if settings.play_sounds && self.output.supports_audio() {
            match self.output.play_tone(settings.tone_hz, ALARM_BEEPS) {
                Ok(()) => tracing::debug!("Alarm tone played for '{}'", timer_name),
                Err(e) => {
                    tracing::warn!("Alarm tone failed for '{}', vibrating only: {}", timer_name, e)
                }
            }
        } else {
            tracing::debug!("Alarm sound skipped for '{}'", timer_name);
        }

        if settings.vibrate {
            if let Err(e) = self.output.vibrate(&VIBRATION_PATTERN) {
                tracing::debug!("Vibration unavailable: {}", e);
            }
        }
    }
}

impl Default for Alarm {
    fn default() -> Self {
        Self::from_config(Arc::new(SystemAlarm))
    }
}

/// Built-in alarm output using the terminal bell
///
/// Beeps are spaced on a background thread so the caller never blocks.
/// Desktop hosts have no vibration motor, so vibration always reports an
/// error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAlarm;

impl AlarmOutput for SystemAlarm {
    fn supports_audio(&self) -> bool {
        true
    }

    fn play_tone(&self, frequency_hz: u32, beeps: u32) -> Result<(), AlarmError> {
        // The bell has a fixed pitch; the frequency is only logged.
        tracing::debug!("Ringing terminal bell {} times ({} Hz requested)", beeps, frequency_hz);
        std::thread::Builder::new()
            .name("sous-alarm".to_string())
            .spawn(move || {
                let mut stderr = std::io::stderr();
                for i in 0..beeps {
                    if let Err(e) = stderr.write_all(b"\x07").and_then(|_| stderr.flush()) {
                        tracing::warn!("Failed to ring bell: {}", e);
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(BEEP_MS));
                    if i + 1 < beeps {
                        std::thread::sleep(Duration::from_millis(BEEP_GAP_MS));
                    }
                }
            })
            .map(|_| ())
            .map_err(|e| AlarmError::Tone(e.to_string()))
    }

    fn vibrate(&self, _pattern: &[u64]) -> Result<(), AlarmError> {
        Err(AlarmError::Vibration(
            "no vibration motor on this device".to_string(),
        ))
    }
}
