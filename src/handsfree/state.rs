//! Hands-free session state machine
//!
//! A synchronous, I/O-free model of the recognition lifecycle. Every
//! input returns the effects the driver must perform; deferred work
//! (restarts, resuming after speech, clearing feedback) is requested as
//! an effect and comes back later as an input carrying the id it was
//! scheduled for. Inputs whose id no longer matches are stale and are
//! ignored, which is what keeps superseded sessions from restarting.

use crate::command::{self, ParsedCommand};
use crate::config::HandsfreeConfig;
use crate::recognition::{RecognitionError, RecognitionEvent, SessionId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifier of one speech output request
pub type UtteranceId = u64;

/// Message shown when microphone access is refused
pub const PERMISSION_DENIED_MESSAGE: &str =
    "Microphone access was denied. Enable it in your system settings to use hands-free mode.";

/// Hands-free session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HandsfreeState {
    /// Voice control is off
    #[default]
    Disabled,
    /// A recognition session is running
    Listening,
    /// Enabled but not listening; a restart may be pending
    Stopped,
    /// Speech output is playing and listening is suspended
    Speaking,
}

impl HandsfreeState {
    /// Returns a human-readable description of the state
    pub fn description(&self) -> &'static str {
        match self {
            HandsfreeState::Disabled => "Voice control off",
            HandsfreeState::Listening => "Listening",
            HandsfreeState::Stopped => "Paused",
            HandsfreeState::Speaking => "Speaking",
        }
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// Turn voice control on
    Enable,
    /// Turn voice control off
    Disable,
    /// Flip between enabled and disabled
    Toggle,
    /// The host view became visible (true) or hidden (false)
    SetActive(bool),
    /// An event from the recognition session with this id
    Recognition(SessionId, RecognitionEvent),
    /// A restart scheduled for this session id is due
    RestartDue(SessionId),
    /// Text should be read aloud
    SpeakRequested(String),
    /// Speech output for this utterance finished (or failed)
    SpeechFinished(UtteranceId),
    /// Stop the current utterance without starting another
    StopSpeaking,
    /// The feedback with this sequence number has been shown long enough
    FeedbackExpired(u64),
}

/// Work the driver performs on behalf of the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Abort any previous recogniser resource, then start this session
    StartRecognition(SessionId),
    /// Abort the running recogniser immediately
    AbortRecognition,
    /// Deliver `RestartDue(session)` after `delay`
    ScheduleRestart { session: SessionId, delay: Duration },
    /// Execute a recognised command
    Dispatch(ParsedCommand),
    /// Read `text` aloud, then deliver `SpeechFinished(utterance)`
    Speak { utterance: UtteranceId, text: String },
    /// Stop any speech in flight
    CancelSpeech,
    /// Deliver `FeedbackExpired(seq)` after `delay`
    ScheduleFeedbackClear { seq: u64, delay: Duration },
}

/// Observable status of hands-free mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandsfreeStatus {
    pub enabled: bool,
    pub active: bool,
    pub supported: bool,
    /// Whether anything can read text aloud
    pub speech_supported: bool,
    pub state: HandsfreeState,
    pub listening: bool,
    pub speaking: bool,
    /// Last recognised command, shown briefly
    pub last_command: Option<String>,
    /// Persistent error such as a permission denial
    pub error: Option<String>,
}

/// Hands-free session state machine
pub struct SessionMachine {
    state: HandsfreeState,
    enabled: bool,
    active: bool,
    supported: bool,
    speech_supported: bool,
    /// Id of the session that is currently wanted; bumping it invalidates
    /// every callback scheduled for an older session
    session: SessionId,
    /// Id of the latest utterance; bumping it invalidates older speech
    utterance: UtteranceId,
    speaking: bool,
    last_command: Option<String>,
    feedback_seq: u64,
    error: Option<String>,
    restart_delay: Duration,
    post_speech_delay: Duration,
    feedback_duration: Duration,
}

impl SessionMachine {
    /// Creates a disabled machine; `supported` is false when the host has
    /// no speech recognition at all
    pub fn new(config: &HandsfreeConfig, supported: bool) -> Self {
        Self {
            state: HandsfreeState::Disabled,
            enabled: false,
            active: true,
            supported,
            speech_supported: true,
            session: 0,
            utterance: 0,
            speaking: false,
            last_command: None,
            feedback_seq: 0,
            error: None,
            restart_delay: Duration::from_millis(config.restart_delay_ms),
            post_speech_delay: Duration::from_millis(config.post_speech_delay_ms),
            feedback_duration: Duration::from_millis(config.feedback_duration_ms),
        }
    }

    /// Record whether speech output is available
    pub fn with_speech_supported(mut self, speech_supported: bool) -> Self {
        self.speech_supported = speech_supported;
        self
    }

    /// Returns the current state
    pub fn state(&self) -> HandsfreeState {
        self.state
    }

    /// Id of the currently wanted session
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Snapshot for rendering
    pub fn status(&self) -> HandsfreeStatus {
        HandsfreeStatus {
            enabled: self.enabled,
            active: self.active,
            supported: self.supported,
            speech_supported: self.speech_supported,
            state: self.state,
            listening: self.state == HandsfreeState::Listening,
            speaking: self.speaking,
            last_command: self.last_command.clone(),
            error: self.error.clone(),
        }
    }

    /// Process an input and return the effects to perform
    pub fn handle(&mut self, input: SessionInput) -> Vec<Effect> {
        let previous = self.state;
        let effects = match input {
            SessionInput::Enable => self.enable(),
            SessionInput::Disable => self.disable(),
            SessionInput::Toggle => {
                if self.enabled {
                    self.disable()
                } else {
                    self.enable()
                }
            }
            SessionInput::SetActive(active) => self.set_active(active),
            SessionInput::Recognition(session, event) => {
                if session != self.session {
                    tracing::debug!(
                        "Ignoring {:?} from stale session {} (current {})",
                        event,
                        session,
                        self.session
                    );
                    Vec::new()
                } else {
                    self.on_recognition(session, event)
                }
            }
            SessionInput::RestartDue(session) => self.on_restart_due(session),
            SessionInput::SpeakRequested(text) => self.speak(text),
            SessionInput::SpeechFinished(utterance) => self.on_speech_finished(utterance),
            SessionInput::StopSpeaking => self.stop_speaking(),
            SessionInput::FeedbackExpired(seq) => {
                if seq == self.feedback_seq {
                    self.last_command = None;
                }
                Vec::new()
            }
        };

        if self.state != previous {
            tracing::info!(
                "Handsfree state transition: {:?} -> {:?}",
                previous,
                self.state
            );
        }
        effects
    }

    fn enable(&mut self) -> Vec<Effect> {
        if !self.supported {
            tracing::info!("Speech recognition unsupported, hands-free mode unavailable");
            return Vec::new();
        }
        if self.enabled {
            return Vec::new();
        }

        self.enabled = true;
        self.error = None;
        tracing::info!("Hands-free mode enabled");

        if self.active && !self.speaking {
            self.start_session()
        } else {
            self.state = if self.speaking {
                HandsfreeState::Speaking
            } else {
                HandsfreeState::Stopped
            };
            Vec::new()
        }
    }

    fn disable(&mut self) -> Vec<Effect> {
        if !self.enabled && !self.speaking {
            return Vec::new();
        }
        self.enabled = false;
        tracing::info!("Hands-free mode disabled");
        self.shut_down(HandsfreeState::Disabled)
    }

    fn set_active(&mut self, active: bool) -> Vec<Effect> {
        if self.active == active {
            return Vec::new();
        }
        self.active = active;
        tracing::debug!("Host context active: {}", active);

        if !active {
            let next = if self.enabled {
                HandsfreeState::Stopped
            } else {
                HandsfreeState::Disabled
            };
            return self.shut_down(next);
        }

        if self.enabled && self.state == HandsfreeState::Stopped {
            self.start_session()
        } else {
            Vec::new()
        }
    }

    /// Abort recognition and speech and drop transient state
    fn shut_down(&mut self, next: HandsfreeState) -> Vec<Effect> {
        self.session += 1;
        self.utterance += 1;
        self.speaking = false;
        self.last_command = None;
        self.state = next;
        vec![Effect::AbortRecognition, Effect::CancelSpeech]
    }

    fn start_session(&mut self) -> Vec<Effect> {
        self.session += 1;
        self.state = HandsfreeState::Listening;
        tracing::debug!("Starting recognition session {}", self.session);
        vec![Effect::StartRecognition(self.session)]
    }

    fn on_recognition(&mut self, session: SessionId, event: RecognitionEvent) -> Vec<Effect> {
        match event {
            RecognitionEvent::Started => {
                tracing::debug!("Recognition session {} started", session);
                Vec::new()
            }
            RecognitionEvent::FinalResult(transcript) => self.on_transcript(&transcript),
            RecognitionEvent::Ended => self.on_ended(session),
            RecognitionEvent::Error(error) => self.on_error(error),
        }
    }

    fn on_transcript(&mut self, transcript: &str) -> Vec<Effect> {
        if !self.enabled {
            return Vec::new();
        }

        let Some(parsed) = command::parse(transcript) else {
            tracing::debug!("No command in transcript '{}'", transcript);
            return Vec::new();
        };

        tracing::info!("Voice command: {:?}", parsed);
        self.feedback_seq += 1;
        self.last_command = Some(parsed.describe());

        vec![
            Effect::Dispatch(parsed),
            Effect::ScheduleFeedbackClear {
                seq: self.feedback_seq,
                delay: self.feedback_duration,
            },
        ]
    }

    fn on_ended(&mut self, session: SessionId) -> Vec<Effect> {
        if self.state != HandsfreeState::Listening {
            return Vec::new();
        }

        if self.enabled && self.active {
            self.state = HandsfreeState::Stopped;
            tracing::debug!("Recognition session {} ended, scheduling restart", session);
            vec![Effect::ScheduleRestart {
                session,
                delay: self.restart_delay,
            }]
        } else {
            self.state = HandsfreeState::Stopped;
            Vec::new()
        }
    }

    fn on_error(&mut self, error: RecognitionError) -> Vec<Effect> {
        if error.is_fatal() {
            self.enabled = false;
            if error == RecognitionError::Unsupported {
                tracing::info!("Speech recognition unsupported, disabling hands-free mode");
                self.supported = false;
            } else {
                tracing::error!("Recognition failed, disabling hands-free mode: {}", error);
                self.error = Some(PERMISSION_DENIED_MESSAGE.to_string());
            }
            return self.shut_down(HandsfreeState::Disabled);
        }

        if error.is_transient() {
            tracing::debug!("Transient recognition error: {}", error);
        } else {
            tracing::warn!("Recognition error, will restart: {}", error);
        }
        Vec::new()
    }

    fn on_restart_due(&mut self, session: SessionId) -> Vec<Effect> {
        let due = session == self.session
            && self.enabled
            && self.active
            && self.state == HandsfreeState::Stopped;

        if due {
            self.start_session()
        } else {
            tracing::debug!(
                "Dropping stale restart for session {} (current {}, {:?})",
                session,
                self.session,
                self.state
            );
            Vec::new()
        }
    }

    fn speak(&mut self, text: String) -> Vec<Effect> {
        self.utterance += 1;
        self.speaking = true;

        let mut effects = Vec::new();
        if self.enabled {
            // Suspend listening; the aborted session's late events go stale
            if self.state == HandsfreeState::Listening {
                effects.push(Effect::AbortRecognition);
            }
            self.session += 1;
            self.state = HandsfreeState::Speaking;
        }
        effects.push(Effect::Speak {
            utterance: self.utterance,
            text,
        });
        effects
    }

    fn stop_speaking(&mut self) -> Vec<Effect> {
        if !self.speaking {
            return Vec::new();
        }
        // Finish as if the current utterance ended
        let utterance = self.utterance;
        let mut effects = vec![Effect::CancelSpeech];
        effects.extend(self.on_speech_finished(utterance));
        self.utterance += 1;
        effects
    }

    fn on_speech_finished(&mut self, utterance: UtteranceId) -> Vec<Effect> {
        if utterance != self.utterance {
            tracing::debug!("Ignoring finish of superseded utterance {}", utterance);
            return Vec::new();
        }
        self.speaking = false;

        if self.state != HandsfreeState::Speaking {
            return Vec::new();
        }

        self.state = HandsfreeState::Stopped;
        if self.enabled && self.active {
            vec![Effect::ScheduleRestart {
                session: self.session,
                delay: self.post_speech_delay,
            }]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> SessionMachine {
        SessionMachine::new(&HandsfreeConfig::default(), true)
    }

    fn enabled() -> SessionMachine {
        let mut sm = machine();
        sm.handle(SessionInput::Enable);
        sm
    }

    fn restart_delay() -> Duration {
        Duration::from_millis(HandsfreeConfig::default().restart_delay_ms)
    }

    #[test]
    fn test_initial_state_is_disabled() {
        let sm = machine();
        assert_eq!(sm.state(), HandsfreeState::Disabled);
        assert!(!sm.status().enabled);
    }

    #[test]
    fn test_enable_starts_session() {
        let mut sm = machine();
        let effects = sm.handle(SessionInput::Enable);
        assert_eq!(effects, vec![Effect::StartRecognition(1)]);
        assert_eq!(sm.state(), HandsfreeState::Listening);
        assert!(sm.status().listening);
    }

    #[test]
    fn test_speech_support_reported_separately() {
        let mut sm = SessionMachine::new(&HandsfreeConfig::default(), true)
            .with_speech_supported(false);
        let status = sm.status();
        assert!(status.supported);
        assert!(!status.speech_supported);

        sm.handle(SessionInput::Enable);
        assert_eq!(sm.state(), HandsfreeState::Listening);
        assert!(!sm.status().speech_supported);
    }

    #[test]
    fn test_toggle_flips_enabled() {
        let mut sm = machine();
        sm.handle(SessionInput::Toggle);
        assert!(sm.is_enabled());
        sm.handle(SessionInput::Toggle);
        assert!(!sm.is_enabled());
        assert_eq!(sm.state(), HandsfreeState::Disabled);
    }

    #[test]
    fn test_enable_when_unsupported_does_nothing() {
        let mut sm = SessionMachine::new(&HandsfreeConfig::default(), false);
        assert!(sm.handle(SessionInput::Enable).is_empty());
        assert_eq!(sm.state(), HandsfreeState::Disabled);
        assert!(!sm.status().supported);
        assert_eq!(sm.status().error, None);
    }

    #[test]
    fn test_enable_while_inactive_waits_for_activation() {
        let mut sm = machine();
        sm.handle(SessionInput::SetActive(false));
        assert!(sm.handle(SessionInput::Enable).is_empty());
        assert_eq!(sm.state(), HandsfreeState::Stopped);

        let effects = sm.handle(SessionInput::SetActive(true));
        assert_eq!(effects, vec![Effect::StartRecognition(sm.session())]);
        assert_eq!(sm.state(), HandsfreeState::Listening);
    }

    #[test]
    fn test_final_result_dispatches_command() {
        let mut sm = enabled();
        let effects = sm.handle(SessionInput::Recognition(
            1,
            RecognitionEvent::FinalResult("next step".to_string()),
        ));
        assert_eq!(
            effects,
            vec![
                Effect::Dispatch(ParsedCommand::Next),
                Effect::ScheduleFeedbackClear {
                    seq: 1,
                    delay: Duration::from_millis(2000)
                }
            ]
        );
        assert_eq!(sm.status().last_command.as_deref(), Some("Next step"));
        assert_eq!(sm.state(), HandsfreeState::Listening);
    }

    #[test]
    fn test_unrecognised_transcript_is_ignored() {
        let mut sm = enabled();
        let effects = sm.handle(SessionInput::Recognition(
            1,
            RecognitionEvent::FinalResult("what a lovely smell".to_string()),
        ));
        assert!(effects.is_empty());
        assert_eq!(sm.status().last_command, None);
    }

    #[test]
    fn test_feedback_clears_only_for_latest_command() {
        let mut sm = enabled();
        sm.handle(SessionInput::Recognition(1, RecognitionEvent::FinalResult("next".into())));
        sm.handle(SessionInput::Recognition(1, RecognitionEvent::FinalResult("back".into())));

        sm.handle(SessionInput::FeedbackExpired(1));
        assert_eq!(sm.status().last_command.as_deref(), Some("Previous step"));
        sm.handle(SessionInput::FeedbackExpired(2));
        assert_eq!(sm.status().last_command, None);
    }

    #[test]
    fn test_end_schedules_restart() {
        let mut sm = enabled();
        let effects = sm.handle(SessionInput::Recognition(1, RecognitionEvent::Ended));
        assert_eq!(
            effects,
            vec![Effect::ScheduleRestart {
                session: 1,
                delay: restart_delay()
            }]
        );
        assert_eq!(sm.state(), HandsfreeState::Stopped);

        let effects = sm.handle(SessionInput::RestartDue(1));
        assert_eq!(effects, vec![Effect::StartRecognition(2)]);
        assert_eq!(sm.state(), HandsfreeState::Listening);
    }

    #[test]
    fn test_stale_restart_is_ignored_after_new_session() {
        let mut sm = enabled();
        // Session 1 ends and a restart is pending
        sm.handle(SessionInput::Recognition(1, RecognitionEvent::Ended));
        // Toggle off and on again before the restart fires
        sm.handle(SessionInput::Disable);
        let effects = sm.handle(SessionInput::Enable);
        let current = sm.session();
        assert_eq!(effects, vec![Effect::StartRecognition(current)]);

        // The old restart must not start another session
        assert!(sm.handle(SessionInput::RestartDue(1)).is_empty());
        assert_eq!(sm.session(), current);
        assert_eq!(sm.state(), HandsfreeState::Listening);
    }

    #[test]
    fn test_stale_end_is_ignored() {
        let mut sm = enabled();
        sm.handle(SessionInput::Recognition(1, RecognitionEvent::Ended));
        sm.handle(SessionInput::RestartDue(1));
        assert_eq!(sm.session(), 2);

        // A late end from session 1 leaves session 2 alone
        assert!(sm
            .handle(SessionInput::Recognition(1, RecognitionEvent::Ended))
            .is_empty());
        assert_eq!(sm.state(), HandsfreeState::Listening);
    }

    #[test]
    fn test_disable_aborts_everything() {
        let mut sm = enabled();
        sm.handle(SessionInput::Recognition(1, RecognitionEvent::FinalResult("next".into())));
        let effects = sm.handle(SessionInput::Disable);
        assert_eq!(effects, vec![Effect::AbortRecognition, Effect::CancelSpeech]);
        assert_eq!(sm.state(), HandsfreeState::Disabled);
        assert_eq!(sm.status().last_command, None);

        // Late events from the aborted session change nothing
        assert!(sm
            .handle(SessionInput::Recognition(1, RecognitionEvent::Ended))
            .is_empty());
        assert!(sm.handle(SessionInput::RestartDue(1)).is_empty());
    }

    #[test]
    fn test_deactivation_stops_and_reactivation_resumes() {
        let mut sm = enabled();
        let effects = sm.handle(SessionInput::SetActive(false));
        assert_eq!(effects, vec![Effect::AbortRecognition, Effect::CancelSpeech]);
        assert_eq!(sm.state(), HandsfreeState::Stopped);
        assert!(sm.is_enabled());

        // An end arriving while inactive must not restart
        assert!(sm.handle(SessionInput::RestartDue(sm.session())).is_empty());

        let effects = sm.handle(SessionInput::SetActive(true));
        assert_eq!(effects, vec![Effect::StartRecognition(sm.session())]);
    }

    #[test]
    fn test_permission_denied_force_disables() {
        let mut sm = enabled();
        let effects = sm.handle(SessionInput::Recognition(
            1,
            RecognitionEvent::Error(RecognitionError::PermissionDenied),
        ));
        assert_eq!(effects, vec![Effect::AbortRecognition, Effect::CancelSpeech]);
        let status = sm.status();
        assert!(!status.enabled);
        assert_eq!(status.state, HandsfreeState::Disabled);
        assert_eq!(status.error.as_deref(), Some(PERMISSION_DENIED_MESSAGE));

        // Re-enabling clears the error
        sm.handle(SessionInput::Enable);
        assert_eq!(sm.status().error, None);
    }

    #[test]
    fn test_unsupported_error_hides_control() {
        let mut sm = enabled();
        sm.handle(SessionInput::Recognition(
            1,
            RecognitionEvent::Error(RecognitionError::Unsupported),
        ));
        let status = sm.status();
        assert!(!status.enabled);
        assert!(!status.supported);
        assert_eq!(status.error, None);
        assert!(sm.handle(SessionInput::Enable).is_empty());
    }

    #[test]
    fn test_transient_errors_are_swallowed() {
        let mut sm = enabled();
        for error in [RecognitionError::NoSpeech, RecognitionError::Aborted] {
            let effects =
                sm.handle(SessionInput::Recognition(1, RecognitionEvent::Error(error)));
            assert!(effects.is_empty());
        }
        let status = sm.status();
        assert!(status.enabled);
        assert_eq!(status.error, None);
        assert_eq!(status.state, HandsfreeState::Listening);
    }

    #[test]
    fn test_speaking_suspends_and_resumes_listening() {
        let mut sm = enabled();
        let effects = sm.handle(SessionInput::SpeakRequested("Step one".to_string()));
        assert_eq!(
            effects,
            vec![
                Effect::AbortRecognition,
                Effect::Speak {
                    utterance: 1,
                    text: "Step one".to_string()
                }
            ]
        );
        assert_eq!(sm.state(), HandsfreeState::Speaking);
        assert!(sm.status().speaking);
        assert!(!sm.status().listening);

        // The aborted session's end is stale
        assert!(sm
            .handle(SessionInput::Recognition(1, RecognitionEvent::Ended))
            .is_empty());

        let effects = sm.handle(SessionInput::SpeechFinished(1));
        let session = sm.session();
        assert_eq!(
            effects,
            vec![Effect::ScheduleRestart {
                session,
                delay: Duration::from_millis(500)
            }]
        );
        assert_eq!(
            sm.handle(SessionInput::RestartDue(session)),
            vec![Effect::StartRecognition(session + 1)]
        );
    }

    #[test]
    fn test_superseded_speech_finish_is_ignored() {
        let mut sm = enabled();
        sm.handle(SessionInput::SpeakRequested("one".to_string()));
        sm.handle(SessionInput::SpeakRequested("two".to_string()));

        assert!(sm.handle(SessionInput::SpeechFinished(1)).is_empty());
        assert_eq!(sm.state(), HandsfreeState::Speaking);
        assert!(!sm.handle(SessionInput::SpeechFinished(2)).is_empty());
        assert_eq!(sm.state(), HandsfreeState::Stopped);
    }

    #[test]
    fn test_speech_when_disabled_does_not_listen() {
        let mut sm = machine();
        let effects = sm.handle(SessionInput::SpeakRequested("Timer is done".to_string()));
        assert_eq!(
            effects,
            vec![Effect::Speak {
                utterance: 1,
                text: "Timer is done".to_string()
            }]
        );
        assert_eq!(sm.state(), HandsfreeState::Disabled);
        assert!(sm.handle(SessionInput::SpeechFinished(1)).is_empty());
        assert!(!sm.status().speaking);
    }

    #[test]
    fn test_disable_during_speech_cancels_resume() {
        let mut sm = enabled();
        sm.handle(SessionInput::SpeakRequested("Step two".to_string()));
        sm.handle(SessionInput::Disable);
        assert!(sm.handle(SessionInput::SpeechFinished(1)).is_empty());
        assert_eq!(sm.state(), HandsfreeState::Disabled);
    }

    #[test]
    fn test_stop_speaking_resumes_listening() {
        let mut sm = enabled();
        sm.handle(SessionInput::SpeakRequested("Step three".to_string()));
        let effects = sm.handle(SessionInput::StopSpeaking);
        assert_eq!(effects[0], Effect::CancelSpeech);
        assert!(matches!(effects[1], Effect::ScheduleRestart { .. }));
        // The cancelled utterance's own finish is now stale
        assert!(sm.handle(SessionInput::SpeechFinished(1)).is_empty());
    }

    #[test]
    fn test_transcript_while_disabled_is_ignored() {
        let mut sm = enabled();
        sm.handle(SessionInput::Disable);
        let session = sm.session();
        assert!(sm
            .handle(SessionInput::Recognition(
                session,
                RecognitionEvent::FinalResult("next".into())
            ))
            .is_empty());
    }
}
