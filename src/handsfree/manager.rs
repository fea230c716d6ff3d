//! Hands-free session manager
//!
//! Owns the session state machine and drives it from a single event loop.
//! Recogniser events, control requests, finished speech and deferred
//! timeouts all arrive as messages, so the machine is only ever touched
//! from one task and no callback can race another.

use super::state::{Effect, HandsfreeStatus, SessionInput, SessionMachine};
use crate::command::{ParsedCommand, DEFAULT_TIMER_NAME};
use crate::config::HandsfreeConfig;
use crate::recognition::{RecognitionEvent, RecognitionSink, SessionId, SpeechRecognizer};
use crate::speech::{SpeechOutput, SynthesisError};
use crate::timers::{TimerCompletion, TimerControls};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

/// Recipe step navigation supplied by the host
pub trait StepNavigator: Send + Sync {
    fn on_next(&self);
    fn on_previous(&self);
    fn on_repeat(&self);
}

/// Errors returned by [`HandsfreeHandle`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandsfreeError {
    #[error("Hands-free manager has stopped")]
    Stopped,
}

enum Control {
    Input(SessionInput),
    Shutdown,
}

/// Cloneable control surface for a running [`HandsfreeManager`]
#[derive(Clone)]
pub struct HandsfreeHandle {
    control: mpsc::UnboundedSender<Control>,
    status: watch::Receiver<HandsfreeStatus>,
}

impl HandsfreeHandle {
    fn send(&self, input: SessionInput) -> Result<(), HandsfreeError> {
        self.control
            .send(Control::Input(input))
            .map_err(|_| HandsfreeError::Stopped)
    }

    pub fn enable(&self) -> Result<(), HandsfreeError> {
        self.send(SessionInput::Enable)
    }

    pub fn disable(&self) -> Result<(), HandsfreeError> {
        self.send(SessionInput::Disable)
    }

    pub fn toggle(&self) -> Result<(), HandsfreeError> {
        self.send(SessionInput::Toggle)
    }

    /// Tell the manager whether the host view is visible
    pub fn set_active(&self, active: bool) -> Result<(), HandsfreeError> {
        self.send(SessionInput::SetActive(active))
    }

    /// Read text aloud, suspending listening while it plays
    pub fn speak(&self, text: impl Into<String>) -> Result<(), HandsfreeError> {
        self.send(SessionInput::SpeakRequested(text.into()))
    }

    pub fn stop_speaking(&self) -> Result<(), HandsfreeError> {
        self.send(SessionInput::StopSpeaking)
    }

    /// Latest published status
    pub fn status(&self) -> HandsfreeStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn watch_status(&self) -> watch::Receiver<HandsfreeStatus> {
        self.status.clone()
    }

    /// Stop the manager, aborting recognition and speech
    pub fn shutdown(&self) {
        let _ = self.control.send(Control::Shutdown);
    }
}

/// Hands-free session manager
pub struct HandsfreeManager {
    machine: SessionMachine,
    recognizer: Box<dyn SpeechRecognizer>,
    speech: Arc<SpeechOutput>,
    timers: Arc<dyn TimerControls>,
    navigator: Arc<dyn StepNavigator>,
    completions: Option<broadcast::Receiver<TimerCompletion>>,
    control_rx: mpsc::UnboundedReceiver<Control>,
    recognition_tx: mpsc::UnboundedSender<(SessionId, RecognitionEvent)>,
    recognition_rx: mpsc::UnboundedReceiver<(SessionId, RecognitionEvent)>,
    deferred_tx: mpsc::UnboundedSender<SessionInput>,
    deferred_rx: mpsc::UnboundedReceiver<SessionInput>,
    tasks: JoinSet<()>,
    status_tx: watch::Sender<HandsfreeStatus>,
}

impl HandsfreeManager {
    /// Creates a manager and the handle used to control it
    pub fn new(
        config: &HandsfreeConfig,
        recognizer: Box<dyn SpeechRecognizer>,
        speech: Arc<SpeechOutput>,
        timers: Arc<dyn TimerControls>,
        navigator: Arc<dyn StepNavigator>,
    ) -> (Self, HandsfreeHandle) {
        let machine = SessionMachine::new(config, recognizer.is_supported())
            .with_speech_supported(speech.is_supported());
        let (status_tx, status_rx) = watch::channel(machine.status());
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (recognition_tx, recognition_rx) = mpsc::unbounded_channel();
        let (deferred_tx, deferred_rx) = mpsc::unbounded_channel();

        let manager = Self {
            machine,
            recognizer,
            speech,
            timers,
            navigator,
            completions: None,
            control_rx,
            recognition_tx,
            recognition_rx,
            deferred_tx,
            deferred_rx,
            tasks: JoinSet::new(),
            status_tx,
        };
        let handle = HandsfreeHandle {
            control: control_tx,
            status: status_rx,
        };
        (manager, handle)
    }

    /// Announce timer completions aloud
    pub fn with_timer_announcements(
        mut self,
        completions: broadcast::Receiver<TimerCompletion>,
    ) -> Self {
        self.completions = Some(completions);
        self
    }

    /// Run the event loop on a new task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run the event loop until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        tracing::info!("Hands-free manager started");

        loop {
            tokio::select! {
                control = self.control_rx.recv() => match control {
                    Some(Control::Input(input)) => self.apply(input),
                    Some(Control::Shutdown) | None => break,
                },
                Some((session, event)) = self.recognition_rx.recv() => {
                    self.apply(SessionInput::Recognition(session, event));
                }
                Some(input) = self.deferred_rx.recv() => self.apply(input),
                completion = next_completion(&mut self.completions) => match completion {
                    Some(completion) => self.announce(&completion),
                    None => self.completions = None,
                },
                Some(result) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = result {
                        if e.is_panic() {
                            tracing::error!("Hands-free task panicked: {}", e);
                        }
                    }
                }
            }
        }

        self.recognizer.abort();
        self.speech.stop_speaking();
        self.tasks.abort_all();
        tracing::info!("Hands-free manager stopped");
    }

    fn apply(&mut self, input: SessionInput) {
        for effect in self.machine.handle(input) {
            self.execute(effect);
        }
        self.publish();
    }

    fn publish(&self) {
        let status = self.machine.status();
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::StartRecognition(session) => self.start_recognition(session),
            Effect::AbortRecognition => self.recognizer.abort(),
            Effect::ScheduleRestart { session, delay } => {
                self.defer(delay, SessionInput::RestartDue(session));
            }
            Effect::Dispatch(command) => self.dispatch(command),
            Effect::Speak { utterance, text } => {
                // Claim now so a stop handled before the task runs still applies
                let claim = self.speech.begin();
                let speech = Arc::clone(&self.speech);
                let done = self.deferred_tx.clone();
                self.tasks.spawn(async move {
                    match speech.speak_as(claim, &text).await {
                        Ok(()) => {}
                        Err(SynthesisError::Cancelled) => {
                            tracing::debug!("Utterance {} cancelled", utterance);
                        }
                        Err(e) => tracing::warn!("Speech output failed: {}", e),
                    }
                    let _ = done.send(SessionInput::SpeechFinished(utterance));
                });
            }
            Effect::CancelSpeech => self.speech.stop_speaking(),
            Effect::ScheduleFeedbackClear { seq, delay } => {
                self.defer(delay, SessionInput::FeedbackExpired(seq));
            }
        }
    }

    fn start_recognition(&mut self, session: SessionId) {
        // Only one recogniser resource may exist at a time
        self.recognizer.abort();

        let sink = RecognitionSink::new(session, self.recognition_tx.clone());
        if let Err(e) = self.recognizer.start(sink) {
            tracing::warn!("Failed to start recognition session {}: {}", session, e);
            // Treat like a runtime failure so restart and force-disable apply
            let _ = self
                .recognition_tx
                .send((session, RecognitionEvent::Error(e)));
            let _ = self.recognition_tx.send((session, RecognitionEvent::Ended));
        }
    }

    fn defer(&mut self, delay: Duration, input: SessionInput) {
        let tx = self.deferred_tx.clone();
        self.tasks.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(input);
        });
    }

    fn dispatch(&self, command: ParsedCommand) {
        match command {
            ParsedCommand::Next => self.navigator.on_next(),
            ParsedCommand::Previous => self.navigator.on_previous(),
            ParsedCommand::Repeat => self.navigator.on_repeat(),
            ParsedCommand::SetTimer { name, duration_ms } => {
                self.timers.on_timer_set(name.as_deref(), duration_ms)
            }
            ParsedCommand::PauseTimer { name } => self.timers.on_timer_pause(name.as_deref()),
            ParsedCommand::ResumeTimer { name } => self.timers.on_timer_resume(name.as_deref()),
            ParsedCommand::CancelTimer { name } => self.timers.on_timer_cancel(name.as_deref()),
        }
    }

    fn announce(&mut self, completion: &TimerCompletion) {
        self.apply(SessionInput::SpeakRequested(completion_announcement(
            &completion.name,
        )));
    }
}

/// Spoken text for a completed timer
pub fn completion_announcement(name: &str) -> String {
    if name.eq_ignore_ascii_case(DEFAULT_TIMER_NAME) {
        format!("{} is done", DEFAULT_TIMER_NAME)
    } else {
        format!("{} timer is done", name)
    }
}

async fn next_completion(
    completions: &mut Option<broadcast::Receiver<TimerCompletion>>,
) -> Option<TimerCompletion> {
    let Some(rx) = completions else {
        return std::future::pending().await;
    };
    loop {
        match rx.recv().await {
            Ok(completion) => return Some(completion),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Missed {} timer completion announcements", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}
