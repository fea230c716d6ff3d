//! Multi-timer countdown engine
//!
//! Owns the timer collection and the shared tick loop. All mutation goes
//! through the engine's operations; each tick updates every running timer
//! under one lock, so readers never observe a half-updated collection.
//!
//! The tick loop is started lazily when a timer starts counting and stops
//! on its own once nothing is counting down. Completion side effects
//! (alarm and notification) are tracked by timer id in a handled set, so
//! they fire exactly once per timer however often the state is inspected.

use super::alarm::Alarm;
use super::format::{format_duration, progress};
use crate::command::DEFAULT_TIMER_NAME;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Interval of the shared countdown tick in milliseconds
pub const TICK_INTERVAL_MS: u64 = 100;

/// Capacity of the completion notification channel
const COMPLETION_CHANNEL_CAPACITY: usize = 16;

/// Timer identifier, unique for the lifetime of the process
pub type TimerId = u64;

/// Process-wide id counter; ids are never reused
static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// A single countdown timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: TimerId,
    /// Display name, "Timer" when none was given
    pub name: String,
    pub time_left_ms: u64,
    pub total_duration_ms: u64,
    /// True from creation until completion
    pub is_running: bool,
    pub is_paused: bool,
    /// Terminal; set once when the countdown reaches zero
    pub is_complete: bool,
}

impl Timer {
    /// Whether the next tick should count this timer down
    pub fn is_ticking(&self) -> bool {
        self.is_running && !self.is_paused && !self.is_complete
    }

    fn matches(&self, key: &TimerKey) -> bool {
        match key {
            TimerKey::Id(id) => self.id == *id,
            TimerKey::Name(name) => self.name.to_lowercase() == name.to_lowercase(),
        }
    }

    /// Render-ready view of this timer
    pub fn view(&self) -> TimerView {
        TimerView {
            id: self.id,
            name: self.name.clone(),
            remaining: format_duration(self.time_left_ms),
            progress: progress(self.time_left_ms, self.total_duration_ms),
            is_paused: self.is_paused,
            is_complete: self.is_complete,
        }
    }
}

/// Timer lookup key: an id, or a case-insensitive name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerKey {
    Id(TimerId),
    Name(String),
}

impl From<TimerId> for TimerKey {
    fn from(id: TimerId) -> Self {
        TimerKey::Id(id)
    }
}

impl From<&str> for TimerKey {
    fn from(name: &str) -> Self {
        TimerKey::Name(name.to_string())
    }
}

impl From<String> for TimerKey {
    fn from(name: String) -> Self {
        TimerKey::Name(name)
    }
}

/// Timer state formatted for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    pub id: TimerId,
    pub name: String,
    /// Remaining time as `M:SS` or `H:MM:SS`
    pub remaining: String,
    /// Elapsed fraction in `0.0..=1.0`
    pub progress: f64,
    pub is_paused: bool,
    pub is_complete: bool,
}

/// Notification published when a timer completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerCompletion {
    pub id: TimerId,
    pub name: String,
}

/// Timer operations invoked by recognised voice commands
///
/// A `None` name addresses every timer.
pub trait TimerControls: Send + Sync {
    fn on_timer_set(&self, name: Option<&str>, duration_ms: u64);
    fn on_timer_pause(&self, name: Option<&str>);
    fn on_timer_resume(&self, name: Option<&str>);
    fn on_timer_cancel(&self, name: Option<&str>);
}

#[derive(Default)]
struct TimerState {
    timers: Vec<Timer>,
    /// Ids whose completion side effects already fired
    handled: HashSet<TimerId>,
    ticker: Option<JoinHandle<()>>,
}

impl TimerState {
    fn find_mut(&mut self, key: &TimerKey) -> Option<&mut Timer> {
        self.timers.iter_mut().find(|t| t.matches(key))
    }

    fn any_ticking(&self) -> bool {
        self.timers.iter().any(Timer::is_ticking)
    }

    /// Drop handled ids whose timers no longer exist
    fn reconcile_handled(&mut self) {
        let live: HashSet<TimerId> = self.timers.iter().map(|t| t.id).collect();
        self.handled.retain(|id| live.contains(id));
    }
}

struct EngineInner {
    state: Mutex<TimerState>,
    alarm: Alarm,
    completions: broadcast::Sender<TimerCompletion>,
}

/// Handle to the timer engine; clones share the same timers
#[derive(Clone)]
pub struct TimerEngine {
    inner: Arc<EngineInner>,
}

impl TimerEngine {
    pub fn new(alarm: Alarm) -> Self {
        let (completions, _) = broadcast::channel(COMPLETION_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(TimerState::default()),
                alarm,
                completions,
            }),
        }
    }

    /// Subscribe to completion notifications
    pub fn subscribe(&self) -> broadcast::Receiver<TimerCompletion> {
        self.inner.completions.subscribe()
    }

    /// Create a running timer and return its id
    ///
    /// A blank or missing name becomes "Timer". Returns `None` for a zero
    /// duration.
    pub fn add_timer(&self, name: Option<&str>, duration_ms: u64) -> Option<TimerId> {
        if duration_ms == 0 {
            tracing::warn!("Ignoring timer with zero duration");
            return None;
        }

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_TIMER_NAME)
            .to_string();
        let id = NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            "Timer {} '{}' started for {}",
            id,
            name,
            format_duration(duration_ms)
        );

        self.inner.state.lock().timers.push(Timer {
            id,
            name,
            time_left_ms: duration_ms,
            total_duration_ms: duration_ms,
            is_running: true,
            is_paused: false,
            is_complete: false,
        });
        self.ensure_ticking();

        Some(id)
    }

    /// Pause a timer; no-op if missing, already paused, or complete
    pub fn pause_timer(&self, key: impl Into<TimerKey>) -> bool {
        let key = key.into();
        let mut state = self.inner.state.lock();
        match state.find_mut(&key) {
            Some(timer) if !timer.is_paused && !timer.is_complete => {
                timer.is_paused = true;
                tracing::info!("Timer {} '{}' paused", timer.id, timer.name);
                true
            }
            _ => false,
        }
    }

    /// Resume a paused timer; no-op if missing, not paused, or complete
    pub fn resume_timer(&self, key: impl Into<TimerKey>) -> bool {
        let key = key.into();
        let resumed = {
            let mut state = self.inner.state.lock();
            match state.find_mut(&key) {
                Some(timer) if timer.is_paused && !timer.is_complete => {
                    timer.is_paused = false;
                    tracing::info!("Timer {} '{}' resumed", timer.id, timer.name);
                    true
                }
                _ => false,
            }
        };
        if resumed {
            self.ensure_ticking();
        }
        resumed
    }

    /// Remove a timer whatever its state
    pub fn remove_timer(&self, key: impl Into<TimerKey>) -> bool {
        let key = key.into();
        let mut state = self.inner.state.lock();
        let Some(index) = state.timers.iter().position(|t| t.matches(&key)) else {
            return false;
        };
        let timer = state.timers.remove(index);
        state.reconcile_handled();
        tracing::info!("Timer {} '{}' removed", timer.id, timer.name);
        true
    }

    /// Dismiss a timer; same effect as [`remove_timer`](Self::remove_timer)
    pub fn dismiss_timer(&self, key: impl Into<TimerKey>) -> bool {
        self.remove_timer(key)
    }

    pub fn pause_all(&self) {
        let mut state = self.inner.state.lock();
        for timer in state.timers.iter_mut().filter(|t| !t.is_complete) {
            timer.is_paused = true;
        }
        tracing::info!("All timers paused");
    }

    pub fn resume_all(&self) {
        {
            let mut state = self.inner.state.lock();
            for timer in state.timers.iter_mut().filter(|t| !t.is_complete) {
                timer.is_paused = false;
            }
        }
        tracing::info!("All timers resumed");
        self.ensure_ticking();
    }

    /// Remove every timer and stop the tick loop
    pub fn clear_all(&self) {
        let mut state = self.inner.state.lock();
        state.timers.clear();
        state.handled.clear();
        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }
        tracing::info!("All timers cleared");
    }

    /// Look up a timer by id or case-insensitive name
    pub fn find_timer(&self, key: impl Into<TimerKey>) -> Option<Timer> {
        let key = key.into();
        self.inner
            .state
            .lock()
            .timers
            .iter()
            .find(|t| t.matches(&key))
            .cloned()
    }

    /// Snapshot of all timers in creation order
    pub fn timers(&self) -> Vec<Timer> {
        self.inner.state.lock().timers.clone()
    }

    /// Render-ready snapshot of all timers
    pub fn views(&self) -> Vec<TimerView> {
        self.inner.state.lock().timers.iter().map(Timer::view).collect()
    }

    /// Whether the shared tick loop is currently scheduled
    pub fn is_ticking(&self) -> bool {
        self.inner
            .state
            .lock()
            .ticker
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    /// Advance every counting timer by one tick interval
    ///
    /// Called by the tick loop; hosts without a tokio runtime may drive
    /// the engine by calling it directly. Returns the completions that
    /// fired during this tick.
    pub fn tick(&self) -> Vec<TimerCompletion> {
        self.advance(false).0
    }

    /// One tick; the flag tells the loop whether to keep running
    fn advance(&self, from_loop: bool) -> (Vec<TimerCompletion>, bool) {
        let (completed, keep_ticking) = {
            let mut state = self.inner.state.lock();

            for timer in state.timers.iter_mut().filter(|t| t.is_ticking()) {
                if timer.time_left_ms <= TICK_INTERVAL_MS {
                    timer.time_left_ms = 0;
                    timer.is_running = false;
                    timer.is_complete = true;
                } else {
                    timer.time_left_ms -= TICK_INTERVAL_MS;
                }
            }

            let TimerState {
                timers, handled, ..
            } = &mut *state;
            let completed: Vec<TimerCompletion> = timers
                .iter()
                .filter(|t| t.is_complete && handled.insert(t.id))
                .map(|t| TimerCompletion {
                    id: t.id,
                    name: t.name.clone(),
                })
                .collect();

            let keep_ticking = state.any_ticking();
            if from_loop && !keep_ticking {
                state.ticker = None;
                tracing::debug!("No timers counting down, tick loop stopping");
            }

            (completed, keep_ticking)
        };

        for completion in &completed {
            tracing::info!("Timer {} '{}' complete", completion.id, completion.name);
            self.inner.alarm.sound(&completion.name);
            // No subscribers is fine
            let _ = self.inner.completions.send(completion.clone());
        }

        (completed, keep_ticking)
    }

    /// Start the tick loop if a timer is counting and no loop is running
    fn ensure_ticking(&self) {
        let mut state = self.inner.state.lock();
        if !state.any_ticking() {
            return;
        }
        if state.ticker.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No async runtime, timers advance only on explicit ticks");
            return;
        };

        let weak = Arc::downgrade(&self.inner);
        state.ticker = Some(runtime.spawn(run_tick_loop(weak)));
        tracing::debug!("Tick loop started");
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(Alarm::default())
    }
}

async fn run_tick_loop(engine: Weak<EngineInner>) {
    let mut interval = tokio::time::interval(Duration::from_millis(TICK_INTERVAL_MS));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        let Some(inner) = engine.upgrade() else {
            break;
        };
        let engine = TimerEngine { inner };
        let (_, keep_ticking) = engine.advance(true);
        if !keep_ticking {
            break;
        }
    }
}

impl TimerControls for TimerEngine {
    fn on_timer_set(&self, name: Option<&str>, duration_ms: u64) {
        self.add_timer(name, duration_ms);
    }

    fn on_timer_pause(&self, name: Option<&str>) {
        match name {
            Some(name) => {
                if !self.pause_timer(name) {
                    tracing::debug!("No running timer named '{}' to pause", name);
                }
            }
            None => self.pause_all(),
        }
    }

    fn on_timer_resume(&self, name: Option<&str>) {
        match name {
            Some(name) => {
                if !self.resume_timer(name) {
                    tracing::debug!("No paused timer named '{}' to resume", name);
                }
            }
            None => self.resume_all(),
        }
    }

    fn on_timer_cancel(&self, name: Option<&str>) {
        match name {
            Some(name) => {
                if !self.remove_timer(name) {
                    tracing::debug!("No timer named '{}' to cancel", name);
                }
            }
            None => self.clear_all(),
        }
    }
}
