//! Kitchen timers
//!
//! Multiple independently named countdowns driven by one shared 100 ms
//! tick. Completion raises an alarm and a notification exactly once per
//! timer.

pub mod alarm;
pub mod engine;
pub mod format;

pub use alarm::{Alarm, AlarmError, AlarmOutput, SystemAlarm};
pub use engine::{
    Timer, TimerCompletion, TimerControls, TimerEngine, TimerId, TimerKey, TimerView,
    TICK_INTERVAL_MS,
};
pub use format::{format_duration, progress};
