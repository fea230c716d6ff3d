//! Hands-free voice control
//!
//! Keeps speech recognition running while voice control is enabled and
//! the host is active, turns final transcripts into commands, and
//! suspends listening while the assistant is speaking.
//!
//! ## States
//!
//! 1. **DISABLED** - Voice control is off
//! 2. **LISTENING** - A recognition session is running
//! 3. **STOPPED** - Enabled but between sessions (restart pending, or host inactive)
//! 4. **SPEAKING** - Speech output is playing; listening is suspended
//!
//! ## State Transitions
//!
//! ```text
//!              enable                         session ended
//! ┌──────────┐ ───────► ┌───────────┐ ──────────────────────► ┌─────────┐
//! │ DISABLED │          │ LISTENING │ ◄────────────────────── │ STOPPED │
//! └──────────┘ ◄─────── └───────────┘   restart delay elapsed └─────────┘
//!      ▲     disable /        │                                    ▲
//!      │  permission denied   │ speak                              │ speech finished
//!      │                      ▼                                    │ (post-speech delay)
//!      │  disable       ┌──────────┐                               │
//!      └─────────────── │ SPEAKING │ ──────────────────────────────┘
//!                       └──────────┘
//! ```
//!
//! Every session carries a monotonic id. Restarts and recogniser events
//! for an older id are dropped, so at most one session is ever live.

pub mod manager;
pub mod state;

pub use manager::{
    completion_announcement, HandsfreeError, HandsfreeHandle, HandsfreeManager, StepNavigator,
};
pub use state::{
    Effect, HandsfreeState, HandsfreeStatus, SessionInput, SessionMachine, UtteranceId,
    PERMISSION_DENIED_MESSAGE,
};
