//! Voice command parsing
//!
//! Turns a final speech transcript into a structured cooking command.
//! Matching is a fixed, ordered list of regex grammars: the named-timer
//! forms first, then the unnamed timer, then named pause/resume/cancel,
//! and finally the generic navigation and timer aliases. The first
//! grammar that matches wins, because the later ones are more permissive
//! and would otherwise shadow the earlier ones.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::timers::format_duration;

/// A command recognised from a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParsedCommand {
    /// Advance to the next recipe step
    Next,
    /// Go back to the previous recipe step
    Previous,
    /// Read the current step again
    Repeat,
    /// Start a countdown timer
    #[serde(rename_all = "camelCase")]
    SetTimer {
        name: Option<String>,
        duration_ms: u64,
    },
    /// Pause a named timer, or every timer when no name was given
    PauseTimer { name: Option<String> },
    /// Resume a named timer, or every timer when no name was given
    ResumeTimer { name: Option<String> },
    /// Cancel a named timer, or every timer when no name was given
    CancelTimer { name: Option<String> },
}

impl ParsedCommand {
    /// Short text shown as transient "last command" feedback
    pub fn describe(&self) -> String {
        fn target(name: &Option<String>) -> String {
            match name {
                Some(name) => format!("{} timer", name),
                None => "timers".to_string(),
            }
        }

        match self {
            ParsedCommand::Next => "Next step".to_string(),
            ParsedCommand::Previous => "Previous step".to_string(),
            ParsedCommand::Repeat => "Repeat step".to_string(),
            ParsedCommand::SetTimer { name, duration_ms } => format!(
                "Timer set: {} {}",
                name.as_deref().unwrap_or(DEFAULT_TIMER_NAME),
                format_duration(*duration_ms)
            ),
            ParsedCommand::PauseTimer { name } => format!("Paused {}", target(name)),
            ParsedCommand::ResumeTimer { name } => format!("Resumed {}", target(name)),
            ParsedCommand::CancelTimer { name } => format!("Cancelled {}", target(name)),
        }
    }
}

/// Display name of a timer created without one
pub const DEFAULT_TIMER_NAME: &str = "Timer";

/// Words that are never accepted as a timer name on their own
const FILLER_WORDS: [&str; 5] = ["a", "the", "timer", "my", "for"];

const UNIT: &str = r"(s|secs?|seconds?|mins?|minutes?)";

/// `set <name> timer [for] <N> <unit>`
static NAMED_BEFORE_TIMER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^set\s+(.+?)\s+timer\s+(?:for\s+)?(\d+)\s*{UNIT}$"
    ))
    .unwrap()
});

/// `set [a] timer [for] <name> <N> <unit>`
static NAMED_AFTER_TIMER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^set\s+(?:a\s+)?timer\s+(?:for\s+)?(.+?)\s+(\d+)\s*{UNIT}$"
    ))
    .unwrap()
});

/// `timer [for] <N> <unit> [for] <name>`
static NAMED_AFTER_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\btimer\s+(?:for\s+)?(\d+)\s*{UNIT}\s+(?:for\s+)?(.+)$"
    ))
    .unwrap()
});

/// `[set] [a] timer [for] <N> <unit>`
static UNNAMED_TIMER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?:set\s+)?(?:a\s+)?timer\s+(?:for\s+)?(\d+)\s*{UNIT}$"
    ))
    .unwrap()
});

static NAMED_PAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^pause\s+(?:the\s+)?(.+?)(?:\s+timer)?$").unwrap());

static NAMED_RESUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^resume\s+(?:the\s+)?(.+?)(?:\s+timer)?$").unwrap());

static NAMED_CANCEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:cancel|stop|clear)\s+(?:the\s+)?(.+?)(?:\s+timer)?$").unwrap()
});

static NEXT_ALIASES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:next|next step|continue|go on|forward)\b").unwrap());

static PREVIOUS_ALIASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:previous|previous step|go back|back|backward)\b").unwrap()
});

static REPEAT_ALIASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:repeat|repeat that|say again|read again|again)\b").unwrap()
});

static PAUSE_ALIASES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:pause|hold)\b").unwrap());

static RESUME_ALIASES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:resume|unpause)\b").unwrap());

static CANCEL_ALIASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:cancel|(?:stop|clear|dismiss)(?: all)?(?: the)? timers?)\b").unwrap()
});

/// Parse a transcript into a command
///
/// Returns `None` when nothing matches; never panics on arbitrary input.
pub fn parse(transcript: &str) -> Option<ParsedCommand> {
    let text = normalise(transcript);
    if text.is_empty() {
        return None;
    }

    parse_set_timer(&text)
        .or_else(|| parse_named_control(&text))
        .or_else(|| parse_aliases(&text))
}

/// Lower-case, trim, and drop trailing sentence punctuation added by recognisers
fn normalise(transcript: &str) -> String {
    transcript
        .trim()
        .to_lowercase()
        .trim_end_matches(['.', '!', '?', ','])
        .trim()
        .to_string()
}

fn parse_set_timer(text: &str) -> Option<ParsedCommand> {
    if let Some(caps) = NAMED_BEFORE_TIMER.captures(text) {
        if let Some(cmd) = named_timer(&caps, 1, 2, 3) {
            return Some(cmd);
        }
    }

    if let Some(caps) = NAMED_AFTER_TIMER.captures(text) {
        if let Some(cmd) = named_timer(&caps, 1, 2, 3) {
            return Some(cmd);
        }
    }

    if let Some(caps) = NAMED_AFTER_DURATION.captures(text) {
        if let Some(cmd) = named_timer(&caps, 3, 1, 2) {
            return Some(cmd);
        }
    }

    let caps = UNNAMED_TIMER.captures(text)?;
    let duration_ms = duration_ms(&caps[1], &caps[2])?;
    Some(ParsedCommand::SetTimer {
        name: None,
        duration_ms,
    })
}

fn named_timer(
    caps: &Captures<'_>,
    name_group: usize,
    value_group: usize,
    unit_group: usize,
) -> Option<ParsedCommand> {
    let name = accept_name(&caps[name_group])?;
    let duration_ms = duration_ms(&caps[value_group], &caps[unit_group])?;
    Some(ParsedCommand::SetTimer {
        name: Some(name),
        duration_ms,
    })
}

fn parse_named_control(text: &str) -> Option<ParsedCommand> {
    if let Some(name) = captured_name(&NAMED_PAUSE, text) {
        return Some(ParsedCommand::PauseTimer { name: Some(name) });
    }
    if let Some(name) = captured_name(&NAMED_RESUME, text) {
        return Some(ParsedCommand::ResumeTimer { name: Some(name) });
    }
    if let Some(name) = captured_name(&NAMED_CANCEL, text) {
        return Some(ParsedCommand::CancelTimer { name: Some(name) });
    }
    None
}

fn captured_name(pattern: &Regex, text: &str) -> Option<String> {
    let caps = pattern.captures(text)?;
    accept_name(&caps[1])
}

fn parse_aliases(text: &str) -> Option<ParsedCommand> {
    if NEXT_ALIASES.is_match(text) {
        Some(ParsedCommand::Next)
    } else if PREVIOUS_ALIASES.is_match(text) {
        Some(ParsedCommand::Previous)
    } else if REPEAT_ALIASES.is_match(text) {
        Some(ParsedCommand::Repeat)
    } else if PAUSE_ALIASES.is_match(text) {
        Some(ParsedCommand::PauseTimer { name: None })
    } else if RESUME_ALIASES.is_match(text) {
        Some(ParsedCommand::ResumeTimer { name: None })
    } else if CANCEL_ALIASES.is_match(text) {
        Some(ParsedCommand::CancelTimer { name: None })
    } else {
        None
    }
}

/// Title-case a captured name, rejecting empty or filler-only captures
fn accept_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || FILLER_WORDS.contains(&trimmed) {
        return None;
    }
    Some(title_case(trimmed))
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn duration_ms(value: &str, unit: &str) -> Option<u64> {
    let value: u64 = value.parse().ok()?;
    let per_unit = if unit.starts_with('m') { 60_000 } else { 1_000 };
    value.checked_mul(per_unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(name: Option<&str>, duration_ms: u64) -> Option<ParsedCommand> {
        Some(ParsedCommand::SetTimer {
            name: name.map(str::to_string),
            duration_ms,
        })
    }

    #[test]
    fn test_unnamed_timer_minutes() {
        for n in [1u64, 5, 10, 45, 90] {
            assert_eq!(
                parse(&format!("set timer for {} minutes", n)),
                set(None, n * 60_000)
            );
        }
    }

    #[test]
    fn test_unnamed_timer_variants() {
        assert_eq!(parse("set a timer for 30 seconds"), set(None, 30_000));
        assert_eq!(parse("timer 2 min"), set(None, 120_000));
        assert_eq!(parse("Set a timer for 1 minute."), set(None, 60_000));
        assert_eq!(parse("set timer 15 secs"), set(None, 15_000));
    }

    #[test]
    fn test_named_before_timer() {
        assert_eq!(
            parse("set pork roast timer for 20 minutes"),
            set(Some("Pork Roast"), 1_200_000)
        );
        assert_eq!(parse("set rice timer 12 min"), set(Some("Rice"), 720_000));
    }

    #[test]
    fn test_named_between_timer_and_number() {
        assert_eq!(
            parse("set a timer for pasta 9 minutes"),
            set(Some("Pasta"), 540_000)
        );
    }

    #[test]
    fn test_named_after_duration() {
        assert_eq!(
            parse("timer 5 minutes for ground beef"),
            set(Some("Ground Beef"), 300_000)
        );
        assert_eq!(
            parse("set a timer for 10 minutes for the eggs"),
            set(Some("The Eggs"), 600_000)
        );
    }

    #[test]
    fn test_filler_word_is_not_a_name() {
        // "for" must not become a timer name
        assert_eq!(parse("set timer for 10 minutes"), set(None, 600_000));
        assert_eq!(parse("set a timer for 3 minutes"), set(None, 180_000));
    }

    #[test]
    fn test_named_pause_resume_cancel() {
        assert_eq!(
            parse("pause chicken thighs"),
            Some(ParsedCommand::PauseTimer {
                name: Some("Chicken Thighs".to_string())
            })
        );
        assert_eq!(
            parse("pause the pork roast timer"),
            Some(ParsedCommand::PauseTimer {
                name: Some("Pork Roast".to_string())
            })
        );
        assert_eq!(
            parse("resume rice"),
            Some(ParsedCommand::ResumeTimer {
                name: Some("Rice".to_string())
            })
        );
        assert_eq!(
            parse("stop the pasta timer"),
            Some(ParsedCommand::CancelTimer {
                name: Some("Pasta".to_string())
            })
        );
    }

    #[test]
    fn test_generic_timer_controls() {
        assert_eq!(
            parse("pause the timer"),
            Some(ParsedCommand::PauseTimer { name: None })
        );
        assert_eq!(
            parse("pause"),
            Some(ParsedCommand::PauseTimer { name: None })
        );
        assert_eq!(
            parse("resume timer"),
            Some(ParsedCommand::ResumeTimer { name: None })
        );
        assert_eq!(
            parse("cancel the timer"),
            Some(ParsedCommand::CancelTimer { name: None })
        );
        assert_eq!(
            parse("stop timer"),
            Some(ParsedCommand::CancelTimer { name: None })
        );
        assert_eq!(
            parse("cancel"),
            Some(ParsedCommand::CancelTimer { name: None })
        );
        // Not anchored to a named pattern, so only the alias applies
        assert_eq!(
            parse("okay clear all timers"),
            Some(ParsedCommand::CancelTimer { name: None })
        );
    }

    #[test]
    fn test_only_listed_fillers_are_rejected_as_names() {
        // "all" is not a filler word, so it is taken as a name
        assert_eq!(
            parse("pause all"),
            Some(ParsedCommand::PauseTimer {
                name: Some("All".to_string())
            })
        );
        assert_eq!(
            parse("cancel all"),
            Some(ParsedCommand::CancelTimer {
                name: Some("All".to_string())
            })
        );
        // Named patterns win over the aliases, so plurals are names too
        assert_eq!(
            parse("clear all timers"),
            Some(ParsedCommand::CancelTimer {
                name: Some("All Timers".to_string())
            })
        );
        assert_eq!(
            parse("cancel timers"),
            Some(ParsedCommand::CancelTimer {
                name: Some("Timers".to_string())
            })
        );
    }

    #[test]
    fn test_navigation_aliases() {
        assert_eq!(parse("next"), Some(ParsedCommand::Next));
        assert_eq!(parse("okay next step please"), Some(ParsedCommand::Next));
        assert_eq!(parse("Continue."), Some(ParsedCommand::Next));
        assert_eq!(parse("go back"), Some(ParsedCommand::Previous));
        assert_eq!(parse("previous step"), Some(ParsedCommand::Previous));
        assert_eq!(parse("say again"), Some(ParsedCommand::Repeat));
        assert_eq!(parse("can you repeat that"), Some(ParsedCommand::Repeat));
    }

    #[test]
    fn test_aliases_need_whole_words() {
        assert_eq!(parse("ask the nextdoor neighbour"), None);
        assert_eq!(parse("backpack"), None);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("how much salt"), None);
        assert_eq!(parse("set timer for minutes"), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(ParsedCommand::Next.describe(), "Next step");
        assert_eq!(
            ParsedCommand::SetTimer {
                name: None,
                duration_ms: 90_000
            }
            .describe(),
            "Timer set: Timer 1:30"
        );
        assert_eq!(
            ParsedCommand::PauseTimer {
                name: Some("Rice".to_string())
            }
            .describe(),
            "Paused Rice timer"
        );
    }
}
