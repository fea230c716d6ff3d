//! Console host for Sous
//!
//! Typed lines stand in for spoken transcripts. Lines starting with `/`
//! control the host itself.

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use sous_lib::config;
use sous_lib::handsfree::{HandsfreeHandle, HandsfreeManager, HandsfreeStatus, StepNavigator};
use sous_lib::recognition::ConsoleRecognizer;
use sous_lib::speech::SpeechOutput;
use sous_lib::timers::{Alarm, SystemAlarm, TimerEngine};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};

#[derive(Parser)]
#[command(version, about = "Hands-free voice control for cooking")]
struct Cli {
    /// Recipe steps, in order
    #[arg(required = true)]
    steps: Vec<String>,

    /// Seconds without input before a listening session ends
    #[arg(long, default_value_t = 8)]
    silence_secs: u64,

    /// Start with voice control off
    #[arg(long)]
    no_voice: bool,
}

/// Recipe steps with a cursor, read aloud as they change
struct Recipe {
    steps: Vec<String>,
    current: Mutex<usize>,
    voice: OnceLock<HandsfreeHandle>,
}

impl Recipe {
    fn new(steps: Vec<String>) -> Self {
        Self {
            steps,
            current: Mutex::new(0),
            voice: OnceLock::new(),
        }
    }

    fn attach(&self, voice: HandsfreeHandle) {
        let _ = self.voice.set(voice);
    }

    /// Move the cursor by `delta`, clamped to the recipe, and show the step
    fn step_by(&self, delta: isize) {
        let index = {
            let mut current = self.current.lock();
            let last = self.steps.len().saturating_sub(1);
            *current = current.saturating_add_signed(delta).min(last);
            *current
        };
        self.show(index);
    }

    fn show(&self, index: usize) {
        let Some(step) = self.steps.get(index) else {
            return;
        };
        println!("Step {}/{}: {}", index + 1, self.steps.len(), step);

        if let Some(voice) = self.voice.get() {
            if let Err(e) = voice.speak(format!("Step {}. {}", index + 1, step)) {
                tracing::warn!("Failed to read step aloud: {}", e);
            }
        }
    }
}

impl StepNavigator for Recipe {
    fn on_next(&self) {
        self.step_by(1);
    }

    fn on_previous(&self) {
        self.step_by(-1);
    }

    fn on_repeat(&self) {
        self.step_by(0);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    sous_lib::init_logging();
    let cli = Cli::parse();

    let cfg = config::get_config()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    tracing::info!("Sous starting with {} recipe steps", cli.steps.len());

    let timers = TimerEngine::new(Alarm::new(Arc::new(SystemAlarm), cfg.alarm.clone()));
    let speech = Arc::new(SpeechOutput::from_config(&cfg.speech));
    if !speech.is_supported() {
        tracing::warn!("No speech synthesiser available, steps will only be printed");
    }

    let (transcripts, lines) = mpsc::unbounded_channel();
    let recognizer = ConsoleRecognizer::new(lines, Duration::from_secs(cli.silence_secs));
    let recipe = Arc::new(Recipe::new(cli.steps));

    let (mut manager, voice) = HandsfreeManager::new(
        &cfg.handsfree,
        Box::new(recognizer),
        speech,
        Arc::new(timers.clone()),
        recipe.clone(),
    );
    if cfg.handsfree.announce_timers {
        manager = manager.with_timer_announcements(timers.subscribe());
    }
    recipe.attach(voice.clone());
    let manager_task = manager.spawn();

    tokio::spawn(print_status_changes(voice.clone()));
    tokio::spawn(print_completions(timers.subscribe()));

    if !voice.status().speech_supported {
        println!("(read-aloud unavailable: steps will only be printed)");
    }
    if !cli.no_voice {
        voice.enable()?;
    }
    recipe.step_by(0);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = stdin.next_line().await.context("Failed to read input")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(control) = line.strip_prefix('/') {
            if !host_command(control, &voice, &timers)? {
                break;
            }
        } else if voice.status().listening {
            if transcripts.send(line.to_string()).is_err() {
                break;
            }
        } else {
            println!("(not listening: {})", voice.status().state.description());
        }
    }

    voice.shutdown();
    manager_task.await.context("Hands-free manager failed")?;
    timers.clear_all();
    tracing::info!("Sous stopped");
    Ok(())
}

/// Run a `/` host command; returns false when the host should exit
fn host_command(control: &str, voice: &HandsfreeHandle, timers: &TimerEngine) -> Result<bool> {
    let (name, rest) = control.split_once(' ').unwrap_or((control, ""));
    match name {
        "toggle" => voice.toggle()?,
        "say" if !voice.status().speech_supported => println!("Read-aloud is unavailable"),
        "say" => voice.speak(rest)?,
        "stop" => voice.stop_speaking()?,
        "away" => voice.set_active(false)?,
        "back" => voice.set_active(true)?,
        "timers" => {
            let views = timers.views();
            if views.is_empty() {
                println!("No timers");
            }
            for view in views {
                let marker = if view.is_complete {
                    "done"
                } else if view.is_paused {
                    "paused"
                } else {
                    "running"
                };
                println!(
                    "  {:<16} {:>8}  {:>3.0}%  {}",
                    view.name,
                    view.remaining,
                    view.progress * 100.0,
                    marker
                );
            }
        }
        "quit" | "exit" => return Ok(false),
        other => println!("Unknown command: /{}", other),
    }
    Ok(true)
}

async fn print_status_changes(voice: HandsfreeHandle) {
    let mut status = voice.watch_status();
    let mut shown = status.borrow().clone();
    while status.changed().await.is_ok() {
        let current = status.borrow_and_update().clone();
        print_status(&shown, &current);
        shown = current;
    }
}

fn print_status(previous: &HandsfreeStatus, current: &HandsfreeStatus) {
    if current.state != previous.state {
        println!("[{}]", current.state.description());
    }
    if current.last_command != previous.last_command {
        if let Some(feedback) = &current.last_command {
            println!("> {}", feedback);
        }
    }
    if current.error != previous.error {
        if let Some(error) = &current.error {
            println!("! {}", error);
        }
    }
}

async fn print_completions(mut completions: broadcast::Receiver<sous_lib::timers::TimerCompletion>) {
    loop {
        match completions.recv().await {
            Ok(done) => println!("** {} is done **", done.name),
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
