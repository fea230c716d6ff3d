//! Sous - hands-free voice control for cooking
//!
//! Recognises spoken commands while a recipe is open, runs named kitchen
//! timers, and reads steps aloud without listening to itself.

pub mod command;
pub mod config;
pub mod handsfree;
pub mod recognition;
pub mod speech;
pub mod timers;

/// Set up logging to stderr and `~/.sous/logs/sous-debug.log`
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_logging() {
    use tracing_subscriber::prelude::*;

    /// Format timestamps using the system's local time via chrono
    struct LocalTimer;
    impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
        fn format_time(
            &self,
            w: &mut tracing_subscriber::fmt::format::Writer<'_>,
        ) -> std::fmt::Result {
            write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
        }
    }

    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    let log_dir = dirs::home_dir()
        .map(|h| h.join(".sous").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("sous"));
    let _ = std::fs::create_dir_all(&log_dir);
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("sous-debug.log"))
        .ok();

    // stdout belongs to the console host, so terminal logging goes to stderr
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(LocalTimer);

    if let Some(file) = log_file {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_timer(LocalTimer)
            .with_ansi(false);
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr_layer)
            .init();
    }
}
