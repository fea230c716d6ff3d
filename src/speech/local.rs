//! On-device speech synthesis through the system TTS command

use super::process::CancellableCommand;
use super::{SynthesisError, Synthesizer};
use async_trait::async_trait;

/// Local synthesiser (`say` on macOS, `espeak-ng` elsewhere by default)
#[derive(Debug)]
pub struct LocalSynthesizer {
    command: CancellableCommand,
}

impl LocalSynthesizer {
    pub fn new(command_line: &str) -> Self {
        Self {
            command: CancellableCommand::from_command_line(command_line),
        }
    }
}

#[async_trait]
impl Synthesizer for LocalSynthesizer {
    fn name(&self) -> &'static str {
        "local"
    }

    fn is_available(&self) -> bool {
        self.command.is_available()
    }

    async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        tracing::debug!(
            "Speaking {} characters with {}",
            text.len(),
            self.command.program()
        );
        self.command.run(text).await
    }

    fn stop(&self) {
        self.command.stop();
    }
}
