//! Help-text rendering for user-visible failures.

use std::io::Write;

/// Help messages the runtime knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    /// A startup stage failed inside the runtime itself.
    StartupInternalFailure,
}

impl HelpTopic {
    /// Stable topic name, `<file>:<topic>` style.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::StartupInternalFailure => "ess-runtime:startup:internal-failure",
        }
    }
}

/// Write-only sink for help messages.
pub trait HelpRenderer: Send + Sync {
    /// Render `topic` for a failure in `stage` that returned `error_name`
    /// (`code`).
    fn render(&self, topic: HelpTopic, stage: &str, error_name: &str, code: i32);
}

/// Format the text for `topic`.
#[must_use]
pub fn format_help(topic: HelpTopic, stage: &str, error_name: &str, code: i32) -> String {
    let rule = "-".repeat(74);
    match topic {
        HelpTopic::StartupInternalFailure => format!(
            "{rule}\n\
             Runtime startup failed inside the environment setup service.\n\
             This usually points at an internal problem or a misconfigured\n\
             component rather than at the application itself.\n\n\
             \x20 {stage} failed\n\
             \x20 --> Returned value {error_name} ({code}) instead of SUCCESS\n\
             {rule}\n"
        ),
    }
}

/// Renders help text to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrHelp;

impl HelpRenderer for StderrHelp {
    fn render(&self, topic: HelpTopic, stage: &str, error_name: &str, code: i32) {
        let text = format_help(topic, stage, error_name, code);
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(text.as_bytes());
        let _ = stderr.flush();
    }
}
