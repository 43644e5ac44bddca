//! User-facing diagnostics: the redirectable log sink and the help-text
//! renderer used for startup failures.

pub mod help;
pub mod output;

pub use help::{HelpRenderer, HelpTopic, StderrHelp};
pub use output::DiagnosticOutput;
