//! Non-interactive UI for CI/headless environments.

use super::theme::AilessTheme;
use super::{OutputMode, SpinnerHandle, UserInterface};

/// UI implementation for non-interactive mode.
///
/// Results go to stdout; progress, warnings and errors go to stderr so
/// piped output stays machine-readable.
pub struct NonInteractiveUI {
    mode: OutputMode,
    is_ci: bool,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            is_ci: super::is_ci(),
        }
    }

    /// Create with explicit CI flag (for testing).
    pub fn with_ci(mode: OutputMode, is_ci: bool) -> Self {
        Self { mode, is_ci }
    }

    fn shows_decoration(&self) -> bool {
        matches!(self.mode, OutputMode::Verbose | OutputMode::Normal)
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        let visible = self.mode.shows_spinners() && !self.is_ci;
        if visible {
            eprintln!("  {}", message);
        }
        Box::new(NoopSpinner { visible })
    }

    fn show_header(&mut self, title: &str) {
        if self.shows_decoration() {
            println!("\n{}\n", title);
        }
    }

    fn show_hint(&mut self, hint: &str) {
        if self.shows_decoration() {
            println!("  {}", hint);
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that only reports its final state.
struct NoopSpinner {
    visible: bool,
}

impl NoopSpinner {
    fn report(&self, line: String) {
        if self.visible {
            eprintln!("{}", line);
        }
    }
}

impl SpinnerHandle for NoopSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        self.report(AilessTheme::plain().format_success(msg));
    }

    fn finish_error(&mut self, msg: &str) {
        self.report(AilessTheme::plain().format_error(msg));
    }

    fn finish_skipped(&mut self, msg: &str) {
        self.report(AilessTheme::plain().format_skipped(msg));
    }
}
