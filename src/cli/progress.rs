//! Terminal progress display for fetches and downloads
//!
//! Spinners and bars follow the saved theme: bright colours on dark
//! terminals, darker ones on light terminals. When stdout is not a terminal
//! every bar is hidden and progress only reaches the log.

use indicatif::{ProgressBar, ProgressStyle};

use crate::app::tasks::TaskProgress;
use crate::constants::progress;

/// Colour scheme derived from the persisted theme flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTheme {
    pub dark: bool,
}

impl ProgressTheme {
    pub fn new(dark: bool) -> Self {
        Self { dark }
    }

    fn spinner_template(&self) -> &'static str {
        if self.dark {
            "{spinner:.green} {msg}"
        } else {
            "{spinner:.blue} {msg}"
        }
    }
}

impl Default for ProgressTheme {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Whether bars should be drawn at all
pub fn progress_enabled() -> bool {
    atty::is(atty::Stream::Stdout)
}

/// Spinner for work without a known size
pub fn spinner(theme: ProgressTheme, message: impl Into<String>) -> ProgressBar {
    if !progress_enabled() {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(theme.spinner_template())
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["◐", "◓", "◑", "◒"]),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(progress::SPINNER_TICK);
    spinner
}

/// Drives one bar from a task's progress updates
///
/// Starts as a spinner and switches to a percentage bar on the first update
/// that carries a percentage.
pub struct TaskProgressDisplay {
    bar: ProgressBar,
    theme: ProgressTheme,
    has_percent: bool,
}

impl TaskProgressDisplay {
    pub fn new(theme: ProgressTheme, message: impl Into<String>) -> Self {
        Self {
            bar: spinner(theme, message),
            theme,
            has_percent: false,
        }
    }

    /// Applies one progress update
    pub fn update(&mut self, update: TaskProgress) {
        match update.percent {
            Some(percent) => {
                if !self.has_percent {
                    self.switch_to_bar();
                }
                self.bar.set_position(u64::from(percent));
                self.bar.set_message(update.message);
            }
            None => self.bar.set_message(update.message),
        }
    }

    fn switch_to_bar(&mut self) {
        self.has_percent = true;
        self.bar.set_length(100);
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template(percent_template(self.theme))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
    }

    /// Finishes with a final message left on screen
    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    /// Removes the bar without a message
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Percentage bar template; the byte counts live in the message
fn percent_template(theme: ProgressTheme) -> &'static str {
    if theme.dark {
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg}"
    } else {
        "{spinner:.blue} [{elapsed_precise}] [{bar:40.blue/black}] {msg}"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse() {
        for theme in [ProgressTheme::new(true), ProgressTheme::new(false)] {
            assert!(ProgressStyle::default_spinner()
                .template(theme.spinner_template())
                .is_ok());
            assert!(ProgressStyle::default_bar()
                .template(percent_template(theme))
                .is_ok());
        }
    }

    #[test]
    fn test_themes_differ() {
        assert_ne!(
            percent_template(ProgressTheme::new(true)),
            percent_template(ProgressTheme::new(false))
        );
        assert!(ProgressTheme::default().dark);
    }

    #[test]
    fn test_display_switches_to_percentage() {
        let mut display = TaskProgressDisplay::new(ProgressTheme::default(), "starting");
        display.update(TaskProgress {
            percent: None,
            message: "Fetching avatar details...".to_string(),
        });
        assert!(!display.has_percent);

        display.update(TaskProgress {
            percent: Some(42),
            message: "Downloading file... 4.2 MB / 10.0 MB (42%)".to_string(),
        });
        assert!(display.has_percent);
        display.clear();
    }
}
