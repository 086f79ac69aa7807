use std::io::Write;
use std::time::Duration;

use briefly_core::{LengthBounds, Outcome};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// A stderr spinner, or a hidden bar when stderr is not a terminal.
pub fn spinner(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Print a rendered result. The status line is colored by outcome and the
/// summary heading is bold; the rest is printed as-is.
pub fn print_result(
    w: &mut dyn Write,
    markdown: &str,
    outcome: Outcome,
    color: ColorMode,
) -> std::io::Result<()> {
    if !color.enabled() {
        return writeln!(w, "{}", markdown);
    }

    let mut lines = markdown.lines();
    if let Some(first) = lines.next() {
        match outcome {
            Outcome::Success => writeln!(w, "{}", first.green())?,
            Outcome::Warning => writeln!(w, "{}", first.yellow())?,
            Outcome::Error => writeln!(w, "{}", first.red().bold())?,
        }
    }
    for line in lines {
        if line.starts_with("### ") {
            writeln!(w, "{}", line.bold())?;
        } else if line.starts_with("📝") {
            writeln!(w, "{}", line.dimmed())?;
        } else {
            writeln!(w, "{}", line)?;
        }
    }
    Ok(())
}

/// Print the token bounds for a word target.
pub fn print_bounds(w: &mut dyn Write, words: u32, bounds: LengthBounds) -> std::io::Result<()> {
    writeln!(
        w,
        "{} words: min_length {} tokens, max_length {} tokens",
        words, bounds.min_tokens, bounds.max_tokens
    )?;
    if bounds.is_inverted() {
        let sent = bounds.clamped();
        writeln!(
            w,
            "(min exceeds max; requests are sent with {}-{} tokens)",
            sent.min_tokens, sent.max_tokens
        )?;
    }
    Ok(())
}
