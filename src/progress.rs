//! Progress reporting for the comparison run
//!
//! Provides real-time progress display using indicatif progress bars.

use crate::lockstep::{CompareProgress, CompareReport, Mismatch, Outcome};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Progress reporter that displays comparison status
pub struct ProgressReporter {
    /// Progress bar
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &CompareProgress) {
        let msg = format!(
            "Rounds: {} | Entries: {} | Rate: {:.0}/s",
            format_number(progress.rounds),
            format_number(progress.entries),
            progress.entries_per_second(),
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .rev()
                .map(|&b| b as char)
                .collect::<String>()
        })
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a header at the start of the comparison
pub fn print_header(roots: &[PathBuf]) {
    println!();
    println!(
        "{} {}",
        style("treesame").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    for (i, root) in roots.iter().enumerate() {
        println!("  {} {}", style(format!("Root {}:", i)).bold(), root.display());
    }
    println!("  {} {}", style("Agents:").bold(), roots.len());
    println!();
}

/// Print a summary of the comparison results
pub fn print_summary(report: &CompareReport) {
    let verdict = match report.outcome {
        Outcome::Equal => style("identical").green().bold(),
        Outcome::Different => style("different").red().bold(),
        Outcome::Interrupted => style("interrupted").yellow().bold(),
    };

    let duration_secs = report.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        report.entries as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Comparison Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Verdict:").bold(), verdict);
    println!("  {} {}", style("Rounds:").bold(), format_number(report.rounds));
    println!(
        "  {} {}",
        style("Entries:").bold(),
        format_number(report.entries)
    );
    println!(
        "  {} {:.1}s ({:.0} entries/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if report.errors > 0 {
        println!(
            "  {} {}",
            style("Errors:").yellow().bold(),
            format_number(report.errors)
        );
    }

    match &report.mismatch {
        Some(Mismatch::Entry {
            round,
            baseline_agent,
            baseline,
            agent,
            found,
        }) => {
            println!(
                "  {} round {}: root {} saw '{}', root {} saw '{}'",
                style("Mismatch:").red().bold(),
                format_number(*round),
                baseline_agent,
                baseline.display(),
                agent,
                found.display()
            );
        }
        Some(Mismatch::Shape {
            round,
            finished,
            active,
        }) => {
            println!(
                "  {} round {}: roots {:?} ran out of entries while roots {:?} continued",
                style("Mismatch:").red().bold(),
                format_number(*round),
                finished,
                active
            );
        }
        None => {}
    }
    println!();
}
