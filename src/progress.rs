//! Progress display module
//!
//! Styled console helpers, the progress bar and the run counters.

use crate::processor::ScanSummary;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Print the application banner
pub fn print_banner() {
    let banner = r#"
╔══════════════════════════════════════════════════════════════╗
║                                                              ║
║   ██╗     ██╗███╗   ██╗██╗  ██╗███████╗██╗███████╗████████╗  ║
║   ██║     ██║████╗  ██║██║ ██╔╝██╔════╝██║██╔════╝╚══██╔══╝  ║
║   ██║     ██║██╔██╗ ██║█████╔╝ ███████╗██║█████╗     ██║     ║
║   ██║     ██║██║╚██╗██║██╔═██╗ ╚════██║██║██╔══╝     ██║     ║
║   ███████╗██║██║ ╚████║██║  ██╗███████║██║██║        ██║     ║
║   ╚══════╝╚═╝╚═╝  ╚═══╝╚═╝  ╚═╝╚══════╝╚═╝╚═╝        ╚═╝     ║
║                                                              ║
║            Sift URL lists against pattern wordlists          ║
║                                                  v1.0.0      ║
╚══════════════════════════════════════════════════════════════╝
"#;

    eprintln!("{}", banner.green());
}

/// Print a section header
pub fn print_header(text: &str) {
    eprintln!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    eprintln!("  {} {}", "ℹ".cyan(), text);
}

/// Print a success message
pub fn print_success(text: &str) {
    eprintln!("  {} {}", "✔".green(), text.green());
}

/// Print a warning message
pub fn print_warning(text: &str) {
    eprintln!("  {} {}", "⚠".yellow(), text.yellow());
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Echo a matched URL on the diagnostic channel
pub fn print_match(url: &str) {
    eprintln!("{}", url);
}

/// Create a styled progress bar counting URLs
pub fn create_progress_bar(total: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);

    pb.set_style(
        ProgressStyle::default_bar()
            .template(concat!(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.green/dim}] ",
                "{pos}/{len} ({percent}%, {per_sec}) {msg}",
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Counters for one run, shared by every task
#[derive(Debug)]
pub struct ScanStats {
    pub processed: AtomicU64,
    pub matched: AtomicU64,
    pub skipped: AtomicU64,
    pub malformed: AtomicU64,
    pub write_errors: AtomicU64,
    pub start_time: Instant,
}

impl ScanStats {
    pub fn new() -> Self {
        Self {
            processed: AtomicU64::new(0),
            matched: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn add_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_match(&self) {
        self.matched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn get_matched(&self) -> u64 {
        self.matched.load(Ordering::Relaxed)
    }

    pub fn get_skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn get_malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    pub fn get_write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Print final statistics
pub fn print_summary(summary: &ScanSummary, output: &Path) {
    let per_sec = summary.processed as f64 / summary.elapsed.as_secs_f64().max(f64::EPSILON);

    eprintln!();
    eprintln!("{}", "═".repeat(60).green());
    eprintln!("{}", "                      SIFTING COMPLETE".green().bold());
    eprintln!("{}", "═".repeat(60).green());
    eprintln!();

    eprintln!("  {} {}", "URLs checked:   ".green(), format_number(summary.processed));
    eprintln!(
        "  {} {}",
        "Matched:        ".green().bold(),
        format_number(summary.matched).green().bold()
    );
    eprintln!("  {} {}", "Too short:      ".yellow(), format_number(summary.skipped));

    if summary.malformed > 0 {
        eprintln!(
            "  {} {}",
            "Malformed:      ".yellow(),
            format_number(summary.malformed).yellow()
        );
    }
    if summary.write_errors > 0 {
        eprintln!("  {} {}", "Write errors:   ".red(), format_number(summary.write_errors).red());
    }

    eprintln!();
    eprintln!("  {} {}", "Duration:       ".green(), format_duration(summary.elapsed));
    eprintln!("  {} {:.2} URLs/sec", "Throughput:     ".green(), per_sec);
    eprintln!("  {} {:?}", "Output:         ".green(), output);
    eprintln!();
    eprintln!("{}", "═".repeat(60).green());
}

/// Format a number with thousand separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    }
}
