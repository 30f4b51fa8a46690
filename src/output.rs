//! Output formatting and styling module.
//!
//! All human-facing console lines go through [`OutputFormatter`]: one line per
//! move attempt, a handful of lifecycle messages and the end-of-sweep summary.
//! Diagnostics for developers go through `tracing` instead.
//!
//! When stdout carries machine-readable output (`--json`), call
//! [`OutputFormatter::reserve_stdout`] and every human line moves to stderr.

use crate::file_category::Category;
use crate::file_organizer::SweepReport;
use colored::*;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

static STDOUT_RESERVED: AtomicBool = AtomicBool::new(false);

macro_rules! console_line {
    ($($arg:tt)*) => {
        if STDOUT_RESERVED.load(Ordering::Relaxed) {
            eprintln!($($arg)*);
        } else {
            println!($($arg)*);
        }
    };
}

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Routes all human-readable lines to stderr (`true`) or back to stdout.
    pub fn reserve_stdout(reserved: bool) {
        STDOUT_RESERVED.store(reserved, Ordering::Relaxed);
    }

    /// Whether human-readable lines currently go to stderr.
    pub fn stdout_reserved() -> bool {
        STDOUT_RESERVED.load(Ordering::Relaxed)
    }

    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use downtidy::output::OutputFormatter;
    /// OutputFormatter::success("Done!");
    /// ```
    pub fn success(message: &str) {
        console_line!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        console_line!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        console_line!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        console_line!("\n{}", header.bold());
    }

    /// Reports a file that was moved into its category folder.
    pub fn moved(file_name: &str, category: Category) {
        console_line!(
            "{} Moved: {} -> {}",
            "✓".green(),
            file_name,
            category.dir_name().bold()
        );
    }

    /// Reports a file that could not be moved.
    pub fn move_failed(file_name: &str, error: &dyn Display) {
        eprintln!("{} Failed to move {}: {}", "✗".red(), file_name, error);
    }

    /// Prints a table of moved files per category followed by failures.
    pub fn summary_table(report: &SweepReport) {
        Self::header("SUMMARY");

        let mut category_counts: HashMap<&'static str, usize> = HashMap::new();
        for moved in &report.moved {
            *category_counts.entry(moved.category.dir_name()).or_insert(0) += 1;
        }

        let mut categories: Vec<_> = category_counts.into_iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let max_category_len = categories
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0)
            .max(8);

        console_line!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        console_line!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in &categories {
            console_line!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = max_category_len
            );
        }

        console_line!("{}", "-".repeat(max_category_len + 10));
        console_line!(
            "{:<width$} | {} {}",
            "Total".bold(),
            report.moved.len().to_string().green().bold(),
            plural(report.moved.len()),
            width = max_category_len
        );

        if !report.failed.is_empty() {
            Self::warning(&format!(
                "{} {} could not be moved and stayed in place",
                report.failed.len(),
                plural(report.failed.len())
            ));
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
