//! Check result output

use clap::ValueEnum;
use console::style;
use crdsafe_core::{UpgradeError, ValidationFailure};
use serde::Serialize;

use crate::error::{CliError, Result};

/// How results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON document on stdout
    Json,
}

/// Machine readable check result
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub crd: &'a str,
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<&'a str>,
    pub failures: Vec<&'a ValidationFailure>,
}

impl<'a> Report<'a> {
    pub fn compatible(crd: &'a str) -> Self {
        Self {
            crd,
            compatible: true,
            aborted: None,
            failures: Vec::new(),
        }
    }

    pub fn from_error(err: &'a UpgradeError) -> Self {
        match err {
            UpgradeError::Incompatible { crd, failures } => Self {
                crd: crd.as_str(),
                compatible: false,
                aborted: None,
                failures: failures.iter().collect(),
            },
            UpgradeError::Aborted { crd, reason } => Self {
                crd: crd.as_str(),
                compatible: false,
                aborted: Some(reason.as_str()),
                failures: Vec::new(),
            },
        }
    }

    /// Number of distinct rules that reported
    pub fn rule_count(&self) -> usize {
        let mut rules: Vec<&str> = self.failures.iter().map(|f| f.rule.as_str()).collect();
        rules.sort_unstable();
        rules.dedup();
        rules.len()
    }
}

pub fn print_compatible(format: OutputFormat, crd: &str) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{} CRDs are compatible for upgrade", style("✓").green().bold());
            Ok(())
        }
        OutputFormat::Json => print_json(&Report::compatible(crd)),
    }
}

/// Print the JSON failure report; text mode relies on the error on stderr
pub fn print_incompatible(format: OutputFormat, err: &UpgradeError) -> Result<()> {
    match format {
        OutputFormat::Text => Ok(()),
        OutputFormat::Json => print_json(&Report::from_error(err)),
    }
}

/// Trailing summary line for the text error output
pub fn print_summary(err: &UpgradeError) {
    let report = Report::from_error(err);
    if report.failures.is_empty() {
        return;
    }
    eprintln!(
        "  {} {} failure(s) from {} rule(s)",
        style("→").blue(),
        report.failures.len(),
        report.rule_count()
    );
}

fn print_json(report: &Report<'_>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(report).map_err(CliError::internal)?;
    println!("{}", rendered);
    Ok(())
}
