//! Output formatting for canarm (table, json, csv)

use anyhow::{bail, Result};
use canarm_core::CommandOutcome;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print the outcome of an operation; a failed outcome becomes an error
    pub fn outcome(&self, outcome: &CommandOutcome) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
            ),
            OutputFormat::Table | OutputFormat::Csv => {
                if outcome.success {
                    self.success(&outcome.message);
                }
            }
        }
        if !outcome.success {
            bail!("{}", outcome.message);
        }
        Ok(())
    }

    /// Print any serializable value as JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, data: &T) {
        println!(
            "{}",
            serde_json::to_string_pretty(data).unwrap_or_else(|_| "null".to_string())
        );
    }

    /// Print data in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    let table = Table::new(data).to_string();
                    println!("{}", table);
                }
            }
            OutputFormat::Json => self.print_json(data),
            OutputFormat::Csv => print_csv(data),
        }
    }

    /// Print key-value pairs
    pub fn print_kv(&self, pairs: &[(&str, String)]) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => {
                let map: std::collections::BTreeMap<&str, &str> =
                    pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
                self.print_json(&map);
            }
            OutputFormat::Csv => {
                let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
                println!("{}", keys.join(","));
                let values: Vec<String> = pairs.iter().map(|(_, v)| escape_csv(v)).collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Print data as CSV
fn print_csv<T: Serialize>(data: &[T]) {
    if data.is_empty() {
        return;
    }

    let first = serde_json::to_value(&data[0]).unwrap_or_default();
    if let serde_json::Value::Object(map) = &first {
        let headers: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
        println!("{}", headers.join(","));

        for item in data {
            if let Ok(serde_json::Value::Object(row)) = serde_json::to_value(item) {
                let values: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        row.get(*h)
                            .map(|v| match v {
                                serde_json::Value::String(s) => escape_csv(s),
                                other => escape_csv(&other.to_string()),
                            })
                            .unwrap_or_default()
                    })
                    .collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Escape a value for CSV output
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Format joint values as `61=0.100, 62=-0.200`
pub fn format_angles<'a>(values: impl IntoIterator<Item = (&'a String, &'a f32)>) -> String {
    values
        .into_iter()
        .map(|(motor, angle)| format!("{}={:.3}", motor, angle))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Manipulator display for arms command
#[derive(Debug, Tabled, Serialize)]
pub struct ArmRow {
    #[tabled(rename = "Interface")]
    pub interface: String,
    #[tabled(rename = "Side")]
    pub side: String,
    #[tabled(rename = "Motors")]
    pub motors: String,
}

/// Joint angle display for read command
#[derive(Debug, Tabled, Serialize)]
pub struct AngleRow {
    #[tabled(rename = "Motor")]
    pub motor: u8,
    #[tabled(rename = "Angle (rad)")]
    pub angle: String,
}

/// Gain display for read command
#[derive(Debug, Tabled, Serialize)]
pub struct GainRow {
    #[tabled(rename = "Register")]
    pub register: String,
    #[tabled(rename = "Index")]
    pub index: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Way-point display for records command
#[derive(Debug, Tabled, Serialize)]
pub struct WaypointRow {
    #[tabled(rename = "#")]
    pub position: usize,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Angles")]
    pub angles: String,
}

/// Sequence display for seq list command
#[derive(Debug, Tabled, Serialize)]
pub struct SequenceRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Side")]
    pub side: String,
    #[tabled(rename = "Model")]
    pub model: String,
    #[tabled(rename = "Way-points")]
    pub waypoints: usize,
}

/// Merged file display for merged list command
#[derive(Debug, Tabled, Serialize)]
pub struct MergedRow {
    #[tabled(rename = "File")]
    pub file: String,
    #[tabled(rename = "Direction")]
    pub direction: String,
}

/// Playback summary display
#[derive(Debug, Tabled, Serialize)]
pub struct PlaybackRow {
    #[tabled(rename = "Interface")]
    pub interface: String,
    #[tabled(rename = "Sequence")]
    pub sequence: String,
    #[tabled(rename = "Way-points")]
    pub waypoints: usize,
    #[tabled(rename = "Sent")]
    pub sent: usize,
    #[tabled(rename = "Failed")]
    pub failed: usize,
}

/// Routine step display for run-merged command
#[derive(Debug, Tabled, Serialize)]
pub struct StepRow {
    #[tabled(rename = "Step")]
    pub step: String,
    #[tabled(rename = "Side")]
    pub side: String,
    #[tabled(rename = "Result")]
    pub result: String,
}
