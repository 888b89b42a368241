//! Output formatting for CLI commands

use serde::Serialize;
use serde_json::{Map, Value};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Values separated by spaces, no header
    Simple,
    /// Aligned columns with a header
    #[default]
    Table,
    Csv,
    Tsv,
    Yaml,
    Json,
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
            _ => println!("{}", message),
        }
    }

    /// Prints an error message
    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "success": false,
                        "error": message
                    })
                );
            }
            _ => eprintln!("Error: {}", message),
        }
    }

    /// Prints a notice on stderr, keeping stdout clean for piping
    pub fn note(&self, message: &str) {
        if !self.is_json() {
            eprintln!("NOTE: {}", message);
        }
    }

    /// Prints structured data in JSON or YAML; other formats pretty-print JSON
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Yaml => {
                if let Ok(yaml) = serde_yaml::to_string(data) {
                    print!("{}", yaml);
                }
            }
            _ => {
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Prints rows under the given headers in the selected format
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        print!("{}", render_table(self.format, headers, rows));
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Returns true if using a machine-readable format
    pub fn is_structured(&self) -> bool {
        matches!(self.format, OutputFormat::Json | OutputFormat::Yaml)
    }

    /// Prints a verbose debug message (only when --verbose is set)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Prints a verbose debug message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}

/// Renders rows as text. Structured formats key each row by its lowercased
/// header.
pub fn render_table(format: OutputFormat, headers: &[&str], rows: &[Vec<String>]) -> String {
    match format {
        OutputFormat::Table => render_aligned(headers, rows),
        OutputFormat::Simple => rows
            .iter()
            .map(|row| format!("{}\n", row.join(" ")))
            .collect(),
        OutputFormat::Csv => render_separated(headers, rows, ',', true),
        OutputFormat::Tsv => render_separated(headers, rows, '\t', false),
        OutputFormat::Json => {
            let records = records(headers, rows);
            serde_json::to_string_pretty(&records)
                .map(|s| format!("{}\n", s))
                .unwrap_or_default()
        }
        OutputFormat::Yaml => serde_yaml::to_string(&records(headers, rows)).unwrap_or_default(),
    }
}

fn render_aligned(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let mut out = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ");
        out.truncate(out.trim_end().len());
        out.push('\n');
        out
    };

    let mut out = line(headers.to_vec());
    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(total));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}

fn render_separated(headers: &[&str], rows: &[Vec<String>], sep: char, quote: bool) -> String {
    let field = |value: &str| {
        if quote {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value.replace(['\t', '\n'], " ")
        }
    };

    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| field(h)).collect();
    out.push_str(&header.join(&sep.to_string()));
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| field(c)).collect();
        out.push_str(&cells.join(&sep.to_string()));
        out.push('\n');
    }
    out
}

fn records(headers: &[&str], rows: &[Vec<String>]) -> Vec<Map<String, Value>> {
    rows.iter()
        .map(|row| {
            headers
                .iter()
                .zip(row)
                .map(|(h, v)| (h.to_lowercase(), Value::String(v.clone())))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Vec<&'static str>, Vec<Vec<String>>) {
        (
            vec!["Name", "URL"],
            vec![
                vec!["work".to_string(), "https://gitea.example.com".to_string()],
                vec!["home".to_string(), "https://git.home".to_string()],
            ],
        )
    }

    #[test]
    fn table_aligns_columns() {
        let (headers, rows) = sample();
        let text = render_table(OutputFormat::Table, &headers, &rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name  URL");
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[2], "work  https://gitea.example.com");
        assert_eq!(lines[3], "home  https://git.home");
    }

    #[test]
    fn simple_has_no_header() {
        let (headers, rows) = sample();
        let text = render_table(OutputFormat::Simple, &headers, &rows);
        assert_eq!(text, "work https://gitea.example.com\nhome https://git.home\n");
    }

    #[test]
    fn csv_quotes_fields() {
        let headers = ["Name"];
        let rows = vec![vec!["say \"hi\"".to_string()]];
        let text = render_table(OutputFormat::Csv, &headers, &rows);
        assert_eq!(text, "\"Name\"\n\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn tsv_uses_tabs() {
        let (headers, rows) = sample();
        let text = render_table(OutputFormat::Tsv, &headers, &rows);
        assert!(text.starts_with("Name\tURL\n"));
    }

    #[test]
    fn json_keys_rows_by_header() {
        let (headers, rows) = sample();
        let text = render_table(OutputFormat::Json, &headers, &rows);
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["name"], "work");
        assert_eq!(parsed[1]["url"], "https://git.home");
    }

    #[test]
    fn yaml_lists_records() {
        let (headers, rows) = sample();
        let text = render_table(OutputFormat::Yaml, &headers, &rows);
        assert!(text.contains("name: work"));
    }
}
