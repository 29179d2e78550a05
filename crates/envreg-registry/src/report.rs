//! List output
//!
//! Provides [`EnvironmentReport`] rows and [`format_report`] for a
//! column-aligned table.

use envreg_name::EnvironmentName;
use envreg_store::EnvironmentSpec;
use serde::Serialize;

/// One row of `list` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentReport {
    /// Canonical environment name
    pub name: String,
    /// Target cluster URI
    pub uri: String,
    /// Default namespace, may be empty
    pub namespace: String,
}

impl EnvironmentReport {
    /// Build a row from a stored environment
    #[must_use]
    pub fn from_entry(name: &EnvironmentName, spec: &EnvironmentSpec) -> Self {
        Self {
            name: name.to_string(),
            uri: spec.uri.clone(),
            namespace: spec.namespace.clone(),
        }
    }
}

const HEADERS: [&str; 3] = ["NAME", "URI", "NAMESPACE"];

/// Render rows as a table with a header and an underline row
///
/// Columns are separated by two spaces; the last column is not padded.
#[must_use]
pub fn format_report(rows: &[EnvironmentReport]) -> String {
    let underline: Vec<String> = HEADERS.iter().map(|h| "=".repeat(h.len())).collect();
    let mut lines: Vec<[&str; 3]> = vec![
        HEADERS,
        [underline[0].as_str(), underline[1].as_str(), underline[2].as_str()],
    ];
    lines.extend(
        rows.iter()
            .map(|r| [r.name.as_str(), r.uri.as_str(), r.namespace.as_str()]),
    );

    let mut widths = [0usize; 3];
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for line in &lines {
        let mut text = String::new();
        for (i, cell) in line.iter().enumerate() {
            if i + 1 == line.len() {
                text.push_str(cell);
            } else {
                let pad = widths[i] - cell.chars().count();
                text.push_str(cell);
                text.push_str(&" ".repeat(pad + 2));
            }
        }
        out.push_str(text.trim_end());
        out.push('\n');
    }
    out
}
