//! Terminal presentation: tables, tree view, progress bars.

use crate::client::FetchError;
use crate::render::{lines, RenderedLine};
use crate::tree::FrequencyTree;
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// One row of the resource census.
pub struct CensusRow {
    pub resource_type: String,
    /// A failed count renders inline; it does not abort the census.
    pub count: Result<u64, FetchError>,
}

/// Render the census as a RESOURCE / COUNT table.
pub fn census_table(rows: &[CensusRow]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["RESOURCE", "COUNT"]);

    for row in rows {
        let count_cell = match &row.count {
            Ok(n) => Cell::new(n.to_string()),
            Err(_) => Cell::new("error").fg(Color::Red),
        };
        table.add_row(vec![Cell::new(&row.resource_type), count_cell]);
    }

    table
}

/// Render structure definitions as a NAME / TYPE / URL table.
pub fn structure_table(rows: &[(String, String, String)]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["NAME", "TYPE", "URL"]);

    for (name, type_name, url) in rows {
        table.add_row(vec![name, type_name, url]);
    }

    table
}

/// Print the frequency tree for `resource_type`, truncated below
/// `max_depth` levels under the resource root.
pub fn print_tree(resource_type: &str, tree: &FrequencyTree, max_depth: usize) {
    println!("{}", resource_type.bold());
    for line in lines(tree, max_depth) {
        match line {
            RenderedLine::Node {
                depth,
                label,
                count,
                values,
            } => {
                let indent = "  ".repeat(depth + 1);
                match values {
                    Some(values) => {
                        println!("{indent}{}({count}) {}", label.bold(), values.dimmed())
                    }
                    None => println!("{indent}{}({count})", label.bold()),
                }
            }
            RenderedLine::Elided { depth, omitted } => {
                let indent = "  ".repeat(depth + 2);
                println!(
                    "{indent}{}",
                    format!("... {omitted} deeper path(s) omitted").dimmed()
                );
            }
        }
    }
}

/// A counting progress bar on stderr, hidden under `--quiet`.
pub fn progress_bar(len: u64, prefix: &'static str, quiet: bool) -> ProgressBar {
    let bar = if quiet {
        ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::hidden())
    } else {
        ProgressBar::new(len)
    };
    bar.set_style(
        ProgressStyle::with_template("{prefix:10} [{bar:25}] {pos}/{len}")
            .unwrap()
            .progress_chars("=>-"),
    );
    bar.set_prefix(prefix);
    bar
}

/// A plain spinner on stderr for work without a known total.
pub fn spinner(message: &'static str, quiet: bool) -> ProgressBar {
    let bar = if quiet {
        ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
    } else {
        ProgressBar::new_spinner()
    };
    bar.set_message(message);
    bar.enable_steady_tick(std::time::Duration::from_millis(120));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_census_table_renders_error_rows() {
        let rows = vec![
            CensusRow {
                resource_type: "Patient".to_string(),
                count: Ok(5),
            },
            CensusRow {
                resource_type: "Observation".to_string(),
                count: Err(FetchError::Network("down".to_string())),
            },
        ];
        let rendered = census_table(&rows).to_string();
        assert!(rendered.contains("Patient"));
        assert!(rendered.contains('5'));
        assert!(rendered.contains("error"));
    }

    #[test]
    fn test_structure_table_columns() {
        let rows = vec![(
            "Account".to_string(),
            "Account".to_string(),
            "http://hl7.org/fhir/StructureDefinition/Account".to_string(),
        )];
        let rendered = structure_table(&rows).to_string();
        assert!(rendered.contains("NAME"));
        assert!(rendered.contains("http://hl7.org/fhir/StructureDefinition/Account"));
    }
}
