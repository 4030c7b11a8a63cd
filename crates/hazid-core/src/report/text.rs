use std::path::Path;

use super::{Block, Cell, Run, Table};
use crate::draft::write_atomically;
use crate::error::HazidError;

fn run_text(run: &Run) -> String {
    match &run.link {
        Some(url) if url.trim_start_matches("mailto:") != run.text => {
            format!("{} <{}>", run.text, url)
        }
        _ => run.text.clone(),
    }
}

fn runs_text(runs: &[Run]) -> String {
    runs.iter().map(run_text).collect()
}

fn cell_text(cell: &Cell) -> String {
    runs_text(&cell.0)
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

fn table_text(table: &Table, out: &mut String) {
    if !table.header.is_empty() {
        let header = table.header.join(" | ");
        out.push_str(&header);
        out.push('\n');
        out.push_str(&"-".repeat(header.chars().count()));
        out.push('\n');
    }
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        out.push_str(cells.join(" | ").trim_end());
        out.push('\n');
    }
}

/// Plain-text rendering of the report blocks.
pub fn render_text(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Title(text) => {
                let title = text.to_uppercase();
                out.push_str(&title);
                out.push('\n');
                out.push_str(&"=".repeat(title.chars().count()));
                out.push_str("\n\n");
            }
            Block::Heading { level, text } => {
                out.push('\n');
                out.push_str(text);
                out.push('\n');
                if *level <= 1 {
                    out.push_str(&"-".repeat(text.chars().count()));
                    out.push('\n');
                }
            }
            Block::Paragraph { runs, .. } => {
                out.push_str(&runs_text(runs));
                out.push('\n');
            }
            Block::Table(table) => {
                table_text(table, &mut out);
                out.push('\n');
            }
            Block::PageBreak => out.push('\n'),
        }
    }
    out
}

pub fn write_text(blocks: &[Block], path: &Path) -> Result<(), HazidError> {
    let text = render_text(blocks);
    write_atomically(path, text.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_show_target_once() {
        let runs = vec![
            Run::link("CERN HSE", "https://hse.cern/"),
            Run::plain(", "),
            Run::link("cms-rso@cern.ch", "mailto:cms-rso@cern.ch"),
        ];
        assert_eq!(
            runs_text(&runs),
            "CERN HSE <https://hse.cern/>, cms-rso@cern.ch"
        );
    }

    #[test]
    fn test_table_rendering() {
        let blocks = vec![
            Block::heading(2, "Chemical"),
            Block::Table(Table {
                header: vec!["Subject".into(), "Details".into()],
                rows: vec![vec![Cell::from("Flammable"), Cell::from("5L ethanol\n\nkept in cabinet")]],
            }),
        ];
        let text = render_text(&blocks);
        assert!(text.contains("\nChemical\n"));
        assert!(text.contains("Subject | Details\n-----------------\n"));
        assert!(text.contains("Flammable | 5L ethanol / kept in cabinet\n"));
    }

    #[test]
    fn test_title_underlined() {
        let text = render_text(&[Block::Title("Safety Report".into())]);
        assert!(text.starts_with("SAFETY REPORT\n=============\n"));
    }
}
