pub mod assemble;
pub mod docx;
pub mod text;

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::HazidError;

pub use assemble::{assemble, resolve_recommendation, ReportContext};

/// A span of text with inline formatting. `link` turns the run into a
/// hyperlink to that URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub link: Option<String>,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Run {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Run {
            text: text.into(),
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Run {
            text: text.into(),
            italic: true,
            ..Default::default()
        }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Run {
            text: text.into(),
            link: Some(url.into()),
            ..Default::default()
        }
    }
}

/// Table cell content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell(pub Vec<Run>);

impl Cell {
    pub fn text(&self) -> String {
        self.0.iter().map(|r| r.text.as_str()).collect()
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell(vec![Run::plain(value)])
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell(vec![Run::plain(value)])
    }
}

impl From<Run> for Cell {
    fn from(value: Run) -> Self {
        Cell(vec![value])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Empty for tables without a header row.
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// Format-independent report content. Both renderers consume the same list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Title(String),
    Heading { level: u8, text: String },
    Paragraph { runs: Vec<Run>, align: Align },
    Table(Table),
    PageBreak,
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    pub fn paragraph(runs: Vec<Run>) -> Self {
        Block::Paragraph {
            runs,
            align: Align::Left,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Block::paragraph(vec![Run::plain(text)])
    }

    pub fn centered(text: impl Into<String>) -> Self {
        Block::Paragraph {
            runs: vec![Run::plain(text)],
            align: Align::Center,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Docx,
    Text,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Docx => write!(f, "Word document"),
            ExportFormat::Text => write!(f, "plain text"),
        }
    }
}

/// Where the report ended up and in which format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub format: ExportFormat,
}

/// Sibling path used for the plain-text fallback.
pub fn text_fallback_path(path: &Path) -> PathBuf {
    path.with_extension("txt")
}

/// Assemble the report and write it to `path` as `.docx`. If that fails the
/// same content is written as plain text next to it. Fails only when both
/// renderings fail.
pub fn export_report(ctx: &ReportContext<'_>, path: &Path) -> Result<ExportOutcome, HazidError> {
    let blocks = assemble(ctx);
    export_blocks(&blocks, path)
}

pub fn export_blocks(blocks: &[Block], path: &Path) -> Result<ExportOutcome, HazidError> {
    let document_error = match docx::write_docx(blocks, path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "report written");
            return Ok(ExportOutcome {
                path: path.to_path_buf(),
                format: ExportFormat::Docx,
            });
        }
        Err(e) => e,
    };
    tracing::warn!(error = %document_error, "document rendering failed, writing plain text instead");

    let text_path = text_fallback_path(path);
    match text::write_text(blocks, &text_path) {
        Ok(()) => {
            tracing::info!(path = %text_path.display(), "plain-text report written");
            Ok(ExportOutcome {
                path: text_path,
                format: ExportFormat::Text,
            })
        }
        Err(text_error) => Err(HazidError::Export {
            document: document_error.to_string(),
            text: text_error.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks() -> Vec<Block> {
        vec![
            Block::Title("Safety Report".into()),
            Block::text("5L ethanol"),
        ]
    }

    #[test]
    fn test_docx_written_when_possible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.docx");
        let outcome = export_blocks(&blocks(), &path).unwrap();
        assert_eq!(outcome.format, ExportFormat::Docx);
        assert_eq!(outcome.path, path);
        assert!(path.is_file());
        assert!(!dir.path().join("report.txt").exists());
    }

    #[test]
    fn test_text_fallback_when_docx_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.docx");
        // A directory in the way makes the document write fail.
        std::fs::create_dir(&path).unwrap();

        let outcome = export_blocks(&blocks(), &path).unwrap();
        assert_eq!(outcome.format, ExportFormat::Text);
        assert_eq!(outcome.path, dir.path().join("report.txt"));
        let text = std::fs::read_to_string(&outcome.path).unwrap();
        assert!(text.contains("5L ethanol"));
    }

    #[test]
    fn test_both_failing_is_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.docx");
        let err = export_blocks(&blocks(), &path).unwrap_err();
        assert!(matches!(err, HazidError::Export { .. }));
    }

    #[test]
    fn test_column_count_uses_widest_row() {
        let table = Table {
            header: vec!["A".into()],
            rows: vec![vec!["1".into(), "2".into(), "3".into()]],
        };
        assert_eq!(table.column_count(), 3);
    }
}
