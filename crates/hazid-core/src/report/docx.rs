//! Minimal WordprocessingML writer for the report block model.

use std::borrow::Cow;
use std::io::{Cursor, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{Align, Block, Run, Table};
use crate::draft::write_atomically;
use crate::error::HazidError;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

const HEADER_FILL: &str = "D9E2F3";
/// Table width in fiftieths of a percent.
const FULL_WIDTH_PCT: &str = "5000";

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>
<w:pPrDefault><w:pPr><w:spacing w:after="120"/></w:pPr></w:pPrDefault></w:docDefaults>
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:pPr><w:jc w:val="center"/><w:spacing w:after="240"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="1F3864"/><w:sz w:val="28"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="200"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:color w:val="2F5496"/><w:sz w:val="24"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/></w:rPr></w:style>
<w:style w:type="character" w:styleId="Hyperlink"><w:name w:val="Hyperlink"/><w:rPr><w:color w:val="0563C1"/><w:u w:val="single"/></w:rPr></w:style>
<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders><w:tblCellMar><w:left w:w="108" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>
</w:styles>"#;

/// Whether XML 1.0 allows `c` in character data.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Drop characters Word would reject, such as vertical tabs pasted from
/// spreadsheets.
fn xml_safe(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

fn xml_error(e: impl std::fmt::Display) -> HazidError {
    HazidError::Document(e.to_string())
}

/// Thin wrapper over the quick-xml writer that maps errors and keeps the
/// element helpers short.
struct Xml {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl Xml {
    fn new() -> Result<Self, HazidError> {
        let mut xml = Xml {
            writer: Writer::new(Cursor::new(Vec::new())),
        };
        xml.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(xml)
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), HazidError> {
        self.writer.write_event(event).map_err(xml_error)
    }

    fn start<'a>(name: &'a str, attrs: &[(&'a str, &'a str)]) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        for &(key, value) in attrs {
            start.push_attribute((key, xml_safe(value).as_ref()));
        }
        start
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), HazidError> {
        self.event(Event::Start(Self::start(name, attrs)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), HazidError> {
        self.event(Event::Empty(Self::start(name, attrs)))
    }

    fn close(&mut self, name: &str) -> Result<(), HazidError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, text: &str) -> Result<(), HazidError> {
        self.event(Event::Text(BytesText::new(&xml_safe(text))))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }
}

/// External hyperlink targets, numbered after the styles relationship.
#[derive(Default)]
struct Relationships {
    links: Vec<String>,
}

impl Relationships {
    fn link_id(&mut self, url: &str) -> String {
        let index = match self.links.iter().position(|l| l == url) {
            Some(i) => i,
            None => {
                self.links.push(url.to_string());
                self.links.len() - 1
            }
        };
        format!("rId{}", index + 2)
    }
}

fn write_run(xml: &mut Xml, run: &Run, extra_bold: bool) -> Result<(), HazidError> {
    xml.open("w:r", &[])?;
    let bold = run.bold || extra_bold;
    if bold || run.italic || run.link.is_some() {
        xml.open("w:rPr", &[])?;
        if run.link.is_some() {
            xml.empty("w:rStyle", &[("w:val", "Hyperlink")])?;
        }
        if bold {
            xml.empty("w:b", &[])?;
        }
        if run.italic {
            xml.empty("w:i", &[])?;
        }
        xml.close("w:rPr")?;
    }
    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            xml.empty("w:br", &[])?;
        }
        if !line.is_empty() {
            xml.open("w:t", &[("xml:space", "preserve")])?;
            xml.text(line)?;
            xml.close("w:t")?;
        }
    }
    xml.close("w:r")
}

fn write_runs(
    xml: &mut Xml,
    rels: &mut Relationships,
    runs: &[Run],
    extra_bold: bool,
) -> Result<(), HazidError> {
    for run in runs {
        match &run.link {
            Some(url) => {
                let id = rels.link_id(url);
                xml.open("w:hyperlink", &[("r:id", id.as_str())])?;
                write_run(xml, run, extra_bold)?;
                xml.close("w:hyperlink")?;
            }
            None => write_run(xml, run, extra_bold)?,
        }
    }
    Ok(())
}

fn write_paragraph(
    xml: &mut Xml,
    rels: &mut Relationships,
    style: Option<&str>,
    align: Align,
    runs: &[Run],
    extra_bold: bool,
) -> Result<(), HazidError> {
    xml.open("w:p", &[])?;
    if style.is_some() || align == Align::Center {
        xml.open("w:pPr", &[])?;
        if let Some(style) = style {
            xml.empty("w:pStyle", &[("w:val", style)])?;
        }
        if align == Align::Center {
            xml.empty("w:jc", &[("w:val", "center")])?;
        }
        xml.close("w:pPr")?;
    }
    write_runs(xml, rels, runs, extra_bold)?;
    xml.close("w:p")
}

fn write_cell(
    xml: &mut Xml,
    rels: &mut Relationships,
    runs: &[Run],
    header: bool,
) -> Result<(), HazidError> {
    xml.open("w:tc", &[])?;
    if header {
        xml.open("w:tcPr", &[])?;
        xml.empty(
            "w:shd",
            &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", HEADER_FILL)],
        )?;
        xml.close("w:tcPr")?;
    }
    let align = if header { Align::Center } else { Align::Left };
    write_paragraph(xml, rels, None, align, runs, header)?;
    xml.close("w:tc")
}

fn write_table(xml: &mut Xml, rels: &mut Relationships, table: &Table) -> Result<(), HazidError> {
    let columns = table.column_count();
    if columns == 0 {
        return Ok(());
    }
    xml.open("w:tbl", &[])?;
    xml.open("w:tblPr", &[])?;
    xml.empty("w:tblStyle", &[("w:val", "TableGrid")])?;
    xml.empty("w:tblW", &[("w:w", FULL_WIDTH_PCT), ("w:type", "pct")])?;
    xml.close("w:tblPr")?;
    xml.open("w:tblGrid", &[])?;
    for _ in 0..columns {
        xml.empty("w:gridCol", &[])?;
    }
    xml.close("w:tblGrid")?;

    if !table.header.is_empty() {
        xml.open("w:tr", &[])?;
        for i in 0..columns {
            let label = table.header.get(i).map(String::as_str).unwrap_or_default();
            write_cell(xml, rels, &[Run::plain(label)], true)?;
        }
        xml.close("w:tr")?;
    }
    for row in &table.rows {
        xml.open("w:tr", &[])?;
        for i in 0..columns {
            let runs = row.get(i).map(|c| c.0.as_slice()).unwrap_or_default();
            write_cell(xml, rels, runs, false)?;
        }
        xml.close("w:tr")?;
    }
    xml.close("w:tbl")?;
    // Word merges adjacent tables unless a paragraph separates them.
    write_paragraph(xml, rels, None, Align::Left, &[], false)
}

fn document_xml(blocks: &[Block], rels: &mut Relationships) -> Result<Vec<u8>, HazidError> {
    let mut xml = Xml::new()?;
    xml.open("w:document", &[("xmlns:w", NS_MAIN), ("xmlns:r", NS_REL)])?;
    xml.open("w:body", &[])?;

    for block in blocks {
        match block {
            Block::Title(text) => {
                let runs = [Run::plain(text.as_str())];
                write_paragraph(&mut xml, rels, Some("Title"), Align::Center, &runs, false)?;
            }
            Block::Heading { level, text } => {
                let style = format!("Heading{}", (*level).clamp(1, 3));
                let runs = [Run::plain(text.as_str())];
                write_paragraph(&mut xml, rels, Some(style.as_str()), Align::Left, &runs, false)?;
            }
            Block::Paragraph { runs, align } => {
                write_paragraph(&mut xml, rels, None, *align, runs, false)?;
            }
            Block::Table(table) => write_table(&mut xml, rels, table)?,
            Block::PageBreak => {
                xml.open("w:p", &[])?;
                xml.open("w:r", &[])?;
                xml.empty("w:br", &[("w:type", "page")])?;
                xml.close("w:r")?;
                xml.close("w:p")?;
            }
        }
    }

    // 0.5 inch margins on A4.
    xml.open("w:sectPr", &[])?;
    xml.empty("w:pgSz", &[("w:w", "11906"), ("w:h", "16838")])?;
    xml.empty(
        "w:pgMar",
        &[
            ("w:top", "720"),
            ("w:right", "720"),
            ("w:bottom", "720"),
            ("w:left", "720"),
            ("w:header", "708"),
            ("w:footer", "708"),
            ("w:gutter", "0"),
        ],
    )?;
    xml.close("w:sectPr")?;

    xml.close("w:body")?;
    xml.close("w:document")?;
    Ok(xml.into_bytes())
}

fn document_rels_xml(rels: &Relationships) -> Result<Vec<u8>, HazidError> {
    let mut xml = Xml::new()?;
    xml.open("Relationships", &[("xmlns", NS_PKG_REL)])?;
    xml.empty(
        "Relationship",
        &[("Id", "rId1"), ("Type", REL_STYLES), ("Target", "styles.xml")],
    )?;
    for (i, url) in rels.links.iter().enumerate() {
        let id = format!("rId{}", i + 2);
        xml.empty(
            "Relationship",
            &[
                ("Id", id.as_str()),
                ("Type", REL_HYPERLINK),
                ("Target", url.as_str()),
                ("TargetMode", "External"),
            ],
        )?;
    }
    xml.close("Relationships")?;
    Ok(xml.into_bytes())
}

fn package_rels_xml() -> Result<Vec<u8>, HazidError> {
    let mut xml = Xml::new()?;
    xml.open("Relationships", &[("xmlns", NS_PKG_REL)])?;
    xml.empty(
        "Relationship",
        &[
            ("Id", "rId1"),
            ("Type", REL_OFFICE_DOCUMENT),
            ("Target", "word/document.xml"),
        ],
    )?;
    xml.close("Relationships")?;
    Ok(xml.into_bytes())
}

fn content_types_xml() -> Result<Vec<u8>, HazidError> {
    let mut xml = Xml::new()?;
    xml.open("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    xml.empty(
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    )?;
    xml.empty(
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    xml.empty(
        "Override",
        &[
            ("PartName", "/word/document.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
            ),
        ],
    )?;
    xml.empty(
        "Override",
        &[
            ("PartName", "/word/styles.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
            ),
        ],
    )?;
    xml.close("Types")?;
    Ok(xml.into_bytes())
}

/// Render the blocks into an in-memory `.docx` package.
pub fn render_docx(blocks: &[Block]) -> Result<Vec<u8>, HazidError> {
    let mut rels = Relationships::default();
    let document = document_xml(blocks, &mut rels)?;

    let parts: [(&str, Vec<u8>); 5] = [
        ("[Content_Types].xml", content_types_xml()?),
        ("_rels/.rels", package_rels_xml()?),
        ("word/document.xml", document),
        ("word/styles.xml", STYLES_XML.as_bytes().to_vec()),
        ("word/_rels/document.xml.rels", document_rels_xml(&rels)?),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in parts {
        zip.start_file(name, options).map_err(xml_error)?;
        zip.write_all(&bytes)?;
    }
    let cursor = zip.finish().map_err(xml_error)?;
    Ok(cursor.into_inner())
}

/// Render and write atomically to `path`.
pub fn write_docx(blocks: &[Block], path: &Path) -> Result<(), HazidError> {
    let bytes = render_docx(blocks)?;
    write_atomically(path, &bytes)
        .map_err(|e| HazidError::Document(format!("cannot write {}: {e}", path.display())))
}
