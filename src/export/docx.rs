//! DOCX export: text-only, packaged as a minimal OOXML container

use std::io::{Cursor, Write};

use log::info;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::document::Document;
use crate::export::{today, ExportArtifact, ExportError, ExportFormat, ExportJob};

/// What this export drops. Only the text survives, one paragraph per line
/// of block text; headings, lists, tables, inline formatting, links, images,
/// comments, page breaks, header, footer and watermark are all discarded.
pub const LIMITATIONS: &str = "DOCX export keeps plain text only: formatting, \
    headings, lists, tables, images, comments, page breaks, header, footer and \
    watermark are not preserved.";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

pub fn export(document: &Document, job: &ExportJob) -> Result<ExportArtifact, ExportError> {
    let bytes = write_docx(document)?;
    let filename = job.resolved_filename(today());
    info!("DOCX export finished: {filename}, {} bytes", bytes.len());
    Ok(ExportArtifact {
        filename,
        mime: ExportFormat::Docx.mime_type(),
        bytes,
        page_count: 0,
        skipped_pages: Vec::new(),
    })
}

/// Package the document's text as a .docx archive
pub fn write_docx(document: &Document) -> Result<Vec<u8>, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(RELATIONSHIPS.as_bytes())?;
    zip.start_file("word/document.xml", options)?;
    zip.write_all(&document_xml(document)?)?;

    Ok(zip.finish()?.into_inner())
}

/// WordprocessingML body with one paragraph per line of text
pub fn document_xml(document: &Document) -> Result<Vec<u8>, ExportError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(
        BytesStart::new("w:document").with_attributes([("xmlns:w", WORDML_NS)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;

    let mut paragraphs = 0;
    for block in document.blocks().iter().filter(|b| !b.is_page_break()) {
        for line in block.text().lines() {
            let line = xml_chars(line.trim_end());
            if line.is_empty() {
                continue;
            }
            writer.write_event(Event::Start(BytesStart::new("w:p")))?;
            writer.write_event(Event::Start(BytesStart::new("w:r")))?;
            writer.write_event(Event::Start(
                BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
            ))?;
            writer.write_event(Event::Text(BytesText::new(&line)))?;
            writer.write_event(Event::End(BytesEnd::new("w:t")))?;
            writer.write_event(Event::End(BytesEnd::new("w:r")))?;
            writer.write_event(Event::End(BytesEnd::new("w:p")))?;
            paragraphs += 1;
        }
    }
    if paragraphs == 0 {
        writer.write_event(Event::Empty(BytesStart::new("w:p")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:body")))?;
    writer.write_event(Event::End(BytesEnd::new("w:document")))?;
    Ok(writer.into_inner())
}

/// Drop characters XML 1.0 does not allow
fn xml_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}
