//! HTML export: the snapshot verbatim inside a standalone document

use log::info;
use quick_xml::escape::partial_escape;

use crate::document::Document;
use crate::export::{today, ExportArtifact, ExportError, ExportFormat, ExportJob};

const STYLE: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; }
table { border-collapse: collapse; width: 100%; margin: 1em 0; }
th, td { border: 1px solid #ccc; padding: 0.5em; text-align: left; }
th { background-color: #f0f0f0; }
.comment-highlight { background-color: #fef3c7; border-bottom: 2px solid #f59e0b; }
.page-break { height: 0; border-top: 1px dashed #ccc; margin: 2em 0; }
@media print { .page-break { border: none; margin: 0; page-break-after: always; break-after: page; } }
";

pub fn export(document: &Document, job: &ExportJob) -> Result<ExportArtifact, ExportError> {
    let filename = job.resolved_filename(today());
    let title = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&filename);
    let bytes = render(document, title).into_bytes();
    info!("HTML export finished: {filename}, {} bytes", bytes.len());
    Ok(ExportArtifact {
        mime: ExportFormat::Html.mime_type(),
        filename,
        bytes,
        page_count: 0,
        skipped_pages: Vec::new(),
    })
}

/// Standalone HTML document embedding the snapshot unchanged
pub fn render(document: &Document, title: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"UTF-8\">
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
<title>{}</title>
<style>
{STYLE}</style>
</head>
<body>
{}
</body>
</html>
",
        partial_escape(title),
        document.html()
    )
}
