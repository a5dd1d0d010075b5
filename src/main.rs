//! legalpad CLI: paginate and export HTML documents from the command line.
//! The editor itself talks to the library through the WASM bindings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use legalpad::templates;
use legalpad::{
    DraftRasterizer, EditorSettings, ExportFormat, FailurePolicy, Margins, MetricsMeasurer,
    PaperSize, Session,
};

#[derive(Parser)]
#[command(name = "legalpad")]
#[command(version)]
#[command(about = "Paginate legal documents and export them to PDF, DOCX or HTML", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export an HTML document
    Export {
        /// Input HTML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: Format,

        /// Output file (derived from the format and today's date if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        page: PageArgs,

        /// Abort when a page fails to render instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Show how the document is split into pages
    Pages {
        /// Input HTML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        page: PageArgs,
    },

    /// List built-in templates, or print one
    Templates {
        /// Template id to print
        #[arg(value_name = "ID")]
        id: Option<String>,
    },
}

#[derive(clap::Args)]
struct PageArgs {
    /// Paper size
    #[arg(long, value_enum, default_value = "a4")]
    paper: Paper,

    /// Margins in millimetres: top,bottom,left,right
    #[arg(long, value_name = "MM", value_parser = parse_margins)]
    margins: Option<Margins>,

    /// Diagonal watermark text
    #[arg(long)]
    watermark: Option<String>,

    /// Print a header and numbered footer on every page
    #[arg(long)]
    header_footer: bool,
}

impl PageArgs {
    fn settings(&self) -> EditorSettings {
        EditorSettings {
            paper: self.paper.into(),
            margins: self.margins.unwrap_or_default(),
            watermark_text: self.watermark.clone().unwrap_or_default(),
            show_header_footer: self.header_footer,
            ..Default::default()
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    Pdf,
    Docx,
    Html,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Pdf => ExportFormat::Pdf,
            Format::Docx => ExportFormat::Docx,
            Format::Html => ExportFormat::Html,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Paper {
    A4,
    Letter,
    Legal,
}

impl From<Paper> for PaperSize {
    fn from(paper: Paper) -> Self {
        match paper {
            Paper::A4 => PaperSize::A4,
            Paper::Letter => PaperSize::Letter,
            Paper::Legal => PaperSize::Legal,
        }
    }
}

fn parse_margins(value: &str) -> Result<Margins, String> {
    let sides = value
        .split(',')
        .map(|side| side.trim().parse::<f32>().map_err(|e| format!("`{side}`: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match sides[..] {
        [all] => Ok(Margins::uniform(all)),
        [top, bottom, left, right] => Ok(Margins {
            top,
            bottom,
            left,
            right,
        }),
        _ => Err("expected one value or four values: top,bottom,left,right".to_string()),
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Export {
            input,
            format,
            output,
            page,
            strict,
        } => cmd_export(&input, format, output.as_deref(), &page, strict),
        Commands::Pages { input, page } => cmd_pages(&input, &page),
        Commands::Templates { id } => cmd_templates(id.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn open_session(input: &Path, page: &PageArgs) -> Result<Session, Box<dyn std::error::Error>> {
    let html = fs::read_to_string(input)?;
    let mut session = Session::new(page.settings(), Box::new(MetricsMeasurer::new()))?;
    session.apply_snapshot(&html, Duration::ZERO);
    Ok(session)
}

fn cmd_export(
    input: &Path,
    format: Format,
    output: Option<&Path>,
    page: &PageArgs,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session(input, page)?;

    let mut job = session.export_job(format.into());
    if let Some(name) = output.and_then(Path::file_name) {
        job.filename = Some(name.to_string_lossy().into_owned());
    }
    if strict {
        job.failure_policy = FailurePolicy::AbortJob;
    }

    let artifact = session.export(job, &mut DraftRasterizer::new())?;
    let path = match output {
        Some(path) if path.extension().is_some() => path.to_path_buf(),
        Some(path) => path.with_file_name(&artifact.filename),
        None => PathBuf::from(&artifact.filename),
    };
    fs::write(&path, &artifact.bytes)?;

    for skipped in &artifact.skipped_pages {
        eprintln!("warning: page {} was left out: {}", skipped.index + 1, skipped.reason);
    }
    if format == Format::Docx {
        eprintln!("note: {}", legalpad::export::docx::LIMITATIONS);
    }
    println!("{} ({} bytes)", path.display(), artifact.bytes.len());
    Ok(())
}

fn cmd_pages(input: &Path, page: &PageArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session(input, page)?;
    println!(
        "{} pages, {} characters",
        session.page_count(),
        session.char_count()
    );
    for page in session.pages() {
        let first = page
            .blocks
            .first()
            .map(|b| b.text())
            .unwrap_or_default();
        let first: String = first.lines().next().unwrap_or_default().chars().take(48).collect();
        println!("  page {:>3}: {:>3} blocks  {first}", page.number(), page.blocks.len());
    }
    Ok(())
}

fn cmd_templates(id: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    match id {
        Some(id) => {
            let template =
                templates::find(id).ok_or_else(|| legalpad::Error::TemplateNotFound(id.to_string()))?;
            println!("{}", template.html);
        }
        None => {
            for template in templates::all() {
                println!(
                    "{:<10} {:<18} [{}] {}",
                    template.id, template.name, template.category, template.description
                );
            }
        }
    }
    Ok(())
}
