//! CLI binary for docview.
//!
//! A thin shim over the library crate that ingests files into a project
//! workspace, prints what happened, and optionally shows resolved content or
//! renders a PDF page.

use anyhow::{Context, Result};
use clap::Parser;
use docview::{
    BatchEntry, BatchReport, Document, DocumentId, DocumentRole, DocumentStatus, IngestConfig,
    IngestProgressCallback, Ingestor, LoadState, PageRenderer, PdfiumRenderer, Project,
    ProgressCallback, ProjectWorkspace, RenderPlan, Rotation, SourceFile,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn status_line(index: usize, total: usize, document: &Document, elapsed_ms: Option<u128>) -> String {
    let mark = match document.status() {
        DocumentStatus::Ready => green("✓"),
        DocumentStatus::Error => red("✗"),
        DocumentStatus::Processing => cyan("…"),
    };
    let timing = elapsed_ms
        .map(|ms| dim(&format!("{:.1}s", ms as f64 / 1000.0)))
        .unwrap_or_default();
    format!(
        "  {} {:>3}/{:<3} {:<32} {:<4} {:<10} {}  {}",
        mark,
        index + 1,
        total,
        document.title(),
        document.format(),
        document.status(),
        dim(&format!("{:>8} bytes", document.size())),
        timing,
    )
}

fn skipped_line(index: usize, total: usize, file_name: &str, reason: &str) -> String {
    let reason = reason.lines().next().unwrap_or(reason);
    format!(
        "  {} {:>3}/{:<3} {:<32} {}",
        red("✗"),
        index + 1,
        total,
        file_name,
        red(reason)
    )
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per file. Files
/// may complete out of order when `--concurrency` is above 1.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    failures: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Ingesting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            failures: AtomicUsize::new(0),
        })
    }

    fn elapsed_ms(&self, index: usize) -> u128 {
        self.start_times
            .lock()
            .unwrap()
            .remove(&index)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl IngestProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Ingesting {total_files} file(s)…"))
        ));
    }

    fn on_file_start(&self, index: usize, _total: usize, file_name: &str) {
        self.start_times
            .lock()
            .unwrap()
            .insert(index, Instant::now());
        self.bar.set_message(file_name.to_string());
    }

    fn on_file_ingested(&self, index: usize, total: usize, document: &Document) {
        let elapsed = self.elapsed_ms(index);
        if document.status() == DocumentStatus::Error {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
        self.bar
            .println(status_line(index, total, document, Some(elapsed)));
        self.bar.inc(1);
    }

    fn on_file_skipped(&self, index: usize, total: usize, file_name: &str, reason: &str) {
        self.elapsed_ms(index);
        self.failures.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(skipped_line(index, total, file_name, reason));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, ingested: usize) {
        self.bar.finish_and_clear();
        let failures = self.failures.load(Ordering::SeqCst);
        if failures == 0 {
            eprintln!(
                "{} {} file(s) ingested successfully",
                green("✔"),
                bold(&ingested.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) ingested  ({} with problems)",
                if ingested == 0 { red("✘") } else { cyan("⚠") },
                bold(&ingested.to_string()),
                total_files,
                red(&failures.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ingest a few files and list their status
  docview thesis.docx notes.txt guide.pdf

  # Show the resolved HTML / text for every ingested document
  docview --show-content thesis.docx notes.txt

  # Render page 3 of a PDF at 150 %, rotated 90°, into ./pages
  docview --page 3 --zoom 1.5 --rotate 90 --render-dir pages guide.pdf

  # Upload reference standards and emit the batch report as JSON
  docview --role standard --json iso-15489.pdf > report.json

SUPPORTED FORMATS:
  .docx   converted to HTML (style map, inline presentation, element ids)
  .txt    shown verbatim (UTF-8)
  .pdf    paged through pdfium; content is not extracted

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium; otherwise the system library
  RUST_LOG                Overrides the log filter (e.g. docview=debug)
"#;

/// Ingest documents into a project and resolve them for display.
#[derive(Parser, Debug)]
#[command(
    name = "docview",
    version,
    about = "Ingest DOCX, PDF and text files and resolve them for display",
    long_about = "Ingest DOCX, PDF and plain-text files into a project workspace. DOCX files are \
converted to HTML with inline presentation and element identifiers, text is shown verbatim, and \
PDFs are paged, zoomed and rotated through pdfium.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to ingest (.docx, .pdf, .txt).
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Project the documents belong to.
    #[arg(long, env = "DOCVIEW_PROJECT", default_value = "new-project-demo")]
    project: String,

    /// Role of the uploaded documents.
    #[arg(long, env = "DOCVIEW_ROLE", value_enum, default_value = "document")]
    role: RoleArg,

    /// Number of files ingested concurrently.
    #[arg(short, long, env = "DOCVIEW_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Text shown for documents whose bytes are unavailable.
    #[arg(long, env = "DOCVIEW_PLACEHOLDER")]
    placeholder: Option<String>,

    /// Leave DOCX images out of the generated HTML.
    #[arg(long, env = "DOCVIEW_NO_IMAGES")]
    no_images: bool,

    /// Output the batch report as JSON.
    #[arg(long, env = "DOCVIEW_JSON")]
    json: bool,

    /// Print the resolved content of every ingested document.
    #[arg(long, env = "DOCVIEW_SHOW_CONTENT")]
    show_content: bool,

    /// PDF page to open (1-based, clamped to the document).
    #[arg(long, env = "DOCVIEW_PAGE", default_value_t = 1)]
    page: usize,

    /// PDF zoom factor (0.5–3.0).
    #[arg(long, env = "DOCVIEW_ZOOM", default_value_t = 1.0)]
    zoom: f32,

    /// PDF rotation in degrees (0, 90, 180, 270).
    #[arg(long, env = "DOCVIEW_ROTATE", default_value_t = 0)]
    rotate: u16,

    /// Write the selected PDF page of every PDF as PNG into this directory.
    #[arg(long, env = "DOCVIEW_RENDER_DIR")]
    render_dir: Option<PathBuf>,

    /// Disable progress bar.
    #[arg(long, env = "DOCVIEW_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCVIEW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCVIEW_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum RoleArg {
    Document,
    Standard,
}

impl From<RoleArg> for DocumentRole {
    fn from(v: RoleArg) -> Self {
        match v {
            RoleArg::Document => DocumentRole::Document,
            RoleArg::Standard => DocumentRole::Standard,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs are suppressed while the progress bar is
    // active; verbose mode always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Read inputs ──────────────────────────────────────────────────────
    let mut files = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        match SourceFile::open(path).await {
            Ok(file) => files.push(file),
            Err(e) if !cli.quiet => eprintln!("{} {}", red("✗"), e),
            Err(_) => {}
        }
    }
    if files.is_empty() {
        anyhow::bail!("None of the {} input file(s) could be read", cli.files.len());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn IngestProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let ingestor = Ingestor::new(config);

    // ── Ingest ───────────────────────────────────────────────────────────
    let mut workspace = ProjectWorkspace::new(Project::new(&cli.project, &cli.project));
    let report = workspace
        .upload_as(&ingestor, files, cli.role.into())
        .await;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        print_report(&report);
    }

    if report.documents().next().is_none() {
        anyhow::bail!("No documents were ingested");
    }

    // ── Open documents ───────────────────────────────────────────────────
    if cli.show_content || cli.render_dir.is_some() {
        let renderer: Arc<dyn PageRenderer> = Arc::new(PdfiumRenderer::from_env());
        let ids: Vec<DocumentId> = workspace
            .documents()
            .iter()
            .map(|d| d.id().clone())
            .collect();
        for id in ids {
            open_document(&cli, &mut workspace, &ingestor, &renderer, &id).await?;
        }
    }

    Ok(())
}

/// Map CLI args to `IngestConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<IngestConfig> {
    let mut builder = IngestConfig::builder()
        .concurrency(cli.concurrency)
        .embed_images(!cli.no_images);

    if let Some(ref text) = cli.placeholder {
        builder = builder.placeholder(text.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_report(report: &BatchReport) {
    let total = report.entries.len();
    for (index, entry) in report.entries.iter().enumerate() {
        match entry {
            BatchEntry::Ingested(doc) => eprintln!("{}", status_line(index, total, doc, None)),
            BatchEntry::Skipped { file_name, reason } => {
                eprintln!("{}", skipped_line(index, total, file_name, reason))
            }
        }
    }
    eprintln!(
        "Ingested {}/{} file(s)",
        report.documents().count(),
        total
    );
}

/// Select `id`, resolve it, and print or render according to the flags.
async fn open_document(
    cli: &Cli,
    workspace: &mut ProjectWorkspace,
    ingestor: &Ingestor,
    renderer: &Arc<dyn PageRenderer>,
    id: &DocumentId,
) -> Result<()> {
    let title = workspace
        .select_document(id)
        .context("Document vanished from workspace")?
        .title()
        .to_string();
    workspace.open_current(ingestor.resolver()).await;

    match workspace.viewer_mut() {
        Some(RenderPlan::RichText(view)) if cli.show_content => {
            println!("{}", bold(&format!("── {title} ──")));
            println!("{}", view.html);
        }
        Some(RenderPlan::PlainText(view)) if cli.show_content => {
            println!("{}", bold(&format!("── {title} ──")));
            println!("{}", view.text);
        }
        Some(RenderPlan::PaginatedBinary(view)) => {
            match view.load(Arc::clone(renderer)).await {
                LoadState::Loaded => {}
                LoadState::Failed(msg) => {
                    eprintln!("{} {}: {}", red("✗"), title, msg);
                    return Ok(());
                }
                LoadState::Unavailable => {
                    eprintln!("{} {}: {}", red("✗"), title, docview::viewer::PDF_UNAVAILABLE);
                    return Ok(());
                }
                LoadState::Pending => return Ok(()),
            }

            let nav = view.navigator_mut();
            nav.go_to_page(cli.page);
            nav.set_scale(cli.zoom);
            while nav.rotation() != Rotation::from_degrees(cli.rotate) {
                nav.rotate();
            }

            if cli.show_content {
                println!("{}", bold(&format!("── {title} ──")));
                println!(
                    "page {}/{}  zoom {}%  rotation {}°",
                    nav.page_number(),
                    nav.total_pages(),
                    nav.zoom_percent(),
                    nav.rotation().degrees()
                );
            }

            if let Some(ref dir) = cli.render_dir {
                match view.render_current(Arc::clone(renderer)).await {
                    Ok(page) => {
                        let out = page_path(dir, &title, page.page_number);
                        let bytes = page.image.decode().context("Rendered page is not valid base64")?;
                        tokio::fs::create_dir_all(dir)
                            .await
                            .with_context(|| format!("Failed to create {}", dir.display()))?;
                        tokio::fs::write(&out, bytes)
                            .await
                            .with_context(|| format!("Failed to write {}", out.display()))?;
                        if !cli.quiet {
                            eprintln!(
                                "{} {}  {}",
                                green("✔"),
                                bold(&out.display().to_string()),
                                dim(&format!("{}x{} px", page.width, page.height))
                            );
                        }
                    }
                    Err(e) => eprintln!("{} {}: {}", red("✗"), title, e),
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// `<dir>/<stem>-p<page>.png`
fn page_path(dir: &Path, title: &str, page_number: usize) -> PathBuf {
    let stem = Path::new(title)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    dir.join(format!("{stem}-p{page_number}.png"))
}
