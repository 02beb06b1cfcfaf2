//! CLI binary for ats-resume.
//!
//! A thin shim over the library crate: maps flags to `RenderConfig` and
//! `ModelConfig`, renders the resume once, runs the requested tasks and
//! prints or saves the reports.

use anyhow::{Context, Result};
use ats_resume::{
    AtsError, Evaluator, ModelConfig, ModelResponse, PdfiumRenderer, RasterFormat, RenderConfig,
    ResumeSession, Task, UploadedDocument,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Full analysis, job description inline
  ats-resume resume.pdf --job-description "Business Analyst role requiring SQL and Tableau"

  # Percentage match, job description from a file
  ats-resume resume.pdf --job-file jd.txt --task match

  # All three evaluations, reports saved as text files
  ats-resume resume.pdf --job-file jd.txt --task all --output-dir reports/

  # Job description from stdin
  pbpaste | ats-resume resume.pdf --job-file - --task keywords

  # Check that the resume renders (no API key needed)
  ats-resume --render-only resume.pdf

TASKS:
  analyze    Recruiter-style evaluation: strengths and weaknesses
  match      ATS scan: percentage match, missing keywords, final verdict
  keywords   Keywords shared by the job description and the resume
  all        Run all three with a single render

ENVIRONMENT VARIABLES:
  GOOGLE_API_KEY    Gemini API key (GEMINI_API_KEY is accepted as a fallback)
  GEMINI_MODEL      Override model ID (default: gemini-1.5-flash)
  GEMINI_BASE_URL   Override the REST endpoint
  PDFIUM_LIB_PATH   Path to an existing libpdfium

  Variables may also be set in a .env file in the working directory.
"#;

/// Evaluate a PDF resume against a job description with Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "ats-resume",
    version,
    about = "Evaluate a PDF resume against a job description with Gemini",
    long_about = "Render the first page of a PDF resume and ask a multimodal Gemini model \
for a recruiter-style analysis, an ATS percentage match, or the shared keywords.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Resume PDF file.
    resume: PathBuf,

    /// Job description text. Takes precedence over --job-file.
    #[arg(short, long)]
    job_description: Option<String>,

    /// Read the job description from a file ("-" for stdin).
    #[arg(long, env = "ATS_JOB_FILE")]
    job_file: Option<PathBuf>,

    /// Evaluation to run: analyze, match, keywords, or all.
    #[arg(short, long, env = "ATS_TASK", default_value = "analyze")]
    task: String,

    /// Write one report file per task into this directory.
    #[arg(short, long, env = "ATS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Gemini model ID.
    #[arg(long, env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Rendering DPI (72–400).
    #[arg(long, env = "ATS_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Image encoding sent to the model.
    #[arg(long, env = "ATS_FORMAT", value_enum, default_value = "jpeg")]
    format: FormatArg,

    /// JPEG quality (1–100).
    #[arg(long, env = "ATS_QUALITY", default_value_t = 75,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "ATS_PDF_PASSWORD")]
    password: Option<String>,

    /// Per-call timeout for the model, in seconds.
    #[arg(long, env = "ATS_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Output structured JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Render the resume and print image details, no evaluation.
    #[arg(long)]
    render_only: bool,

    /// Disable the spinner.
    #[arg(long, env = "ATS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ATS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, env = "ATS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    Jpeg,
    Png,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine; credentials may come from the real environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already tells the user what is happening, so library INFO
    // logs are hidden while it is active.
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

    let tasks = parse_tasks(&cli.task)?;
    let render_config = build_render_config(&cli)?;

    // ── Render once ──────────────────────────────────────────────────────
    let document = UploadedDocument::from_path(&cli.resume)
        .with_context(|| format!("Failed to load resume {:?}", cli.resume))?;
    let renderer = PdfiumRenderer::new(render_config.clone());

    if cli.render_only {
        let page = tokio::task::block_in_place(|| {
            ats_resume::pipeline::render::rasterise_first_page(&document, &render_config)
        })
        .context("Failed to render resume")?;
        let part = ats_resume::encode_page(&page.image, render_config.format)
            .context("Failed to encode rendered page")?;

        if cli.json {
            let summary = serde_json::json!({
                "document": document.name(),
                "document_bytes": document.len(),
                "source_pages": page.source_pages,
                "width": page.width,
                "height": page.height,
                "mime_type": part.mime_type(),
                "encoded_bytes": part.encoded_len(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("File:          {}", document.name());
            println!("Pages:         {} (page 1 rendered)", page.source_pages);
            println!("Size:          {}x{} px", page.width, page.height);
            println!("Encoding:      {}", part.mime_type());
            println!("Payload:       {} bytes base64", part.encoded_len());
        }
        return Ok(());
    }

    let job_description = read_job_description(&cli)?;
    if job_description.trim().is_empty() && !cli.quiet {
        eprintln!(
            "{}",
            dim("No job description given; the evaluation will have little to compare against.")
        );
    }

    let evaluator = Evaluator::gemini(build_model_config(&cli)?)
        .context("Failed to initialise Gemini client")?;

    let session = tokio::task::block_in_place(|| {
        ResumeSession::open(&document, &renderer, evaluator)
    })
    .context("Failed to render resume")?;

    if !cli.quiet && !cli.json {
        eprintln!("{} {} loaded", green("✔"), bold(session.document_name()));
    }

    // ── Run tasks ────────────────────────────────────────────────────────
    let mut responses: Vec<ModelResponse> = Vec::new();
    let mut failures: Vec<(Task, AtsError)> = Vec::new();

    for task in tasks {
        let spinner = show_progress.then(|| spinner(task.progress_label()));
        let result = session.run(&job_description, task).await;
        if let Some(bar) = spinner {
            bar.finish_and_clear();
        }

        match result {
            Ok(response) => {
                if !cli.quiet && !cli.json {
                    eprintln!("{} {} complete", green("✔"), task.report_title());
                }
                if let Some(ref dir) = cli.output_dir {
                    let path = write_report(dir, &response).await?;
                    if !cli.quiet && !cli.json {
                        eprintln!("   {}", dim(&format!("saved {}", path.display())));
                    }
                }
                if !cli.json {
                    println!("{}\n", response.report());
                }
                responses.push(response);
            }
            Err(e) => {
                eprintln!("{} {}: {}", red("✘"), task.report_title(), e);
                failures.push((task, e));
            }
        }
    }

    if cli.json {
        let failed: Vec<_> = failures
            .iter()
            .map(|(task, e)| serde_json::json!({ "task": task, "error": e.to_string() }))
            .collect();
        let out = serde_json::json!({
            "document": session.document_name(),
            "responses": responses,
            "failures": failed,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    }

    if !failures.is_empty() {
        anyhow::bail!("{} of {} evaluations failed", failures.len(), failures.len() + responses.len());
    }
    Ok(())
}

fn spinner(label: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(label.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Parse `--task` into the tasks to run, in presentation order.
fn parse_tasks(s: &str) -> Result<Vec<Task>> {
    if s.trim().eq_ignore_ascii_case("all") {
        return Ok(Task::ALL.to_vec());
    }
    let task: Task = s.parse()?;
    Ok(vec![task])
}

fn read_job_description(cli: &Cli) -> Result<String> {
    if let Some(ref text) = cli.job_description {
        return Ok(text.clone());
    }
    match cli.job_file {
        Some(ref path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read job description from stdin")?;
            Ok(buf)
        }
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job description from {:?}", path)),
        None => Ok(String::new()),
    }
}

fn build_render_config(cli: &Cli) -> Result<RenderConfig> {
    let format = match cli.format {
        FormatArg::Jpeg => RasterFormat::Jpeg {
            quality: cli.quality,
        },
        FormatArg::Png => RasterFormat::Png,
    };
    let mut builder = RenderConfig::builder().dpi(cli.dpi).format(format);
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    builder.build().context("Invalid render configuration")
}

/// Start from the environment, then apply CLI overrides.
fn build_model_config(cli: &Cli) -> Result<ModelConfig> {
    let env = ModelConfig::from_env();
    let mut builder = ModelConfig::builder()
        .model(cli.model.clone().unwrap_or(env.model))
        .base_url(env.base_url)
        .api_timeout_secs(cli.api_timeout);
    if let Some(key) = env.api_key {
        builder = builder.api_key(key);
    }
    builder.build().context("Invalid model configuration")
}

/// Write the download report for `response` into `dir`.
async fn write_report(dir: &Path, response: &ModelResponse) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {:?}", dir))?;
    let path = dir.join(response.report_file_name());
    tokio::fs::write(&path, response.report())
        .await
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(path)
}
