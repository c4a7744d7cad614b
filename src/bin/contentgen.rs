//! CLI binary for edgequake-contentgen.
//!
//! A thin shim over the library crate that maps CLI flags to request
//! inputs and a `PipelineConfig`, then prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_contentgen::{
    export_as_document, export_document_to_file, generate_blog_post, generate_social_media_post,
    optimize_for_seo, render_batch_text, render_blog_text, render_social_text,
    suggest_blog_headings, write_page_images, BlogPostInput, ExportOptions,
    GenerationProgressCallback, PageImageFormat, PageSize, PipelineConfig, PipelineWarning,
    PrerenderedBlock, ProgressCallback, RawNumber, SocialPostInput, SocialPostOutput, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner naming the current stage plus one
/// log line per image slot. Image slots of a batch may finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Instant,
    fallbacks: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Validating request…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Instant::now(),
            fallbacks: AtomicUsize::new(0),
        })
    }

    fn elapsed(&self) -> String {
        dim(&format!("{:.1}s", self.started.elapsed().as_secs_f64()))
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        let (prefix, msg) = match stage {
            Stage::Text => ("Writing", "drafting copy…"),
            Stage::Images => ("Illustrating", "synthesising images…"),
            Stage::SeoRewrite => ("Optimising", "weaving in keywords…"),
            Stage::Headings => ("Outlining", "suggesting headings…"),
        };
        self.bar.set_prefix(prefix);
        self.bar.set_message(msg);
    }

    fn on_image_start(&self, index: usize, total: usize) {
        self.bar.set_message(format!("image {index}/{total}"));
    }

    fn on_image_complete(&self, index: usize, total: usize, fallback: bool) {
        if fallback {
            self.fallbacks.fetch_add(1, Ordering::SeqCst);
        }
        self.bar.println(format!(
            "  {} Image {:>2}/{:<2}  {}  {}",
            if fallback { cyan("⚠") } else { green("✓") },
            index,
            total,
            if fallback {
                cyan("fallback")
            } else {
                dim("generated")
            },
            self.elapsed(),
        ));
    }

    fn on_warning(&self, warning: &PipelineWarning) {
        let msg = warning.to_string();
        // Truncate very long provider errors to keep output tidy.
        let msg = if msg.chars().count() > 100 {
            format!("{}\u{2026}", msg.chars().take(99).collect::<String>())
        } else {
            msg
        };
        let line = match warning {
            PipelineWarning::SeoRewriteFailed { .. } => red(&msg),
            _ => dim(&msg),
        };
        self.bar.println(format!("    {line}"));
    }

    fn on_generation_complete(&self, images: usize, warnings: usize) {
        self.bar.finish_and_clear();
        let fallbacks = self.fallbacks.load(Ordering::SeqCst);
        if warnings == 0 {
            eprintln!(
                "{} Generated with {} image(s)  {}",
                green("✔"),
                bold(&images.to_string()),
                self.elapsed()
            );
        } else {
            eprintln!(
                "{} Generated with {} image(s)  ({} fallback, {} warning(s))  {}",
                cyan("⚠"),
                bold(&images.to_string()),
                cyan(&fallbacks.to_string()),
                warnings,
                self.elapsed()
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Blog post with two illustrations
  contentgen blog "Solar Panels" --images 2

  # Fixed title, longer post, SEO keywords woven in
  contentgen blog "Home Composting" --title "Compost 101" --words 1200 \
      --seo-keywords "compost bin, kitchen scraps"

  # Three LinkedIn variations, JSON output
  contentgen --json social "Launching our new invoicing app" \
      --platform linkedin --posts 3

  # Rewrite an existing article for SEO
  contentgen seo article.txt --keywords "heat pump, energy savings"

  # Heading ideas
  contentgen headings "Remote Work"

  # Paginate a rendered screenshot into a PDF, or into page images
  contentgen export post.png -o post.pdf
  contentgen export post.png --format png -o pages/

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY            OpenAI API key (text and images)
  ANTHROPIC_API_KEY         Anthropic API key (text)
  GEMINI_API_KEY            Google Gemini API key (text)
  EDGEQUAKE_PROVIDER        Override text provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL           Override text model ID
  CONTENTGEN_IMAGE_API_KEY  API key for the image endpoint
  CONTENTGEN_IMAGE_ENDPOINT OpenAI-compatible image generation URL
  CONTENTGEN_IMAGE_MODEL    Image model name (default: gpt-image-1)

NOTES:
  A failed image never fails the request: that slot gets a deterministic
  placeholder image and a warning is printed. Validation errors are reported
  before any model call is made.
"#;

/// Generate blog and social media copy with AI images.
#[derive(Parser, Debug)]
#[command(
    name = "contentgen",
    version,
    about = "Generate blog and social media copy with AI images",
    long_about = "Generate marketing copy (blog posts, social media posts) with an LLM, \
illustrate it with generated images, optionally rewrite it for SEO keywords, and export \
rendered content as paginated page images or PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (e.g. gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// API key for the image endpoint (falls back to OPENAI_API_KEY).
    #[arg(long, global = true, env = "CONTENTGEN_IMAGE_API_KEY", hide_env_values = true)]
    image_api_key: Option<String>,

    /// OpenAI-compatible image generation URL.
    #[arg(long, global = true, env = "CONTENTGEN_IMAGE_ENDPOINT")]
    image_endpoint: Option<String>,

    /// Image model name sent to the image endpoint.
    #[arg(long, global = true, env = "CONTENTGEN_IMAGE_MODEL")]
    image_model: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "CONTENTGEN_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Number of images synthesised concurrently per request.
    #[arg(long, global = true, env = "CONTENTGEN_IMAGE_CONCURRENCY", default_value_t = 1)]
    image_concurrency: usize,

    /// Output structured JSON instead of plain text.
    #[arg(long, global = true, env = "CONTENTGEN_JSON")]
    json: bool,

    /// Write output to this file instead of stdout.
    #[arg(short, long, global = true, env = "CONTENTGEN_OUTPUT")]
    output: Option<PathBuf>,

    /// Disable progress display.
    #[arg(long, global = true, env = "CONTENTGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CONTENTGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CONTENTGEN_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a blog post.
    Blog(BlogArgs),
    /// Generate one social media post or a batch of variations.
    Social(SocialArgs),
    /// Rewrite existing content so it integrates SEO keywords.
    Seo(SeoArgs),
    /// Suggest section headings for a blog topic.
    Headings(HeadingsArgs),
    /// Paginate a rendered content image into a PDF or page images.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct BlogArgs {
    /// Primary keyword or topic.
    keyword: String,

    /// Related keywords to mention.
    #[arg(long)]
    related: Option<String>,

    /// Writing tone (e.g. professional, casual, humorous).
    #[arg(long)]
    tone: Option<String>,

    /// Target word count.
    #[arg(long = "words")]
    word_count: Option<String>,

    /// Number of illustrations.
    #[arg(long = "images")]
    image_count: Option<String>,

    /// Use this title verbatim instead of generating one.
    #[arg(long)]
    title: Option<String>,

    /// Comma-separated keywords for the SEO rewrite.
    #[arg(long)]
    seo_keywords: Option<String>,

    /// Extra instructions for the writer.
    #[arg(long)]
    instructions: Option<String>,
}

#[derive(Args, Debug)]
struct SocialArgs {
    /// Post topic.
    topic: String,

    /// Target platform: twitter, facebook, instagram, linkedin, threads.
    #[arg(long, default_value = "twitter")]
    platform: String,

    /// Writing tone.
    #[arg(long)]
    tone: Option<String>,

    /// Number of post variations.
    #[arg(long = "posts")]
    post_count: Option<String>,

    /// Images per post.
    #[arg(long = "images")]
    image_count: Option<String>,

    /// Maximum characters per post.
    #[arg(long)]
    max_length: Option<String>,

    /// Do not ask for hashtags.
    #[arg(long)]
    no_hashtags: bool,

    /// Comma-separated keywords for the SEO rewrite.
    #[arg(long)]
    seo_keywords: Option<String>,

    /// Extra instructions for the writer.
    #[arg(long)]
    instructions: Option<String>,
}

#[derive(Args, Debug)]
struct SeoArgs {
    /// File holding the content to rewrite; `-` or omitted reads stdin.
    input: Option<PathBuf>,

    /// Comma-separated keywords to integrate.
    #[arg(long, short = 'k')]
    keywords: String,
}

#[derive(Args, Debug)]
struct HeadingsArgs {
    /// Blog topic.
    topic: String,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Rendered content block (PNG or JPEG).
    input: PathBuf,

    /// Output kind: a PDF file, or a directory of PNG/JPEG pages.
    #[arg(long, value_enum, default_value = "pdf")]
    format: ExportFormatArg,

    /// Page size.
    #[arg(long, value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// Device-pixel scale the input was rendered at.
    #[arg(long, default_value_t = 2.0)]
    scale: f32,

    /// JPEG quality (1–100).
    #[arg(long, default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ExportFormatArg {
    Pdf,
    Png,
    Jpeg,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A4,
    Letter,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::LETTER,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let g = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; library INFO logs
    // would interleave with it.
    let show_progress = !g.quiet && !g.no_progress && !g.json;
    let filter = if g.verbose {
        "debug"
    } else if g.quiet || show_progress {
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

    match &cli.command {
        Command::Blog(args) => run_blog(args, g, show_progress).await,
        Command::Social(args) => run_social(args, g, show_progress).await,
        Command::Seo(args) => run_seo(args, g).await,
        Command::Headings(args) => run_headings(args, g).await,
        Command::Export(args) => run_export(args, g).await,
    }
}

async fn run_blog(args: &BlogArgs, g: &GlobalArgs, show_progress: bool) -> Result<()> {
    let config = build_config(g, show_progress)?;
    let input = BlogPostInput {
        keyword: Some(args.keyword.clone()),
        related_keywords: args.related.clone(),
        tone: args.tone.clone(),
        word_count: args.word_count.clone().map(RawNumber::Text),
        image_count: args.image_count.clone().map(RawNumber::Text),
        title: args.title.clone(),
        seo_keywords: args.seo_keywords.clone(),
        instructions: args.instructions.clone(),
    };

    let post = generate_blog_post(&input, &config)
        .await
        .context("Blog generation failed")?;

    let text = if g.json {
        serde_json::to_string_pretty(&post).context("Failed to serialise output")?
    } else {
        let mut text = render_blog_text(&post);
        if !post.image_urls.is_empty() {
            text.push_str("\nImages:\n");
            for (i, url) in post.image_urls.iter().enumerate() {
                text.push_str(&format!("  {}. {}\n", i + 1, url));
            }
        }
        text
    };
    emit(&text, g).await?;

    if !g.quiet && !show_progress {
        for warning in &post.warnings {
            eprintln!("{} {warning}", cyan("⚠"));
        }
    }
    Ok(())
}

async fn run_social(args: &SocialArgs, g: &GlobalArgs, show_progress: bool) -> Result<()> {
    let config = build_config(g, show_progress)?;
    let input = SocialPostInput {
        topic: Some(args.topic.clone()),
        platform: Some(args.platform.clone()),
        tone: args.tone.clone(),
        instructions: args.instructions.clone(),
        post_count: args.post_count.clone().map(RawNumber::Text),
        image_count: args.image_count.clone().map(RawNumber::Text),
        max_length: args.max_length.clone().map(RawNumber::Text),
        include_hashtags: Some(!args.no_hashtags),
        seo_keywords: args.seo_keywords.clone(),
    };

    let output = generate_social_media_post(&input, &config)
        .await
        .context("Social post generation failed")?;

    let text = if g.json {
        serde_json::to_string_pretty(&output).context("Failed to serialise output")?
    } else {
        match &output {
            SocialPostOutput::Single(post) => render_social_text(post),
            SocialPostOutput::Batch(batch) => render_batch_text(batch),
        }
    };
    emit(&text, g).await?;

    if !g.quiet && !show_progress {
        for warning in output.posts().iter().flat_map(|p| &p.warnings) {
            eprintln!("{} {warning}", cyan("⚠"));
        }
    }
    Ok(())
}

async fn run_seo(args: &SeoArgs, g: &GlobalArgs) -> Result<()> {
    let content = match args.input.as_deref() {
        Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read content from {:?}", path))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read content from stdin")?;
            buf
        }
    };

    let config = build_config(g, false)?;
    let result = optimize_for_seo(&content, &args.keywords, &config)
        .await
        .context("SEO rewrite failed")?;

    let text = if g.json {
        serde_json::to_string_pretty(&result).context("Failed to serialise output")?
    } else {
        result.optimized_content
    };
    emit(&text, g).await
}

async fn run_headings(args: &HeadingsArgs, g: &GlobalArgs) -> Result<()> {
    let config = build_config(g, false)?;
    let result = suggest_blog_headings(&args.topic, &config)
        .await
        .context("Heading suggestion failed")?;

    let text = if g.json {
        serde_json::to_string_pretty(&result).context("Failed to serialise output")?
    } else {
        result
            .headings
            .iter()
            .map(|h| format!("- {h}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    emit(&text, g).await
}

async fn run_export(args: &ExportArgs, g: &GlobalArgs) -> Result<()> {
    let output = g
        .output
        .clone()
        .context("export needs an output path (-o)")?;
    let block = PrerenderedBlock::from_file(&args.input)
        .with_context(|| format!("Failed to load rendered block {:?}", args.input))?;
    let block = Arc::new(block);

    let mut options = ExportOptions {
        page_size: args.page_size.into(),
        scale: args.scale,
        jpeg_quality: args.jpeg_quality,
        ..Default::default()
    };
    let started = Instant::now();

    match args.format {
        ExportFormatArg::Pdf => {
            let bytes = export_document_to_file(block, options, &output)
                .await
                .context("Export failed")?;
            if !g.quiet {
                eprintln!(
                    "{}  {} bytes  {}ms  →  {}",
                    green("✔"),
                    bytes,
                    started.elapsed().as_millis(),
                    bold(&output.display().to_string()),
                );
            }
        }
        ExportFormatArg::Png | ExportFormatArg::Jpeg => {
            options.format = match args.format {
                ExportFormatArg::Jpeg => PageImageFormat::Jpeg,
                _ => PageImageFormat::Png,
            };
            let pages = export_as_document(block, options)
                .await
                .context("Export failed")?;
            let written = write_page_images(&pages, &output)
                .await
                .context("Failed to write page images")?;
            if !g.quiet {
                eprintln!(
                    "{}  {} page(s)  {}ms  →  {}",
                    green("✔"),
                    written.len(),
                    started.elapsed().as_millis(),
                    bold(&output.display().to_string()),
                );
            }
        }
    }
    Ok(())
}

/// Map global CLI args to `PipelineConfig`.
fn build_config(g: &GlobalArgs, show_progress: bool) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .temperature(g.temperature)
        .image_concurrency(g.image_concurrency);

    if let Some(ref provider) = g.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref model) = g.model {
        builder = builder.model(model);
    }
    if let Some(ref key) = g.image_api_key {
        builder = builder.image_api_key(key);
    }
    if let Some(ref endpoint) = g.image_endpoint {
        builder = builder.image_endpoint(endpoint);
    }
    if let Some(ref name) = g.image_model {
        builder = builder.image_model_name(name);
    }
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Write `text` to `--output` or stdout, with a trailing newline.
async fn emit(text: &str, g: &GlobalArgs) -> Result<()> {
    let mut text = text.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }

    if let Some(ref path) = g.output {
        tokio::fs::write(path, text.as_bytes())
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;
        if !g.quiet {
            eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
    }
    Ok(())
}
