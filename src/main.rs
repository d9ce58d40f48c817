// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::{Read, Write};
use std::path::PathBuf;

use adaptrans::app_config::{self, BackendKind, Config};
use adaptrans::translation::quality::Grade;
use adaptrans::{AdaptivePipeline, SourceDocument, TranslateOptions};

/// CLI Wrapper for BackendKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliBackend {
    Ollama,
    Seq2seq,
    Mock,
}

impl From<CliBackend> for BackendKind {
    fn from(cli_backend: CliBackend) -> Self {
        match cli_backend {
            CliBackend::Ollama => BackendKind::Ollama,
            CliBackend::Seq2seq => BackendKind::Seq2seq,
            CliBackend::Mock => BackendKind::Mock,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a text file through the adaptive pipeline
    Translate(TranslateArgs),

    /// Generate shell completions for adaptrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Text file to translate ('-' reads stdin)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Write the translation here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Backend to use
    #[arg(short, long, value_enum)]
    backend: Option<CliBackend>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Pin the chunk size (chars) instead of searching for one
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Lowest acceptable grade per chunk (A-F)
    #[arg(long, default_value = "D")]
    min_quality: Grade,

    /// Give up after this many milliseconds
    #[arg(long)]
    max_latency_ms: Option<u64>,

    /// Ignore cached results
    #[arg(long)]
    no_cache: bool,
}

/// adaptrans - adaptive chunked translation
///
/// Translates long text through language models with bounded context
/// windows, choosing chunk sizes by measured translation quality.
#[derive(Parser, Debug)]
#[command(name = "adaptrans")]
#[command(version)]
#[command(about = "Adaptive chunked translation over language model backends")]
#[command(long_about = "adaptrans cuts long text into model-sized chunks at semantic boundaries, \
translates them concurrently, scores every chunk and retries the weak ones.

EXAMPLES:
    adaptrans translate notes.txt                      # Translate using default config
    adaptrans translate -s en -t de notes.txt          # Translate from English to German
    adaptrans translate -b seq2seq -o out.txt in.txt   # Use a seq2seq server
    adaptrans translate --chunk-size 800 in.txt        # Skip the chunk-size search
    adaptrans completions bash > adaptrans.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// Writes coloured, timestamped log lines to stderr
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Start at trace so the config can lower the level later
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "adaptrans", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => {
            if let Err(e) = run_translate(args).await {
                error!("{:#}", e);
                return Err(e);
            }
            Ok(())
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(level) = &options.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)
        .with_context(|| format!("Failed to load configuration from {}", options.config_path))?;

    // Command line values override the file
    if let Some(backend) = options.backend.clone() {
        config.backend.kind = backend.into();
    }
    if let Some(model) = &options.model {
        config.backend.model = model.clone();
    }
    if let Some(source) = &options.source_language {
        config.source_language = source.clone();
    }
    if let Some(target) = &options.target_language {
        config.target_language = target.clone();
    }

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let text = read_input(&options.input)?;
    if text.trim().is_empty() {
        warn!("Input is empty, nothing to translate");
    }

    let backend = config.backend.build()?;
    let pipeline = AdaptivePipeline::new(backend, config.pipeline.clone()).with_glossary(config.glossary.clone());
    let document = SourceDocument::new(text, &config.source_language, &config.target_language);

    let mut translate_options = TranslateOptions::default().with_min_quality(options.min_quality);
    if let Some(size) = options.chunk_size {
        translate_options = translate_options.with_chunk_size(size);
    }
    if let Some(ms) = options.max_latency_ms {
        translate_options = translate_options.with_max_latency_ms(ms);
    }
    if options.no_cache {
        translate_options = translate_options.skipping_cache();
    }

    info!(
        "Translating {} chars from {} to {}",
        document.char_len(),
        config.source_language,
        config.target_language
    );

    let result = pipeline
        .translate_adaptive_until(
            &document,
            translate_options,
            until_interrupted(tokio::signal::ctrl_c()),
        )
        .await
        .context("Translation failed")?;

    if result.degraded {
        warn!("Chunks {:?} stayed below grade {}", result.degraded_chunks(), options.min_quality);
    }
    info!("{}", result.summary());

    match &options.output {
        Some(path) => std::fs::write(path, &result.text)
            .with_context(|| format!("Failed to write translation to {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(result.text.as_bytes())
                .context("Failed to write translation to stdout")?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Resolves once `signal` fires. A signal that cannot be listened for never fires.
async fn until_interrupted<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("Could not listen for Ctrl-C, running without it: {}", e);
        std::future::pending::<()>().await;
    }
}

fn read_input(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }

    if !path.is_file() {
        return Err(anyhow!("Input file does not exist: {}", path.display()));
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read input file: {}", path.display()))
}
