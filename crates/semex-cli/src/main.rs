//! Semex CLI - extract RDF statements embedded in documents
//!
//! Usage:
//!   semex extract [options] <file>...
//!   semex archive [--warc] <file>
//!   semex extractors
//!   semex accept-header
//!   semex formats

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use semex_cli::{batch, output, OutputOptions};
use semex_core::{AppConfig, LoggingConfig, OutputFormat};
use semex_extractor::{BatchOutcome, Semex};
use semex_formats::default_registry;
use semex_writer::writer_formats;

#[derive(Parser)]
#[command(name = "semex")]
#[command(about = "Structured data extraction to RDF")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive, overrides the configuration
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract statements from documents
    Extract {
        #[command(flatten)]
        args: ExtractionArgs,

        /// Inputs extracted concurrently (defaults to the CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Files to extract, `-` for standard input
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Extract every document inside a ZIP archive or WARC file
    Archive {
        #[command(flatten)]
        args: ExtractionArgs,

        /// Treat the input as a WARC file (optionally gzip-compressed)
        #[arg(long)]
        warc: bool,

        input: String,
    },
    /// List registered extractors with their MIME types
    Extractors,
    /// Print the HTTP Accept header covering every extractor
    AcceptHeader,
    /// List output formats
    Formats,
}

#[derive(Args)]
struct ExtractionArgs {
    /// Output format: nquads, ntriples or json
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Write to this file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only run these extractors (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    extractors: Vec<String>,

    /// Print triple counts instead of statements
    #[arg(long)]
    count: bool,

    /// Print a per-input report to standard error
    #[arg(long)]
    report: bool,

    #[arg(long)]
    stop_at_first_error: bool,

    /// Select extractors by declared type and file name only
    #[arg(long)]
    no_detect: bool,

    /// Add extraction date and size statements
    #[arg(long)]
    metadata: bool,

    /// Character encoding of markup documents
    #[arg(long)]
    encoding: Option<String>,

    /// Document IRI to use instead of the input's URI
    #[arg(long)]
    document_iri: Option<String>,

    /// Disable the empty-title and accidental-RDFa filters
    #[arg(long)]
    no_filters: bool,
}

impl ExtractionArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if self.count {
            config.output.count_only = true;
        }
        if self.stop_at_first_error {
            config.extraction.stop_at_first_error = true;
        }
        if self.no_detect {
            config.extraction.mime_detection = false;
        }
        if self.metadata {
            config.extraction.metadata_timesize = true;
        }
        if let Some(encoding) = &self.encoding {
            config.extraction.default_encoding = Some(encoding.clone());
        }
        if let Some(iri) = &self.document_iri {
            config.extraction.document_context_iri = Some(iri.clone());
        }
    }

    fn output_options(&self, config: &AppConfig) -> OutputOptions {
        OutputOptions {
            format: config.output.format,
            count_only: config.output.count_only,
            filters: config.filters.clone(),
            apply_filters: !self.no_filters,
        }
    }

    fn semex(&self, config: &AppConfig) -> anyhow::Result<Semex> {
        let semex = Semex::new(default_registry()).with_parameters(config.extraction.clone());
        if self.extractors.is_empty() {
            Ok(semex)
        } else {
            Ok(semex.with_extractors(&self.extractors)?)
        }
    }

    fn open_output(&self) -> anyhow::Result<Box<dyn Write + Send>> {
        match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Cannot create {}", path.display()))?;
                Ok(Box::new(BufWriter::new(file)))
            }
            None => Ok(Box::new(io::stdout())),
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path.clone())?,
        None => AppConfig::default(),
    };
    let mut config = config.with_env_override()?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.log_json {
        config.logging.json_format = true;
    }
    Ok(config)
}

/// Logs go to standard error; standard output carries the statements
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);
    if logging.json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Extract { args, jobs, inputs } => {
            args.apply(&mut config);
            let options = args.output_options(&config);
            let semex = Arc::new(args.semex(&config)?);
            let jobs = jobs.unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            });
            tracing::info!("Extracting {} inputs with {} jobs", inputs.len(), jobs);

            let total = inputs.len();
            let runs = batch::extract_all(semex, inputs, options.clone(), jobs).await?;
            let mut out = args.open_output()?;
            let mut failed = 0usize;
            for (input, run) in runs {
                match run {
                    Ok(run) => {
                        if options.count_only {
                            writeln!(out, "{}\t{}", input, run.summary.triples)?;
                        } else {
                            out.write_all(&run.output)?;
                        }
                        if args.report {
                            eprintln!("{}: {}", input, run.summary.report_line());
                            for issue in &run.summary.issues {
                                eprintln!("  {issue}");
                            }
                        }
                    }
                    Err(e) => {
                        failed += 1;
                        tracing::error!("{}: {:#}", input, e);
                        eprintln!("{input}: {e:#}");
                    }
                }
            }
            out.flush()?;
            if failed > 0 {
                anyhow::bail!("{failed} of {total} inputs failed");
            }
        }

        Commands::Archive { args, warc, input } => {
            args.apply(&mut config);
            let options = args.output_options(&config);
            let semex = args.semex(&config)?;
            let source = batch::open_source(&input)?;
            let out = args.open_output()?;

            let (report, summary) = output::run_with_output(&options, out, |handler| {
                if warc {
                    semex.extract_warc(source.as_ref(), handler)
                } else {
                    semex.extract_zip(source.as_ref(), handler)
                }
            })?;

            if options.count_only {
                println!("{}\t{}", input, summary.triples);
            }
            eprintln!(
                "{}: {} documents extracted, {} failed",
                input,
                report.succeeded(),
                report.failed()
            );
            for item in &report.items {
                if let BatchOutcome::Failed(reason) = &item.outcome {
                    eprintln!("  {}: {}", item.uri, reason);
                }
            }
            if args.report {
                eprintln!("{}", summary.report_line());
            }
        }

        Commands::Extractors => {
            let registry = default_registry();
            for factory in registry.group().iter() {
                let description = factory.description();
                let types = description
                    .supported_types()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{}\t{}\t{}", description.name(), description.kind(), types);
            }
        }

        Commands::AcceptHeader => {
            println!("{}", default_registry().accept_header().unwrap_or_default());
        }

        Commands::Formats => {
            for format in writer_formats() {
                let kind = if format.supports_quads { "quads" } else { "triples" };
                println!("{}\t{}\t{}", format.identifier, format.mime_type, kind);
            }
        }
    }

    Ok(())
}
