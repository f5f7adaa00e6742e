use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::thread;
use text_replacer::config::{load_from_path, RunConfig, BUILTIN_PRESETS};
use text_replacer::pipeline::{self, BinaryJob, TextJob};
use text_replacer::progress::{ChannelReporter, Event, Reporter};
use text_replacer::EngineError;

#[derive(Parser)]
#[command(name = "text-replacer")]
#[command(about = "Dictionary-driven text replacement and binary patching", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a text file through a dictionary
    Replace {
        /// Text file to translate
        #[arg(short, long)]
        input: PathBuf,

        /// Dictionary (.csv or .txt); looked up next to the input if not specified
        #[arg(short, long)]
        dict: Option<PathBuf>,

        /// Encoding of the input text (detected if not specified)
        #[arg(short, long)]
        encoding: Option<String>,

        /// Wrap output lines at this many characters
        #[arg(short, long, value_name = "LIMIT")]
        wrap: Option<usize>,

        /// Line-break marker appended to wrapped lines (repeatable; implies wrapping)
        #[arg(short, long = "marker", value_name = "TOKEN", conflicts_with = "preset")]
        markers: Vec<String>,

        /// Named marker preset (see `presets`; implies wrapping)
        #[arg(short, long)]
        preset: Option<String>,

        /// Bytes of text matched per step
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<usize>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Apply a patch table to a binary file
    Patch {
        /// File to patch
        #[arg(short, long)]
        input: PathBuf,

        /// Patch table (.csv); looked up next to the input if not specified
        #[arg(short, long)]
        data: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Validate a dictionary or patch table without touching any target
    Check {
        /// Dictionary to load
        #[arg(long, conflicts_with = "patches", required_unless_present = "patches")]
        dict: Option<PathBuf>,

        /// Patch table to validate
        #[arg(long)]
        patches: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List marker presets
    Presets {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Run configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for Duplicate.csv / Overlap.csv (defaults to the data source's directory)
    #[arg(long)]
    report_dir: Option<PathBuf>,
}

impl CommonArgs {
    fn load(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => load_from_path(path)?,
            None => RunConfig::default(),
        };
        if let Some(dir) = &self.report_dir {
            config.reports.dir = Some(dir.clone());
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replace {
            input,
            dict,
            encoding,
            wrap,
            markers,
            preset,
            chunk_size,
            common,
        } => {
            let mut config = common.load()?;
            let markers_given = !markers.is_empty() || preset.is_some();
            if encoding.is_some() {
                config.text.encoding = encoding;
            }
            if chunk_size.is_some() {
                config.text.chunk_size = chunk_size;
            }
            if let Some(limit) = wrap {
                config.wrap.enabled = true;
                config.wrap.limit = Some(limit);
            }
            if !markers.is_empty() {
                config.wrap.markers = markers;
                config.wrap.preset = None;
            }
            if preset.is_some() {
                config.wrap.preset = preset;
                config.wrap.markers.clear();
            }
            if markers_given {
                // limit comes from --wrap, the config, or the default
                config.wrap.enabled = true;
            }
            config.validate()?;
            cmd_replace(input, dict, config)
        }

        Commands::Patch {
            input,
            data,
            common,
        } => cmd_patch(input, data, common.load()?),

        Commands::Check {
            dict,
            patches,
            common,
        } => cmd_check(dict, patches, common.load()?),

        Commands::Presets { common } => cmd_presets(&common.load()?),
    }
}

fn cmd_replace(input: PathBuf, dict: Option<PathBuf>, config: RunConfig) -> Result<()> {
    let job = TextJob::new(input).dictionary(dict).config(config);
    match run_in_worker(move |reporter| job.run(reporter))? {
        Ok(output) => {
            println!("{} Wrote {}", "✓".green(), output.display());
            Ok(())
        }
        Err(e) => exit_failed(&e),
    }
}

fn cmd_patch(input: PathBuf, data: Option<PathBuf>, config: RunConfig) -> Result<()> {
    let job = BinaryJob::new(input).data(data).config(config);
    match run_in_worker(move |reporter| job.run(reporter))? {
        Ok(outcome) => {
            println!("{} Wrote {}", "✓".green(), outcome.output.display());
            println!();
            println!("{}", "Summary:".bold());
            println!("  {} applied", format!("{}", outcome.applied).green());
            println!("  {} conflicts", format!("{}", outcome.conflicts).yellow());
            println!("  {} skipped", format!("{}", outcome.skipped).cyan());
            Ok(())
        }
        Err(e) => exit_failed(&e),
    }
}

fn cmd_check(dict: Option<PathBuf>, patches: Option<PathBuf>, config: RunConfig) -> Result<()> {
    if let Some(path) = dict {
        let map = run_in_worker(move |reporter| {
            pipeline::check_dictionary(&path, &config, reporter)
        })?;
        return match map {
            Ok(map) => {
                println!("{} {} dictionary entries, no duplicates", "✓".green(), map.len());
                Ok(())
            }
            Err(e) if e.is_duplicate() => exit_failed(&e),
            Err(e) => Err(e.into()),
        };
    }

    let path = patches.ok_or_else(|| anyhow!("either --dict or --patches is required"))?;
    let validation = run_in_worker(move |reporter| {
        pipeline::check_patches(&path, &config, reporter)
    })?;
    match validation {
        Ok(validation) => {
            let conflicts = validation.report.conflicts().len();
            println!("{}", "Summary:".bold());
            println!("  {} accepted", format!("{}", validation.operations.len()).green());
            println!("  {} conflicts", format!("{}", conflicts).yellow());
            println!("  {} skipped", format!("{}", validation.skipped.len()).cyan());
            if conflicts > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_presets(config: &RunConfig) -> Result<()> {
    for (name, markers) in BUILTIN_PRESETS {
        if config.presets.contains_key(*name) {
            continue;
        }
        println!("{} {}", name.bold(), markers.join(" "));
    }
    for (name, markers) in &config.presets {
        println!("{} {} {}", name.bold(), markers.join(" "), "(config)".dimmed());
    }
    Ok(())
}

/// Run `job` on a worker thread and render its events on this one until the
/// worker drops its reporter.
fn run_in_worker<T, F>(job: F) -> Result<Result<T, EngineError>>
where
    T: Send + 'static,
    F: FnOnce(&dyn Reporter) -> Result<T, EngineError> + Send + 'static,
{
    let (reporter, events) = ChannelReporter::new();
    let worker = thread::spawn(move || job(&reporter));

    let mut renderer = EventRenderer::default();
    for event in events {
        renderer.render(event);
    }
    renderer.end_progress();

    worker.join().map_err(|_| anyhow!("worker thread panicked"))
}

#[derive(Default)]
struct EventRenderer {
    last_percent: Option<u32>,
}

impl EventRenderer {
    fn render(&mut self, event: Event) {
        match event {
            Event::Progress(percent) => {
                let percent = percent.clamp(0.0, 100.0) as u32;
                if self.last_percent != Some(percent) {
                    eprint!("\r  {:>3}%", percent);
                    self.last_percent = Some(percent);
                }
            }
            Event::Status(text) => {
                self.end_progress();
                if text.starts_with("error") {
                    eprintln!("{} {}", "✗".red(), text.red());
                } else {
                    eprintln!("{} {}", "→".cyan(), text);
                }
            }
            Event::Notify { title, message } => {
                self.end_progress();
                eprintln!("{}", title.yellow().bold());
                for line in message.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    fn end_progress(&mut self) {
        if self.last_percent.take().is_some() {
            eprintln!();
        }
    }
}

fn exit_failed(error: &EngineError) -> ! {
    if let EngineError::DuplicateDetected { report, .. } = error {
        eprintln!("  Fix the dictionary using {} and run again.", display(report));
    }
    std::process::exit(1)
}

fn display(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
