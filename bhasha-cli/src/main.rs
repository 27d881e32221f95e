//! Bhasha CLI - Command line interface
//!
//! `bhasha run <file>` runs a native-vocabulary program through the full
//! pipeline; `transpile` and `explain` print the intermediate artefacts.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, error};

mod config;
mod logging;
mod platform;

use crate::config::{build_run_config, read_config_file, LogConfig, Overrides};
use crate::logging::LogFormat;
use crate::platform::print_failure_with_source;
use bhasha_api::{init_config, run, ApiError, RunConfig, TranspileMode};

/// 学习者的程序失败时的退出码
const EXIT_PROGRAM_FAILED: u8 = 2;

#[derive(Parser)]
#[command(
    name = "bhasha",
    about = "Run programs written with Hindi keywords",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON configuration file (limits, mode, diagnostics, translator)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize, transpile, explain, execute and localize failures
    Run(RunArgs),
    /// Print the canonical source
    Transpile(SourceArgs),
    /// Print the line-by-line explanation
    Explain(SourceArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// Source file
    file: PathBuf,

    /// Keyword rewriting mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Print the submission response as JSON
    #[arg(long)]
    json: bool,

    /// Wall-clock budget in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// File whose lines are returned by input()
    #[arg(long, value_name = "FILE")]
    stdin_file: Option<PathBuf>,

    /// Translation command (reads stdin, writes stdout)
    #[arg(long, value_name = "CMD")]
    translator_cmd: Option<String>,

    /// Never call the translation command
    #[arg(long)]
    no_translate: bool,

    /// Print the canonical source before the output
    #[arg(long)]
    show_canonical: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Substring,
    Tokenized,
}

impl From<ModeArg> for TranspileMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Substring => TranspileMode::Substring,
            ModeArg::Tokenized => TranspileMode::Tokenized,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::from_verbosity(cli.verbose);
    if let Err(e) = logging::init_with_file(&log_config, cli.log_format, cli.log_file.as_deref()) {
        eprintln!("Error: cannot open log file: {e}");
        return ExitCode::FAILURE;
    }

    match dispatch(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!(target: "bhasha::cli", phase = e.phase(), "{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: &Cli) -> Result<ExitCode, ApiError> {
    let file_config = cli.config.as_deref().map(read_config_file).transpose()?;

    match &cli.command {
        Command::Transpile(args) => {
            let config = build_run_config(file_config, source_overrides(args));
            let source = read_source(&args.file)?;
            println!("{}", bhasha_api::transpile(&source, config.mode));
            Ok(ExitCode::SUCCESS)
        }
        Command::Explain(args) => {
            let source = read_source(&args.file)?;
            println!("{}", bhasha_api::explain(&source));
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(args) => {
            let mut overrides = source_overrides(&args.source);
            overrides.timeout_ms = args.timeout_ms;
            overrides.translator_cmd = args.translator_cmd.clone();
            overrides.no_translate = args.no_translate;
            overrides.show_canonical = args.show_canonical;
            if let Some(path) = &args.stdin_file {
                overrides.stdin = read_source(path)?.lines().map(str::to_string).collect();
            }
            let config = build_run_config(file_config, overrides);
            if !init_config(config.clone()) {
                debug!(target: "bhasha::cli", "global config already initialized");
            }
            let source = read_source(&args.source.file)?;
            handle_run(&source, &config, args.json)
        }
    }
}

fn source_overrides(args: &SourceArgs) -> Overrides {
    Overrides {
        mode: args.mode.map(TranspileMode::from),
        ..Overrides::default()
    }
}

fn read_source(path: &Path) -> Result<String, ApiError> {
    std::fs::read_to_string(path).map_err(|source| ApiError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn handle_run(source: &str, config: &RunConfig, json: bool) -> Result<ExitCode, ApiError> {
    let response = run(source, config);
    let code = if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_PROGRAM_FAILED)
    };

    if json {
        let text = serde_json::to_string_pretty(&response).map_err(|e| ApiError::Encode(e.to_string()))?;
        println!("{text}");
        return Ok(code);
    }

    if config.show_canonical {
        println!("[Canonical]");
        for (i, line) in response.translated_code.lines().enumerate() {
            println!("{:3} | {}", i + 1, line);
        }
        println!("[Output]");
    }

    if response.is_success() {
        print!("{}", response.output);
    } else {
        if let Some(partial) = &response.partial_output {
            print!("{partial}");
        }
        print_failure_with_source(&response, source);
    }
    Ok(code)
}
