//! CLI module - Command-line interface definition and handler

use anyhow::Result;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::core::rules::DEFAULT_IGNORE_FILE;
use crate::core::tokenizer::TokenModel;
use crate::flows::flatten::{
    flatten, FlattenOptions, NoProgress, ProgressSink, TerminalProgress, DEFAULT_OUTPUT,
};
use crate::flows::stats::render_summary;

/// flattener - flatten a project's source files into a single XML document.
#[derive(Parser, Debug)]
#[command(name = "flattener")]
#[command(
    author,
    version,
    about,
    long_about = r#"flattener walks a project directory, skips ignored and binary files, and
writes every remaining text file into one XML document:

    <files>
      <file path="src/main.rs"><![CDATA[ ...content... ]]></file>
    </files>

Ignore rules come from the ignore file at the root (default: .gitignore).
`!pattern` lines re-include files, and always win over exclusions.

Examples:
    flattener
    flattener -o context.xml
    flattener --root ../project --token-model cl100k
"#
)]
pub struct Cli {
    /// Output file path.
    #[arg(
        short,
        long,
        default_value = DEFAULT_OUTPUT,
        env = "FLATTENER_OUTPUT",
        value_name = "PATH",
        long_help = "Path of the XML document to write.\n\n\
Relative paths resolve against the current directory. The output file is never\n\
included in its own document."
    )]
    pub output: PathBuf,

    /// Root directory to flatten.
    #[arg(
        long,
        default_value = ".",
        env = "FLATTENER_ROOT",
        value_name = "ROOT",
        long_help = "Root directory to flatten (defaults to the current directory).\n\n\
All paths in the document are relative to this root."
    )]
    pub root: PathBuf,

    /// Ignore file looked up at the root.
    #[arg(
        long,
        default_value = DEFAULT_IGNORE_FILE,
        env = "FLATTENER_IGNORE_FILE",
        value_name = "NAME",
        long_help = "Name of the ignore file read from the root directory (not recursively).\n\n\
One pattern per line, '#' comments, '!' negation, trailing '/' for directories.\n\
A missing or unreadable file means no rules."
    )]
    pub ignore_file: String,

    /// Token model for the estimate (estimate/cl100k/o200k).
    #[arg(
        long,
        default_value = "estimate",
        env = "FLATTENER_TOKEN_MODEL",
        value_name = "MODEL",
        long_help = "Model used for the token estimate in the summary.\n\n\
Supported values:\n\
- estimate (default): characters / 4\n\
- cl100k: cl100k_base BPE encoding\n\
- o200k: o200k_base BPE encoding"
    )]
    pub token_model: String,

    /// Print statistics as JSON instead of the summary.
    #[arg(long)]
    pub stats_json: bool,

    /// Quiet mode (no progress or summary).
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (-v info, -vv debug).
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        long_help = "Increase log verbosity on stderr. RUST_LOG overrides this when set."
    )]
    pub verbose: u8,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,
}

/// Set up tracing on stderr
fn init_logging(verbose: u8, no_color: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,ignore=warn,globset=warn"),
            _ => tracing_subscriber::EnvFilter::new("debug,ignore=warn,globset=warn"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!no_color)
        .init();
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.no_color);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let token_model: TokenModel = cli.token_model.parse().unwrap_or_else(|e| {
        tracing::warn!("{}", e);
        TokenModel::default()
    });

    let opts = FlattenOptions {
        root: cli.root,
        output: cli.output,
        ignore_file: cli.ignore_file,
        token_model,
    };

    let silent = cli.quiet || cli.stats_json;
    if !silent {
        println!("Flattening codebase to: {}", opts.output.display());
    }

    let mut progress: Box<dyn ProgressSink> = if silent {
        Box::new(NoProgress)
    } else {
        Box::new(TerminalProgress::new())
    };

    let report = flatten(&opts, progress.as_mut())?;

    if cli.stats_json {
        println!("{}", serde_json::to_string_pretty(&report.stats)?);
    } else if !cli.quiet {
        print!(
            "{}",
            render_summary(&report.stats, report.result.processed_files, &report.output)
        );
    }

    Ok(())
}
