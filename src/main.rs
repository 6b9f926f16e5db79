//! flattener - Flatten a codebase into a single XML document
//!
//! flattener provides:
//! - Directory discovery with ignore-file rules (negations always win)
//! - Binary/text classification by extension and content sample
//! - XML output with CDATA-wrapped, indented file content
//! - A completion summary with sizes, line counts and token estimates

use anyhow::Result;
use clap::Parser;

mod backends;
mod cli;
mod core;
mod flows;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run(cli)
}
