use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the lunify binary.
#[derive(Parser, Debug)]
#[command(
    name = "lunify",
    version,
    about = "Compile JavaScript source files to Lua"
)]
pub struct CliArgs {
    /// A JavaScript file, or a directory to convert recursively.
    pub input: PathBuf,

    /// Where to write the output (single-file mode only). Defaults to the
    /// input path with its extension replaced by `.lua`.
    pub output: Option<PathBuf>,

    /// Do not echo the converted source to stdout in single-file mode.
    #[arg(short, long)]
    pub quiet: bool,
}
