//! Per-file conversion and recursive directory processing.
//!
//! A failing file is reported and skipped; it never halts the rest of a
//! directory run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::debug;
use walkdir::WalkDir;

use lunify_common::{Diagnostic, LineMap};

use crate::args::CliArgs;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub converted: usize,
    pub failed: usize,
}

pub fn run(args: &CliArgs) -> Result<Outcome> {
    let metadata = fs::metadata(&args.input)
        .with_context(|| format!("cannot access '{}'", args.input.display()))?;
    if metadata.is_dir() {
        Ok(convert_tree(&args.input))
    } else {
        let mut outcome = Outcome::default();
        match convert_file(&args.input, args.output.as_deref(), !args.quiet) {
            Ok(()) => outcome.converted += 1,
            Err(error) => {
                report_failure(&args.input, &error);
                outcome.failed += 1;
            }
        }
        Ok(outcome)
    }
}

/// Convert one file. `output` overrides the default `.lua` sibling path;
/// `echo` prints the converted source to stdout.
pub fn convert_file(input: &Path, output: Option<&Path>, echo: bool) -> Result<()> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("cannot read '{}'", input.display()))?;
    let file_name = input.display().to_string();
    let lua = lunify_emitter::transpile(&file_name, &source)
        .map_err(|diagnostic| anyhow::anyhow!(render_diagnostic(&diagnostic, &source)))?;

    let out_path = match output {
        Some(path) => path.to_path_buf(),
        None => default_output_path(input),
    };
    fs::write(&out_path, &lua)
        .with_context(|| format!("cannot write '{}'", out_path.display()))?;
    debug!(input = %input.display(), output = %out_path.display(), "converted");

    if echo {
        println!("{lua}");
    }
    Ok(())
}

/// The input path with its extension replaced by `.lua`.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("lua")
}

/// Recursively convert every file under `root`, skipping dot entries and
/// files that already carry the target extension.
pub fn convert_tree(root: &Path) -> Outcome {
    let mut outcome = Outcome::default();
    let walker = WalkDir::new(root)
        .into_iter()
        // The root itself may be a dot directory; only prune below it.
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.path()));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                eprintln!("{} {error}", "ERROR --".red());
                outcome.failed += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "lua") {
            continue;
        }
        match convert_file(path, None, false) {
            Ok(()) => {
                println!("{} {}", "DONE --".green(), path.display());
                outcome.converted += 1;
            }
            Err(error) => {
                report_failure(path, &error);
                outcome.failed += 1;
            }
        }
    }
    outcome
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn report_failure(path: &Path, error: &anyhow::Error) {
    eprintln!("{} {}: {error:#}", "ERROR --".red(), path.display());
}

fn render_diagnostic(diagnostic: &Diagnostic, source: &str) -> String {
    let position = LineMap::new(source).position(diagnostic.span.start);
    format!(
        "{}:{}:{}: {}",
        diagnostic.file, position.line, position.column, diagnostic.message_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn converts_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("main.js");
        fs::write(&input, "var x = 1;").unwrap();

        convert_file(&input, None, false).unwrap();

        let output = fs::read_to_string(dir.path().join("main.lua")).unwrap();
        assert!(output.starts_with("local _JS = require('colony-lib');"));
        assert!(output.contains("x = (1);"));
    }

    #[test]
    fn explicit_output_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("main.js");
        let output = dir.path().join("elsewhere.lua");
        fs::write(&input, "var x = 1;").unwrap();

        convert_file(&input, Some(&output), false).unwrap();

        assert!(output.exists());
        assert!(!dir.path().join("main.lua").exists());
    }

    #[test]
    fn directory_mode_recurses_and_skips_lua_and_dotfiles() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("a.js"), "var a = 1;").unwrap();
        fs::write(dir.path().join("nested/b.js"), "var b = 2;").unwrap();
        fs::write(dir.path().join("old.lua"), "return {}").unwrap();
        fs::write(dir.path().join(".hidden.js"), "var h = 3;").unwrap();
        fs::write(dir.path().join(".git/c.js"), "var c = 4;").unwrap();

        let outcome = convert_tree(dir.path());

        assert_eq!(outcome.converted, 2);
        assert_eq!(outcome.failed, 0);
        assert!(dir.path().join("a.lua").exists());
        assert!(dir.path().join("nested/b.lua").exists());
        assert!(!dir.path().join(".hidden.lua").exists());
        assert!(!dir.path().join(".git/c.lua").exists());
    }

    #[test]
    fn a_failing_file_does_not_stop_the_walk() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.js"), "function (").unwrap();
        fs::write(dir.path().join("good.js"), "var ok = 1;").unwrap();

        let outcome = convert_tree(dir.path());

        assert_eq!(outcome.converted, 1);
        assert_eq!(outcome.failed, 1);
        assert!(dir.path().join("good.lua").exists());
        assert!(!dir.path().join("bad.lua").exists());
    }

    #[test]
    fn parse_errors_render_line_and_column() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.js");
        fs::write(&input, "var x = 1;\nvar = 2;").unwrap();

        let error = convert_file(&input, None, false).unwrap_err();
        let message = format!("{error:#}");
        assert!(message.contains("bad.js"));
        assert!(message.contains(":2:"));
    }
}
