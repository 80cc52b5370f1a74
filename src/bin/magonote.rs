//! `magonote` CLI binary.
//!
//! Grounded on skim's `src/bin/main.rs` split between `fn main()` (argument
//! parsing, logging setup, exit-code translation) and an inner
//! `fn run(...) -> Result<i32>` that does the actual work and never calls
//! `std::process::exit` itself.

use std::fs;
use std::io::{self, IsTerminal, Read, Write};

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use log::trace;

use magonote::config::{CliArgs, FileConfig, Settings};
use magonote::engine::MatchEngine;
use magonote::view::{fullscreen, list};
use magonote::ChosenMatch;

fn main() -> Result<()> {
    let cli = CliArgs::parse();
    color_eyre::install()?;
    magonote::logging::init(None);
    trace!("Command line: {:?}", std::env::args());

    match run(cli) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(err) => match err.downcast_ref::<magonote::error::ConfigError>() {
            Some(_) => {
                eprintln!("magonote: {err}");
                std::process::exit(2);
            }
            None => Err(eyre!(err)),
        },
    }
}

fn run(cli: CliArgs) -> Result<i32> {
    let file_config = FileConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, &file_config)?;

    let text = read_input(&cli)?;
    let engine = MatchEngine::new(&text, settings.engine.clone());
    let matches = engine.matches(settings.reverse, settings.unique_level);

    let chosen = if settings.list_view {
        list::present(&matches, settings.list)?
    } else {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        fullscreen::present(&lines, matches, settings.fullscreen)?
    };

    write_selection(&settings, &chosen)?;
    Ok(0)
}

fn read_input(cli: &CliArgs) -> Result<String> {
    if let Some(path) = &cli.input_file {
        return Ok(fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(eyre!("magonote: no input file given and stdin is a terminal"));
    }
    stdin.read_to_string(&mut buf)?;
    Ok(buf)
}

/// Renders one chosen match per `settings.format` (spec.md §6.4: `%H`→text,
/// `%U`→`"true"`/`"false"`), writes to `target` or stdout, and invokes
/// `$EDITOR` for any match marked `should_open_file`.
fn write_selection(settings: &Settings, chosen: &[ChosenMatch]) -> Result<()> {
    let rendered: Vec<String> = chosen.iter().map(|c| render_one(&settings.format, c)).collect();
    let output = rendered.join("\n");

    match &settings.target {
        Some(path) => fs::write(path, output)?,
        None => {
            let mut stdout = io::stdout();
            write!(stdout, "{output}")?;
        }
    }

    for c in chosen {
        if c.should_open_file {
            open_in_editor(&c.text)?;
        }
    }

    Ok(())
}

fn render_one(format: &str, chosen: &ChosenMatch) -> String {
    format.replace("%H", &chosen.text).replace("%U", if chosen.uppercase { "true" } else { "false" })
}

fn open_in_editor(path: &str) -> Result<()> {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    std::process::Command::new(editor).arg(path).status()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_one_substitutes_tokens() {
        let chosen = ChosenMatch { text: "/etc/hosts".to_string(), uppercase: true, should_open_file: true };
        assert_eq!(render_one("%H (%U)", &chosen), "/etc/hosts (true)");
    }
}
