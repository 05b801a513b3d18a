//! CLI tool to run, compile, check, and format Note G programs.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use noteg::{CompileOptions, Interpreter, Synth, Target, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "noteg", version, about = "Note G language toolchain")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a program and print its output.
    Run { file: PathBuf },
    /// Compile a program to JavaScript or HTML.
    Compile {
        file: PathBuf,
        #[arg(short, long, value_enum, default_value = "js")]
        target: TargetArg,
        /// Document title for the HTML targets.
        #[arg(long)]
        title: Option<String>,
        /// Write to this file instead of stdout.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Report lexer and parser errors.
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print diagnostics as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print a program in canonical form.
    Fmt {
        file: PathBuf,
        /// Only report whether the file is already formatted.
        #[arg(long)]
        check: bool,
    },
    /// Render a template with the bounded substitution engine.
    Synth {
        template: PathBuf,
        /// Variable binding, repeatable.
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TargetArg {
    Js,
    Html,
    A11y,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Js => Self::JavaScript,
            TargetArg::Html => Self::Html,
            TargetArg::A11y => Self::AccessibleHtml,
        }
    }
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Returns whether the command succeeded.
fn execute(command: Command) -> Result<bool> {
    match command {
        Command::Run { file } => run(&file),
        Command::Compile {
            file,
            target,
            title,
            output,
        } => {
            let source = read(&file)?;
            let mut options = CompileOptions::new(target.into());
            if let Some(title) = title {
                options = options.title(&title);
            }
            let compiled = match noteg::compile_with(&source, &options) {
                Ok(compiled) => compiled,
                Err(e) => {
                    eprintln!("{}: {e}", file.display());
                    return Ok(false);
                }
            };
            match output {
                Some(path) => fs::write(&path, compiled)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{compiled}"),
            }
            Ok(true)
        }
        Command::Check { files, json } => check(&files, json),
        Command::Fmt { file, check } => {
            let source = read(&file)?;
            let program = match noteg::parse_str(&source) {
                Ok(program) => program,
                Err(e) => {
                    eprintln!("{}: {e}", file.display());
                    return Ok(false);
                }
            };
            let formatted = noteg::format(&program);
            if !check {
                print!("{formatted}");
                return Ok(true);
            }
            if formatted == source {
                eprintln!("{}: formatted", file.display());
                Ok(true)
            } else {
                eprintln!("{}: not formatted", file.display());
                Ok(false)
            }
        }
        Command::Synth { template, vars } => {
            let text = read(&template)?;
            let mut synth = Synth::new();
            for (name, value) in &vars {
                synth
                    .set(name, value)
                    .map_err(|e| anyhow!("--var {name}: {e} (status {})", e.status()))?;
            }
            let rendered = synth
                .render(&text)
                .map_err(|e| anyhow!("{}: {e} (status {})", template.display(), e.status()))?;
            print!("{rendered}");
            Ok(true)
        }
    }
}

fn run(file: &Path) -> Result<bool> {
    let source = read(file)?;
    let mut interp = Interpreter::new();
    let result = interp.run(&source);
    print!("{}", interp.take_output());
    match result {
        Ok(Value::Null) => Ok(true),
        Ok(value) => {
            println!("{value}");
            Ok(true)
        }
        Err(e) => {
            eprintln!("{}: {e}", file.display());
            Ok(false)
        }
    }
}

fn check(files: &[PathBuf], json: bool) -> Result<bool> {
    let mut all = Vec::new();
    let mut had_error = false;

    for path in files {
        let diagnostics = noteg::check(&read(path)?);
        had_error |= !diagnostics.is_empty();
        if json {
            all.push(serde_json::json!({
                "file": path.display().to_string(),
                "diagnostics": diagnostics,
            }));
            continue;
        }
        if diagnostics.is_empty() {
            eprintln!("{}: ok", path.display());
        }
        for d in diagnostics {
            eprintln!(
                "{}:{}:{}: error[{}]: {}",
                path.display(),
                d.range.start.line + 1,
                d.range.start.character + 1,
                d.code.as_deref().unwrap_or("error"),
                d.message
            );
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&all).context("failed to serialize diagnostics")?
        );
    }
    Ok(!had_error)
}
