use std::{
    io::{stdin, stdout, Write},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use serde_json::json;

use interpreter::{Interpreter, Limits, LogSink, WriterSink};

/// Runs gimme programs.
#[derive(clap::Parser)]
#[command(version, about)]
struct Args {
    /// Script to run. Starts an interactive prompt when omitted.
    file: Option<PathBuf>,

    /// Print the syntax tree as JSON before running.
    #[arg(long)]
    ast: bool,

    /// Print one JSON object, `{"parse_tree", "output"}` or `{"error"}`, instead of the output.
    #[arg(long)]
    json: bool,

    /// Abort after this many loop iterations.
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Abort after running for this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl Args {
    fn limits(&self) -> Limits {
        let mut limits = Limits::default();
        if let Some(max) = self.max_iterations {
            limits = limits.max_iterations(max);
        }
        if let Some(ms) = self.timeout_ms {
            limits = limits.timeout(Duration::from_millis(ms));
        }
        limits
    }
}

fn run(source: &str, args: &Args) -> anyhow::Result<()> {
    let tokens = scanner::tokenize(source)?;
    let program = parser::parse(tokens)?;
    if args.ast {
        println!("{}", serde_json::to_string_pretty(&program)?);
    }
    Interpreter::with_limits(WriterSink(stdout()), args.limits()).execute(&program)?;
    Ok(())
}

/// Printed lines go to the log so that stdout only carries the JSON.
fn run_json(source: &str, args: &Args) -> (serde_json::Value, bool) {
    match interpreter::run_source(source, LogSink, args.limits()) {
        Ok(run) => (json!({ "parse_tree": run.program, "output": run.execution.output }), true),
        Err(e) => {
            log::debug!("Run failed: {:?}", e);
            (json!({ "error": e.to_string() }), false)
        }
    }
}

fn run_file(path: PathBuf, args: &Args) -> anyhow::Result<ExitCode> {
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if args.json {
        let (response, ok) = run_json(&source, args);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    run(&source, args)?;
    Ok(ExitCode::SUCCESS)
}

/// Every line is a separate program, nothing carries over between lines.
fn run_prompt(args: &Args) -> anyhow::Result<ExitCode> {
    loop {
        print!("> ");
        stdout().flush()?;
        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            return Ok(ExitCode::SUCCESS);
        }

        if args.json {
            println!("{}", run_json(&line, args).0);
        } else if let Err(e) = run(&line, args) {
            println!("{}", e);
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    match args.file.clone() {
        Some(file) => run_file(file, &args),
        None => run_prompt(&args),
    }
}
