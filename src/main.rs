use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use quill::{global_env_stdout, parse, tokenize, Evaluator, Value};

#[derive(Parser, Debug)]
#[clap(name = "quill", version, about = "Runs quill scripts")]
struct Args {
    /// Script to run
    #[clap(value_parser, required_unless_present = "eval")]
    path: Option<PathBuf>,

    /// Source code to run instead of a file
    #[clap(short, long, value_parser, conflicts_with = "path")]
    eval: Option<String>,

    /// Print the tokens and stop
    #[clap(long)]
    tokens: bool,

    /// Print the syntax tree and stop
    #[clap(long)]
    ast: bool,

    /// Print the value of the last statement
    #[clap(long)]
    print_result: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("QUILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message.red());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let source = match (&args.path, &args.eval) {
        (_, Some(code)) => code.clone(),
        (Some(path), None) => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?,
        (None, None) => return Err("no script given".to_owned()),
    };

    if args.tokens {
        for token in tokenize(&source) {
            println!("{:?} {:?} {}..{}", token.kind, token.value, token.span.0, token.span.1);
        }
        return Ok(());
    }

    let program = parse(&source).map_err(|e| format!("parse error: {}", e))?;

    if args.ast {
        println!("{:#?}", program);
        return Ok(());
    }

    let mut evaluator = Evaluator::new(global_env_stdout());
    let result = evaluator.eval(&program).map_err(|e| format!("runtime error: {}", e))?;

    if args.print_result {
        match result {
            Value::Null => println!("{}", "null".cyan()),
            value => println!("{}", value),
        }
    }

    Ok(())
}
