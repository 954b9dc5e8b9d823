use clap::Parser;
use esrt::interpreter::{EngineError, EngineOptions, Interpreter};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "esrt", version, about = "An ECMAScript 5.1 execution runtime")]
struct Cli {
    /// JavaScript file to execute
    file: Option<PathBuf>,

    /// Evaluate inline JavaScript
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,

    /// Run global code as strict mode code
    #[arg(long)]
    strict: bool,

    /// Nested calls beyond this depth throw a RangeError
    #[arg(long, default_value_t = EngineOptions::DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Arguments objects kept for reuse
    #[arg(long, default_value_t = EngineOptions::DEFAULT_POOL_CAPACITY)]
    arguments_pool_capacity: usize,

    /// Completion records kept for reuse
    #[arg(long, default_value_t = EngineOptions::DEFAULT_POOL_CAPACITY)]
    completion_pool_capacity: usize,

    /// Log context, eval and pool activity to stderr (RUST_LOG overrides)
    #[arg(long)]
    trace: bool,
}

impl Cli {
    fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            strict: self.strict,
            max_call_depth: self.max_call_depth,
            arguments_pool_capacity: self.arguments_pool_capacity,
            completion_pool_capacity: self.completion_pool_capacity,
        }
    }
}

fn init_tracing(trace: bool) {
    let default = if trace { "esrt=trace" } else { "esrt=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if let Err(err) = builder.try_init() {
        eprintln!("failed to install tracing subscriber: {err}");
    }
}

fn report(interp: &Interpreter, err: &EngineError) {
    match err {
        EngineError::Parse(e) => eprintln!("SyntaxError: {e}"),
        EngineError::Exception(e) => {
            eprintln!("Uncaught {}", interp.format_value(&e.value));
            for frame in e.call_stack.iter().rev() {
                eprintln!("    at {frame}");
            }
        }
    }
}

fn execute_code(interp: &mut Interpreter, code: &str) -> ExitCode {
    match interp.run_source(code) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            report(interp, &e);
            ExitCode::from(1)
        }
    }
}

fn run_file(interp: &mut Interpreter, path: &Path) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            return ExitCode::from(1);
        }
    };
    execute_code(interp, &source)
}

fn run_repl(interp: &mut Interpreter) -> ExitCode {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("esrt v{}", env!("CARGO_PKG_VERSION"));
    println!("Type JavaScript statements. .bindings lists globals, Ctrl-D exits.");

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        let read_result = stdin.lock().read_line(&mut line);

        match read_result {
            Ok(0) => break,
            Ok(_) => match line.trim() {
                "" => {}
                ".bindings" => println!("{}", interp.global_binding_names().join(", ")),
                trimmed => match interp.run_source(trimmed) {
                    Ok(value) => println!("{}", interp.format_value(&value)),
                    Err(e) => report(interp, &e),
                },
            },
            Err(e) => {
                eprintln!("Read error: {e}");
                return ExitCode::from(1);
            }
        }
    }

    println!();
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.trace);
    let mut interp = Interpreter::with_options(cli.engine_options());

    if let Some(code) = &cli.eval {
        return execute_code(&mut interp, code);
    }

    if let Some(path) = &cli.file {
        return run_file(&mut interp, path);
    }

    run_repl(&mut interp)
}
