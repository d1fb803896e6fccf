use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use minmath::{
    CompilationOptions, Dispatch, Engine, EngineOptions, Error, ExecutionOptions, eval, optimize,
    parse, render_error,
};
use std::io::{BufRead, BufReader, IsTerminal};

/// minmath - evaluate integer expressions through the bytecode VM
#[derive(Parser, Debug)]
#[command(name = "minmath")]
#[command(about = "Evaluate integer expressions", long_about = None)]
struct Args {
    /// Simplify the tree before compiling it
    #[arg(short = 'O', long)]
    optimize: bool,

    /// Collapse jump chains in the compiled bytecode
    #[arg(short, long)]
    peephole: bool,

    /// Print the bytecode listing before each result
    #[arg(short, long)]
    disassemble: bool,

    /// Evaluate the tree directly instead of compiling it
    #[arg(long)]
    tree: bool,

    /// Run the unchecked VM loop with this dispatch strategy. Without it,
    /// expressions run through the bounds-checked interpreter, which reports
    /// division by zero instead of aborting.
    #[arg(long, value_enum)]
    dispatch: Option<DispatchArg>,

    /// Define a variable (repeatable; later definitions win)
    #[arg(short = 'D', value_name = "NAME=VALUE", value_parser = parse_define)]
    define: Vec<(String, i32)>,

    /// Expressions to evaluate (if not provided, reads lines from stdin)
    expressions: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DispatchArg {
    Switch,
    Threaded,
}

impl From<DispatchArg> for Dispatch {
    fn from(arg: DispatchArg) -> Self {
        match arg {
            DispatchArg::Switch => Dispatch::Switch,
            DispatchArg::Threaded => Dispatch::Threaded,
        }
    }
}

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
enum CliError {
    #[error("no expressions given")]
    #[diagnostic(help("pass expressions as arguments or pipe them on standard input"))]
    NoInput,

    #[error("{failed} of {total} expressions failed")]
    Failed { failed: usize, total: usize },
}

fn parse_define(text: &str) -> Result<(String, i32), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("`{}` is not of the form NAME=VALUE", text))?;
    let name = name.trim();
    let valid_name = name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_name {
        return Err(format!("`{}` is not a valid variable name", name));
    }
    let value = value
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid value for `{}`: {}", name, e))?;
    Ok((name.to_string(), value))
}

/// Evaluates expressions with the options chosen on the command line.
struct Session<'a> {
    args: &'a Args,
    engine: Engine,
    bindings: Vec<(&'a str, i32)>,
}

impl<'a> Session<'a> {
    fn new(args: &'a Args) -> Self {
        // Lookup takes the first match, so the last definition goes first.
        let bindings = args
            .define
            .iter()
            .rev()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();

        let engine = Engine::new(EngineOptions {
            default_compilation_options: CompilationOptions {
                optimize: args.optimize,
                peephole: args.peephole,
            },
            default_execution_options: ExecutionOptions {
                dispatch: args.dispatch.map(Dispatch::from).unwrap_or_default(),
                checked: args.dispatch.is_none(),
            },
        });

        Self {
            args,
            engine,
            bindings,
        }
    }

    fn evaluate(&self, source: &str) -> Result<i32, Error> {
        let tree = parse(source)?;
        tracing::debug!(source, "Parsed expression");

        if self.args.tree {
            let value = if self.args.optimize {
                eval(&optimize(&tree), self.bindings.as_slice())
            } else {
                eval(&tree, self.bindings.as_slice())
            };
            return Ok(value?);
        }

        let mut expr = self.engine.compile(&tree)?;
        if self.args.disassemble {
            print!("{}", expr.code());
        }
        expr.bind(self.bindings.as_slice())?;
        expr.run()
    }

    /// Evaluate and print one expression, returning whether it succeeded.
    fn report(&self, source: &str) -> bool {
        match self.evaluate(source) {
            Ok(value) => {
                println!("{} = {}", source, value);
                true
            }
            Err(err) => {
                if let Error::Parse(_) = err {
                    render_error(&err, source);
                }
                eprintln!("{} = ERROR: {}", source, err);
                false
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging subscriber
    use tracing_subscriber::{EnvFilter, fmt};

    // Use RUST_LOG environment variable to control log level
    // Default to WARN if not set
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .into_diagnostic()?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let session = Session::new(&args);
    let mut total = 0;
    let mut failed = 0;

    if !args.expressions.is_empty() {
        for source in &args.expressions {
            total += 1;
            failed += usize::from(!session.report(source));
        }
    } else {
        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(CliError::NoInput.into());
        }

        // Pipe/stdin mode: one expression per line
        let reader = BufReader::new(stdin.lock());
        for line in reader.lines() {
            let line = line.into_diagnostic()?;
            let source = line.trim();
            if source.is_empty() || source.starts_with('#') {
                continue;
            }
            total += 1;
            failed += usize::from(!session.report(source));
        }
    }

    tracing::debug!(total, failed, "Finished");
    if failed > 0 {
        let err: miette::Report = CliError::Failed { failed, total }.into();
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("minmath").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_define() {
        assert_eq!(parse_define("x=5"), Ok(("x".to_string(), 5)));
        assert_eq!(parse_define(" _y2 = -7 "), Ok(("_y2".to_string(), -7)));
        assert!(parse_define("x").is_err());
        assert!(parse_define("2x=1").is_err());
        assert!(parse_define("x=big").is_err());
    }

    #[test]
    fn test_session_modes_agree() {
        let sources = ["a * b + 1", "a > b ? a - b : b - a", "a && b || !a"];
        let modes: [&[&str]; 5] = [
            &[],
            &["-O", "-p"],
            &["--tree"],
            &["--dispatch", "switch"],
            &["-O", "--dispatch", "threaded"],
        ];
        for mode in modes {
            let mut argv = vec!["-D", "a=6", "-D", "b=7"];
            argv.extend_from_slice(mode);
            let args = args(&argv);
            let session = Session::new(&args);
            let results: Vec<i32> = sources
                .iter()
                .map(|source| session.evaluate(source).unwrap())
                .collect();
            assert_eq!(results, [43, 1, 1], "{:?}", mode);
        }
    }

    #[test]
    fn test_later_definitions_win() {
        let args = args(&["-D", "x=1", "-D", "x=2"]);
        assert_eq!(Session::new(&args).evaluate("x"), Ok(2));
    }

    #[test]
    fn test_errors() {
        let args = args(&[]);
        let session = Session::new(&args);
        assert!(matches!(session.evaluate("1 +"), Err(Error::Parse(_))));
        assert!(matches!(session.evaluate("x"), Err(Error::Runtime(_))));
        assert!(matches!(session.evaluate("1 / 0"), Err(Error::Runtime(_))));
        assert!(!session.report("1 / 0"));
        assert!(session.report("6 * 7"));
    }
}
