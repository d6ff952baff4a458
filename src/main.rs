use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use frontal::{
    config::{Loader, OutputFormat},
    Compilation, FrontEnd,
};

/// Scan, parse and build the symbol tables of a source file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Automaton in the `.fa` text format.
    #[arg(short, long, value_name = "PATH")]
    automaton: PathBuf,

    /// Grammar in the `LHS -> alt | alt` text format.
    #[arg(short, long, value_name = "PATH")]
    grammar: PathBuf,

    /// TOML file layered over the built-in defaults.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Print the automaton as Graphviz DOT and exit.
    #[arg(long)]
    dot: bool,

    /// Print the LL(1) table and its conflicts and exit.
    #[arg(long)]
    table: bool,

    /// Print every parser step, not only the errors.
    #[arg(long)]
    snapshots: bool,

    #[arg(short, long)]
    verbose: bool,

    /// Source file to compile.
    #[arg(required_unless_present_any = ["dot", "table"])]
    source: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match execute(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

/// Returns whether the source compiled without diagnostics.
fn execute(cli: Cli) -> Result<bool> {
    let mut loader = Loader::new();
    if let Some(path) = &cli.config {
        loader = loader.layer_file(path);
    }
    if cli.snapshots {
        loader = loader.override_key("output.snapshots", true)?;
    }
    let config = loader.load().context("failed to load configuration")?;
    let format = cli.format.unwrap_or(config.output.format);

    let automaton = read(&cli.automaton)?;
    let grammar = read(&cli.grammar)?;
    let front_end = FrontEnd::new(&automaton, &grammar, &config)?;

    if cli.dot {
        print!("{}", front_end.automaton().to_dot());
        return Ok(true);
    }
    if cli.table {
        let parser = front_end.parser();
        print!("{}", parser.table().render(parser.grammar()));
        return Ok(parser.table().is_ll1());
    }

    let Some(source) = &cli.source else {
        anyhow::bail!("no source file given");
    };
    let compilation = front_end.compile(&read(source)?);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&compilation)?),
        OutputFormat::Text => print!("{}", render_text(&compilation, config.output.snapshots)),
    }

    Ok(compilation.is_clean())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn render_text(compilation: &Compilation, snapshots: bool) -> String {
    let mut out = String::from("tokens\n");
    for token in compilation.tokens.valid() {
        out.push_str(&format!("  {}\n", token));
    }

    for error in compilation.lex_errors.iter() {
        out.push_str(&format!("{}\n", error));
    }

    if snapshots {
        out.push_str("steps\n");
        for snapshot in compilation.report.snapshots.iter() {
            out.push_str(&format!("{}\n", snapshot));
        }
    }
    for error in compilation.report.errors() {
        out.push_str(&format!("{}\n", error));
    }

    out.push_str(&compilation.tables.render());
    for redeclaration in compilation.redeclarations.iter() {
        out.push_str(&format!("{}\n", redeclaration));
    }

    out.push_str(if compilation.report.accepted {
        "accepted\n"
    } else {
        "rejected\n"
    });
    out
}
