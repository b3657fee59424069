use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use quanta_driver::fixtures::{self, Fixture, FIXTURES};
use quanta_typeck::{CheckerOptions, TypeError};

#[derive(Parser)]
#[command(
    name = "quanta",
    version = "0.1.0",
    about = "Structural pattern matching checker for TypeScript-style types",
    long_about = "Runs the conformance fixtures of the Quanta checker: infer-pattern\nmatching, quantified literal rows and union distribution."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Recursion limit for matching and type resolution
    #[arg(long, global = true, default_value_t = CheckerOptions::default().max_depth)]
    max_depth: usize,

    /// Disable memoization of unifier results
    #[arg(long, global = true)]
    no_memo: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available fixtures
    List,

    /// Check fixtures and compare their diagnostics with the expected codes
    Check {
        /// Fixtures to run (all when omitted)
        names: Vec<String>,
    },

    /// Show a fixture's source and declared types
    Show {
        /// Fixture name
        name: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = CheckerOptions { max_depth: cli.max_depth, memoize: !cli.no_memo };
    debug!(?options, "checker options");

    match cli.command {
        Commands::List => list_command(),
        Commands::Check { names } => check_command(&names, options),
        Commands::Show { name } => show_command(&name),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn list_command() -> ExitCode {
    for fixture in FIXTURES {
        println!("{:<32} {}", fixture.name, fixture.description);
    }
    ExitCode::SUCCESS
}

fn check_command(names: &[String], options: CheckerOptions) -> ExitCode {
    let selected: Vec<&Fixture> = if names.is_empty() {
        FIXTURES.iter().collect()
    } else {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            match fixtures::find(name) {
                Some(fixture) => selected.push(fixture),
                None => {
                    eprintln!("Unknown fixture: {}", name);
                    return ExitCode::FAILURE;
                }
            }
        }
        selected
    };

    let mut failed = 0;
    for fixture in &selected {
        let run = fixture.run(options);
        for diagnostic in &run.diagnostics {
            report_error(diagnostic, fixture.name, fixture.source);
        }

        if run.passed {
            println!("ok    {}", fixture.name);
        } else {
            failed += 1;
            println!(
                "FAIL  {} (expected [{}], got [{}])",
                fixture.name,
                fixture.expected.join(", "),
                run.codes().join(", ")
            );
        }
    }

    println!();
    println!("{} passed, {} failed", selected.len() - failed, failed);
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn show_command(name: &str) -> ExitCode {
    let Some(fixture) = fixtures::find(name) else {
        eprintln!("Unknown fixture: {}", name);
        return ExitCode::FAILURE;
    };

    let built = fixture.build();
    println!("// {}", fixture.description);
    print!("{}", fixture.source);
    println!();
    println!("// declared types");
    for (name, ty) in &built.declared {
        println!("{}: {}", name, built.arena.display(*ty));
    }
    let expected = if fixture.expected.is_empty() { "none".to_string() } else { fixture.expected.join(", ") };
    println!("// expected diagnostics: {}", expected);
    ExitCode::SUCCESS
}

fn report_error(error: &TypeError, filename: &str, source: &str) {
    let span = (filename, error.span.start..error.span.end);
    let mut report = Report::build(ReportKind::Error, span.clone())
        .with_code(error.code())
        .with_message("Type error")
        .with_label(
            Label::new(span)
                .with_message(error.kind.to_string())
                .with_color(Color::Red),
        );
    if let Some(note) = &error.note {
        report = report.with_note(note);
    }
    if let Err(e) = report.finish().eprint((filename, Source::from(source))) {
        eprintln!("{}", error);
        debug!(%e, "diagnostic rendering failed");
    }
}
