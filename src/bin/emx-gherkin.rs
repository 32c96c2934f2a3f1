//! emx-gherkin CLI
//!
//! Parses feature files and dry-runs them: with no step definitions
//! registered, every step is reported as undefined.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use emx_gherkin::logging::{init_logging, LogLevel};
use emx_gherkin::{parse_feature, FeatureRunner, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "emx-gherkin")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Parse and dry-run Gherkin feature files")]
struct Cli {
    /// Directory or feature file
    #[arg(default_value = "features")]
    path: PathBuf,

    /// Only run files whose name contains this string
    #[arg(short = 'f', long)]
    filter: Option<String>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Verbose output: show the per-step trace
    #[arg(short, long)]
    verbose: bool,

    /// File extensions to match [default: .feature]
    #[arg(long = "ext", default_value = ".feature")]
    extensions: Vec<String>,

    /// Print scenarios and steps (outlines expanded) without running
    #[arg(long)]
    list: bool,

    /// Show number of scenarios without running
    #[arg(long)]
    count: bool,

    /// Log level (trace, debug, info, warn, error); overrides EMX_GHERKIN_LOG
    #[arg(long = "log-level")]
    log_level: Option<LogLevel>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.log_level {
        Some(level) => level,
        None => match LogLevel::from_env() {
            Ok(level) => level,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };
    init_logging(level);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = RunConfig {
        dir: cli.path,
        filter: cli.filter,
        extensions: cli.extensions,
        recursive: cli.recursive,
        verbose: cli.verbose,
    };
    let mut runner = FeatureRunner::new(config);

    if cli.list || cli.count {
        let mut total = 0;
        for file in runner.discover()? {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let feature = parse_feature(&text)
                .map_err(|e| e.with_file(file.to_string_lossy()))?;
            total += feature.scenarios.len();
            if cli.list {
                print_feature(&file, &feature);
            }
        }
        if cli.count {
            println!("Found {} scenario(s)", total);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let result = runner.run_all()?;

    for feature in &result.features {
        match feature.error {
            Some(ref err) => {
                println!("ERROR {}", feature.name);
                for line in err.lines() {
                    println!("      {}", line);
                }
            }
            None => println!("      {} - {}", feature.name, feature.report),
        }
        if cli.verbose {
            for line in feature.trace.lines() {
                println!("      {}", line);
            }
        }
    }

    println!();
    println!("{}", result.summary());

    if result.features.iter().any(|f| f.error.is_some()) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_feature(file: &std::path::Path, feature: &emx_gherkin::Feature) {
    println!("{}", file.display());
    if let Some(ref label) = feature.label {
        println!("  Feature: {}", label);
    }
    if let Some(ref bg) = feature.background {
        println!("  {}", bg.heading);
        for step in &bg.steps {
            println!("    {}", step.orig);
        }
    }
    for scenario in &feature.scenarios {
        println!("  {}", scenario.heading);
        if let Some(ref example) = scenario.example {
            let cells: Vec<String> = example.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            println!("    ({})", cells.join(", "));
        }
        for step in &scenario.steps {
            println!("    {}", step.orig);
            for row in &step.table {
                let cells: Vec<&str> = row.values().map(|v| v.as_str()).collect();
                println!("      | {} |", cells.join(" | "));
            }
        }
    }
}
