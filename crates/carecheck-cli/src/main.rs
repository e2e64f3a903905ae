//! carecheck CLI - contract checks for the healthcare REST API

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carecheck_core::verdict::report_schema;
use carecheck_core::{
    CaseStatus, Config, Expectations, Inspection, Inspector, NormalizedResponse, Operation,
    ResultShape, SuiteReport, Validator, VerdictStatus,
};
use carecheck_runner::{HealthApi, Suite};

const CONFIG_FILE: &str = ".carecheck.toml";

#[derive(Parser)]
#[command(name = "carecheck")]
#[command(about = "Contract checks for the healthcare REST API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose output (debug logs, pretty-printed responses)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the regression suite against the live API
    Run {
        /// Config file (default: .carecheck.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Run only these cases (repeatable)
        #[arg(long = "only", value_name = "CASE")]
        only: Vec<String>,

        /// Stop after the first case that does not pass
        #[arg(long)]
        stop_on_failure: bool,

        /// Show execution plan without sending requests
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a saved response payload offline
    Validate {
        /// Operation name, e.g. getAllDepartments
        #[arg(long)]
        operation: String,

        /// File holding the response body
        #[arg(long)]
        response: PathBuf,

        /// HTTP status the body was delivered with
        #[arg(long, default_value_t = 200)]
        status_code: u16,

        /// Expected field value, FIELD=VALUE (repeatable)
        #[arg(long = "expect", value_name = "FIELD=VALUE")]
        expect: Vec<String>,
    },

    /// Check that a method body calls the required tokens
    Inspect {
        /// Source file to inspect
        #[arg(long)]
        artifact: PathBuf,

        /// Method name to locate
        #[arg(long)]
        method: String,

        /// Required call token (repeatable, default: execute)
        #[arg(long = "token")]
        tokens: Vec<String>,
    },

    /// List the operation catalog
    Operations,

    /// Initialize config file
    Init,

    /// Export JSON Schema for the suite report
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    Ok(config)
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            config,
            only,
            stop_on_failure,
            dry_run,
        } => {
            let cfg = load_config(config.as_deref())?;
            let suite = Suite::from_config(&cfg)
                .with_only(only)
                .with_stop_on_failure(stop_on_failure);

            let unknown = suite.unknown_cases();
            if !unknown.is_empty() {
                bail!("unknown case(s): {}", unknown.join(", "));
            }

            // Dry run: show plan and exit
            if dry_run {
                let plan = suite.plan();
                match cli.output {
                    OutputFormat::Terminal => println!("{}", plan.to_terminal()),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                    OutputFormat::Silent => {}
                }
                return Ok(i32::from(plan.has_errors()));
            }

            if cli.output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  base_url: {}", cfg.base_url);
                eprintln!("  site_url: {}", cfg.site_url);
                eprintln!("  params:   {} defined", cfg.params.len());
                match &cfg.inspect {
                    Some(inspect) => eprintln!("  inspect:  {}", inspect.artifact.display()),
                    None => eprintln!("  inspect:  disabled"),
                }
                eprintln!();
            }

            let api = HealthApi::from_config(&cfg).context("cannot set up the HTTP facade")?;
            let start = Instant::now();
            let report = suite.run(&api);
            tracing::info!(elapsed_secs = start.elapsed().as_secs_f64(), "suite finished");

            match cli.output {
                OutputFormat::Terminal => print_report(&report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Silent => {}
            }

            Ok(report.verdict.exit_code)
        }

        Commands::Validate {
            operation,
            response,
            status_code,
            expect,
        } => {
            let body = std::fs::read_to_string(&response)
                .with_context(|| format!("cannot read {}", response.display()))?;
            let shape = Operation::from_name(&operation).map_or(ResultShape::List, Operation::shape);
            let normalized = NormalizedResponse::from_body(status_code, body, shape);

            let mut expectations = Expectations::new();
            for pair in &expect {
                let (field, value) = parse_expectation(pair)?;
                expectations.insert(field, value);
            }

            let report = Validator::builtin().validate(&operation, &normalized, &expectations);
            match cli.output {
                OutputFormat::Terminal => {
                    if report.is_valid() {
                        println!(
                            "PASS: {operation} ({} records checked)",
                            report.records_checked
                        );
                    } else {
                        println!(
                            "FAIL: {operation} ({} problems)",
                            report.diagnostics.len()
                        );
                        for d in &report.diagnostics {
                            println!("  [{}] {d}", d.kind);
                        }
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Silent => {}
            }
            Ok(i32::from(!report.is_valid()))
        }

        Commands::Inspect {
            artifact,
            method,
            tokens,
        } => {
            let inspector = if tokens.is_empty() {
                Inspector::default()
            } else {
                Inspector::new(tokens)
            };
            let inspection = inspector.inspect_file(&artifact, &method);
            match cli.output {
                OutputFormat::Terminal => {
                    let icon = if inspection.passed() { "PASS" } else { "FAIL" };
                    println!("{icon}: {method} in {}: {inspection}", artifact.display());
                }
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "artifact": artifact,
                        "method": method,
                        "tokens": inspector.tokens(),
                        "inspection": inspection,
                    });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
                OutputFormat::Silent => {}
            }
            Ok(match inspection {
                Inspection::Passed => 0,
                Inspection::ArtifactUnreadable(_) => 3,
                Inspection::MissingTokens(_) | Inspection::DefinitionNotFound => 1,
            })
        }

        Commands::Operations => {
            match cli.output {
                OutputFormat::Terminal => {
                    for op in Operation::ALL {
                        println!(
                            "{:<52} {:<14} {}",
                            op.name(),
                            format!("{:?}", op.shape()),
                            op.method_name()
                        );
                    }
                }
                OutputFormat::Json => {
                    let ops: Vec<_> = Operation::ALL
                        .iter()
                        .map(|op| {
                            serde_json::json!({
                                "name": op.name(),
                                "shape": op.shape(),
                                "method": op.method_name(),
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&ops)?);
                }
                OutputFormat::Silent => {}
            }
            Ok(0)
        }

        Commands::Init => {
            if Path::new(CONFIG_FILE).exists() {
                eprintln!("{CONFIG_FILE} already exists");
                return Ok(1);
            }

            std::fs::write(CONFIG_FILE, Config::example())?;
            println!("Created {CONFIG_FILE}");
            println!("\nEdit the file to configure:");
            println!("  - base_url / site_url: server to test");
            println!("  - auth: token or token_env for the Authorization header");
            println!("  - params: dates, ids and names the cases send");
            println!("  - inspect: source file whose wrappers must delegate to execute");
            Ok(0)
        }

        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&report_schema())?);
            Ok(0)
        }
    }
}

/// Split `FIELD=VALUE`; the value is JSON when it parses as JSON, else a string.
fn parse_expectation(pair: &str) -> Result<(String, serde_json::Value)> {
    let Some((field, raw)) = pair.split_once('=') else {
        bail!("expectation must be FIELD=VALUE, got {pair:?}");
    };
    let value = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::from(raw));
    Ok((field.trim().to_string(), value))
}

fn print_report(report: &SuiteReport) {
    let icon = if report.verdict.status == VerdictStatus::Pass {
        "PASS"
    } else {
        "FAIL"
    };
    println!("\n{icon}: {}", report.verdict.reason);
    println!(
        "  Cases: {} total, {} passed, {} failed, {} errored",
        report.cases.len(),
        report.count(CaseStatus::Passed),
        report.count(CaseStatus::Failed),
        report.count(CaseStatus::Errored),
    );
    println!("  Exit code: {}", report.verdict.exit_code);

    let unsuccessful: Vec<_> = report.cases.iter().filter(|c| !c.passed()).collect();
    if !unsuccessful.is_empty() {
        println!("\nProblems ({}):", unsuccessful.len());
        for case in unsuccessful {
            println!("  [{}] {}", case.status, case.case);
            for msg in &case.messages {
                println!("         {msg}");
            }
        }
    }
}
