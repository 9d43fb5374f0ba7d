use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cloudauditor::config::Config;
use cloudauditor::error::AuditError;
use cloudauditor::output::{OutputFormat, Reporter, WriterReporter};
use cloudauditor::resource::ResourceKind;
use cloudauditor::rules::{RuleRegistry, Severity};
use cloudauditor::{AuditOptions, DEFAULT_CONFIG};

#[derive(Parser)]
#[command(
    name = "cloudauditor",
    about = "Read-only cloud configuration auditor",
    version,
    author,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Audit arguments used when no subcommand is given
    #[command(flatten)]
    audit: AuditArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit an inventory export for misconfigurations (default)
    Audit(AuditArgs),

    /// List all available rules
    ListRules {
        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .cloudauditor.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct AuditArgs {
    /// Inventory export to audit
    #[arg(long, short = 'i', env = "CLOUDAUDITOR_INVENTORY")]
    inventory: Option<PathBuf>,

    /// Resource kind to audit; repeat for several (default: all)
    #[arg(long = "kind", short = 'k')]
    kinds: Vec<String>,

    /// Config file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Output format (console, json, sarif)
    #[arg(long, short = 'f')]
    format: Option<String>,

    /// Minimum severity to fail (info, low, medium, high, critical)
    #[arg(long)]
    fail_on: Option<String>,

    /// Write output to file instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => cmd_audit(cli.audit),
        Some(Commands::Audit(args)) => cmd_audit(args),
        Some(Commands::ListRules { format }) => cmd_list_rules(format),
        Some(Commands::Init { force }) => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_audit(args: AuditArgs) -> Result<i32, AuditError> {
    let format_str = args.format.unwrap_or_else(|| "console".into());
    let format = OutputFormat::from_str_lenient(&format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    });

    let fail_on = args.fail_on.and_then(|s| {
        let sev = Severity::from_str_lenient(&s);
        if sev.is_none() {
            eprintln!("Warning: unknown severity '{}', using config default", s);
        }
        sev
    });

    let kinds = if args.kinds.is_empty() {
        None
    } else {
        Some(
            args.kinds
                .iter()
                .map(|k| ResourceKind::parse(k))
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    let options = AuditOptions {
        inventory_path: args.inventory,
        config_path: args.config,
        kinds,
        fail_on_override: fail_on,
    };

    let report = cloudauditor::audit(&options)?;

    match args.output {
        Some(out) => {
            let file = std::fs::File::create(&out)?;
            WriterReporter::new(file, format, report.target_name.as_str())
                .report(&report.result, &report.verdict)?;
        }
        None => {
            WriterReporter::new(std::io::stdout().lock(), format, report.target_name.as_str())
                .report(&report.result, &report.verdict)?;
        }
    }

    // Exit code: 0 unless the policy opted into failing
    Ok(if report.verdict.pass { 0 } else { 1 })
}

fn cmd_list_rules(format_str: String) -> Result<i32, AuditError> {
    let registry = RuleRegistry::with_builtin_rules()?;
    let rules = registry.list_rules();

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&rules)?;
            println!("{}", json);
        }
        _ => {
            println!(
                "{:<20} {:<26} {:<10} DESCRIPTION",
                "KIND", "NAME", "SEVERITY"
            );
            println!("{}", "-".repeat(90));
            for rule in &rules {
                println!(
                    "{:<20} {:<26} {:<10} {}",
                    rule.kind.as_str(),
                    rule.name,
                    rule.default_severity.to_string(),
                    rule.description,
                );
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, AuditError> {
    let path = PathBuf::from(DEFAULT_CONFIG);

    if path.exists() && !force {
        eprintln!("{} already exists. Use --force to overwrite.", DEFAULT_CONFIG);
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created {}", DEFAULT_CONFIG);

    Ok(0)
}
