use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "flowgate")]
#[command(version, about = "Flowgate policy evaluation CLI", long_about = None)]
struct Cli {
    /// Log filter (e.g. `debug`, `flow_policy=trace`)
    #[arg(long, global = true, env = "FLOWGATE_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide a single request; exits 0 on allow and 1 on deny
    Eval {
        /// Policy document (.json, .toml, .yaml or .yml)
        #[arg(short, long, env = "FLOWGATE_POLICIES")]
        policies: PathBuf,

        /// Action being performed (e.g. `invoice.approve`)
        #[arg(short, long)]
        action: String,

        /// Concrete target (e.g. `invoice:555`)
        #[arg(short, long)]
        target: String,

        /// JSON file with the request payload (`context.*`)
        #[arg(long)]
        context: Option<PathBuf>,

        /// JSON file with the principal's attributes (`user.*`)
        #[arg(long)]
        user: Option<PathBuf>,

        /// List every rule that matched the request
        #[arg(long)]
        explain: bool,
    },
    /// Validate a policy document
    Check {
        /// Policy document (.json, .toml, .yaml or .yml)
        #[arg(env = "FLOWGATE_POLICIES")]
        file: PathBuf,
    },
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Eval {
            policies,
            action,
            target,
            context,
            user,
            explain,
        } => {
            let request = commands::eval::EvalRequest {
                policies,
                action,
                target,
                context,
                user,
                explain,
            };
            let decision = commands::eval::run(&request)?;
            Ok(if decision.is_allowed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Commands::Check { file } => {
            commands::policy::check(&file)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}
