//! Bank Engine CLI
//!
//! Command-line interface to the branch bank accounts.
//!
//! # Usage
//!
//! ```bash
//! bank-engine --actor 11111111                           # interactive menu
//! bank-engine --actor 11111111 deposit 100001 250
//! bank-engine --actor 11111111 transfer 100001 100002 40
//! bank-engine --actor 99999999 --role banker accounts > accounts.csv
//! bank-engine --config bank.toml --actor 99999999 --role banker audit
//! ```
//!
//! Diagnostics go to stderr and are filtered with `RUST_LOG`
//! (default `bank_engine=info`).
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (bad configuration, unknown actor, rejected operation, etc.)

use bank_engine::cli::{self, Command, Menu};
use bank_engine::{BankError, EngineConfig, FileEngine};
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "bank_engine=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::parse_args();

    let mut config = match EngineConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }

    let mut engine = match FileEngine::from_config(&config, args.actor()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match args.command() {
        Command::Menu => {
            let stdin = std::io::stdin();
            let mut menu = Menu::new(stdin.lock(), std::io::stdout());
            menu.run(&mut engine).map_err(BankError::from)
        }
        command => cli::run_command(&mut engine, command, &mut std::io::stdout()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
