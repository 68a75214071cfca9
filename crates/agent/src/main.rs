// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lookoutd: the lookout host telemetry agent binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use lookout_agent::logging::{self, StartupBuffer};
use lookout_agent::migrate::{self, MigrateSpec};
use lookout_agent::{lifecycle, plugins};
use lookout_core::Config;

#[derive(Parser, Debug)]
#[command(name = "lookoutd", version, about = "lookout host telemetry agent")]
struct Cli {
    /// Configuration file (TOML). Defaults apply when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    validate: bool,

    /// Shortcut for debug-level logging.
    #[arg(long)]
    debug: bool,

    /// Log verbosity: 0 info, 1 debug, >=2 trace.
    #[arg(long, value_name = "LEVEL")]
    verbose: Option<u8>,

    /// CPU profile output path (accepted for interface compatibility).
    #[arg(long, value_name = "FILE")]
    cpuprofile: Option<PathBuf>,

    /// Memory profile output path (accepted for interface compatibility).
    #[arg(long, value_name = "FILE")]
    memprofile: Option<PathBuf>,

    /// Migrate a legacy integration config: src:defs:out:overwrite.
    #[arg(long, value_name = "SRC:DEFS:OUT:OVERWRITE")]
    v3tov4: Option<String>,

    /// Echo the effective configuration without starting the runtime.
    #[arg(long = "dry_run")]
    dry_run: bool,

    /// Integration configuration echoed in dry-run mode.
    #[arg(long = "integration_config_path", value_name = "PATH")]
    integration_config_path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(spec) = &cli.v3tov4 {
        return run_migration(spec);
    }

    let buffer = StartupBuffer::new();
    let config = match load_config(&cli, &buffer) {
        Ok(config) => config,
        Err(e) => {
            if cli.validate {
                // Validation reports the outcome and always exits 0.
                println!("configuration invalid: {e}");
                return ExitCode::SUCCESS;
            }
            eprintln!("lookoutd: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.validate {
        println!("configuration OK");
        return ExitCode::SUCCESS;
    }

    if cli.dry_run {
        return dry_run(&config, cli.integration_config_path.as_deref());
    }

    if cli.cpuprofile.is_some() || cli.memprofile.is_some() {
        buffer.record("profiling flags accepted but profiling is delegated to external tooling");
    }

    let log_control = match logging::init(&config) {
        Ok(control) => Arc::new(control),
        Err(e) => {
            eprintln!("lookoutd: cannot configure logging: {e}");
            return ExitCode::FAILURE;
        }
    };
    buffer.replay();

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if config.max_procs > 0 {
        builder.worker_threads(config.max_procs);
    }
    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("lookoutd: cannot build runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(lifecycle::run(Arc::new(config), log_control)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("boot failed: {e}");
            eprintln!("lookoutd: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli, buffer: &StartupBuffer) -> Result<Config, lookout_core::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => {
            buffer.record(format!("loading configuration from {}", path.display()));
            Config::load(path)?
        }
        None => {
            buffer.record("no configuration file given, using defaults");
            Config::default()
        }
    };
    if let Some(verbose) = cli.verbose {
        config.verbose = verbose;
    }
    if cli.debug {
        config.verbose = config.verbose.max(1);
    }
    Ok(config)
}

fn run_migration(raw: &str) -> ExitCode {
    let spec: MigrateSpec = match raw.parse() {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("lookoutd: {e}");
            return ExitCode::FAILURE;
        }
    };
    match migrate::migrate(&spec) {
        Ok(()) => {
            println!("migrated {} -> {}", spec.src.display(), spec.out.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("lookoutd: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Echo the effective (redacted) configuration and any integration config,
/// then exit without starting the runtime.
fn dry_run(config: &Config, integration_config: Option<&std::path::Path>) -> ExitCode {
    for (name, value) in config.fields() {
        println!("{name}={value}");
    }
    if let Some(path) = integration_config {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                eprintln!("lookoutd: cannot read {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        };
        let parsed: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("lookoutd: cannot parse {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        };
        match serde_json::to_string_pretty(&parsed) {
            Ok(pretty) => println!("{pretty}"),
            Err(e) => {
                eprintln!("lookoutd: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
    for declared in plugins::external_files::parse_declarations(&config.external_files_dir()) {
        println!("external file: {}", declared.display());
    }
    ExitCode::SUCCESS
}
