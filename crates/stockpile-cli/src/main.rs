mod commands;

use clap::{Parser, Subcommand};
use commands::EXIT_FAILURE;
use std::path::PathBuf;
use std::process::ExitCode;
use stockpile_remote::RetrieveConfig;

#[derive(Debug, Parser)]
#[command(
    name = "stockpile",
    version,
    about = "Verify asset manifests and their sub-manifests before upload"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    /// Retrieval config file (defaults to ~/.config/stockpile/retrieve.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Verify a manifest and every sub-manifest it declares.
    Verify {
        /// Manifest location, as `path=<file-or-url>` or a bare file path or URL.
        path: String,
        /// HTTP timeout in seconds (overrides config file).
        #[arg(long)]
        timeout: Option<u64>,
        /// Bearer token for HTTP retrieval (overrides config file).
        #[arg(long)]
        token: Option<String>,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("STOCKPILE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Verify {
            path,
            timeout,
            token,
        } => load_config(cli.config.as_deref(), timeout, token.as_deref())
            .and_then(|config| commands::verify::run(&config, &path, json_output)),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn load_config(
    path: Option<&std::path::Path>,
    timeout: Option<u64>,
    token: Option<&str>,
) -> Result<RetrieveConfig, String> {
    let mut config = match path {
        Some(p) => RetrieveConfig::load(p),
        None => RetrieveConfig::load_default(),
    }
    .map_err(|e| e.to_string())?;

    if let Some(secs) = timeout {
        config = config.with_timeout(secs);
    }
    if let Some(token) = token {
        config = config.with_token(token);
    }
    Ok(config)
}
