use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;

use telecam::infrastructure::adapters::TelegramAdapter;
use telecam::infrastructure::camera::ProcessCamera;
use telecam::infrastructure::logging;
use telecam::BotConfig;

#[derive(Parser)]
#[command(name = "telecam")]
#[command(about = "Telegram camera interface", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long, env = "TELECAM_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Bot token (overrides config)
    #[arg(short, long, global = true)]
    token: Option<String>,

    /// Authorized user id, may be repeated
    #[arg(short = 'u', long = "authorized-user", global = true)]
    authorized_users: Vec<i64>,

    /// Append logs to this file instead of stdout
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default)
    Run,
    /// Show version
    Version,
    /// Generate a config file
    InitConfig {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    if let Err(e) = logging::init(cli.log_file.as_deref()) {
        eprintln!("Failed to open log file: {}", e);
        return ExitCode::FAILURE;
    }

    match cli.command {
        None | Some(Commands::Run) => run_bot(cli.config, cli.token, cli.authorized_users),
        Some(Commands::Version) => {
            println!("telecam v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Some(Commands::InitConfig { output }) => init_config(output),
    }
}

fn run_bot(config_path: Option<PathBuf>, token: Option<String>, authorized_users: Vec<i64>) -> ExitCode {
    let config = match BotConfig::resolve(config_path.as_deref(), token, &authorized_users) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Starting telecam ({} authorized users)", config.authorized_users.len());

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = rt.block_on(async {
        let (tx, interrupts) = watch::channel(0);
        tokio::spawn(forward_signals(tx));

        let bot = Arc::new(TelegramAdapter::new(config.token.clone(), config.polling.clone()));
        let camera = Box::new(ProcessCamera::new(config.camera.clone()));
        telecam::serve(&config, bot, camera, interrupts).await
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Count Ctrl-C and SIGTERM deliveries into `tx`
async fn forward_signals(tx: watch::Sender<u32>) {
    #[cfg(unix)]
    let mut terminate = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(signal) => Some(signal),
        Err(e) => {
            tracing::error!("Failed to listen for SIGTERM: {}", e);
            None
        }
    };

    loop {
        #[cfg(unix)]
        let term = async {
            let received = match terminate.as_mut() {
                Some(signal) => signal.recv().await,
                None => None,
            };
            if received.is_none() {
                std::future::pending::<()>().await;
            }
        };
        #[cfg(not(unix))]
        let term = std::future::pending::<()>();

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
            }
            _ = term => {}
        }

        tx.send_modify(|received| *received += 1);
        if *tx.borrow() == 1 {
            tracing::info!("Interrupt received, shutting down (interrupt again to abort running commands)");
        }
    }
}

fn init_config(output: Option<PathBuf>) -> ExitCode {
    let json = match serde_json::to_string_pretty(&BotConfig::template()) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Failed to render config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match output {
        Some(path) => {
            if path.exists() {
                eprintln!("{} already exists, not overwriting", path.display());
                return ExitCode::FAILURE;
            }
            if let Err(e) = std::fs::write(&path, json + "\n") {
                eprintln!("Failed to write {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
            println!("Wrote {}. Set the token and authorized_users, then run with --config.", path.display());
        }
        None => {
            println!("{}", json);
            println!("\nSave this to {} and adjust as needed.", BotConfig::default_path().display());
        }
    }
    ExitCode::SUCCESS
}
