use clap::{Parser, Subcommand};
use petoi_serial::channel::{bring_up, DeviceChannel};
use petoi_serial::runner::{load_scenarios, AutomateRunner, RunnerError, TrainingSession};
use petoi_serial::utils::{init_logging, ConfigurationManager, DEFAULT_CONFIG_FILE};
use petoi_serial::{SerialPortTransport, ThreadSleeper};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

/// Drive a Petoi robot over its serial port
#[derive(Parser, Debug)]
#[command(name = "petoi", version, about)]
struct Args {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial port, overrides the configured one
    #[arg(short, long, global = true)]
    port: Option<String>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Mode {
    /// Perform randomly picked action scenarios with idle time in between
    Automate,
    /// Queue commands interactively and send them on `run`
    Training,
}

fn load_config(args: &Args) -> Result<ConfigurationManager, RunnerError> {
    let mut manager = match &args.config {
        Some(path) => ConfigurationManager::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            ConfigurationManager::from_file(DEFAULT_CONFIG_FILE)?
        }
        None => ConfigurationManager::new(),
    };

    if let Some(port) = &args.port {
        manager.set_port(port.clone());
    }

    Ok(manager)
}

fn connect(
    manager: &ConfigurationManager,
) -> Result<DeviceChannel<SerialPortTransport, ThreadSleeper>, RunnerError> {
    let petoi = &manager.config().petoi;
    let port = petoi.port.as_deref().ok_or(RunnerError::NoPort)?;

    let channel = DeviceChannel::connect(port, petoi.link.clone(), petoi.channel.clone())?;
    bring_up(channel, petoi.open_attempts, petoi.retry_interval())?.ok_or(RunnerError::BoardNotReady)
}

fn run(args: Args) -> Result<(), RunnerError> {
    let manager = load_config(&args)?;
    let config = manager.config();

    if let Err(e) = init_logging(&config.logging.level) {
        eprintln!("Logging is unavailable: {}", e);
    }

    // Loading ran before the subscriber existed
    match manager.config_file_path() {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => warn!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE),
    }

    match args.mode {
        Mode::Automate => {
            let scenarios = load_scenarios(&config.automate.scenario_path)?;
            let mut channel = connect(&manager)?;
            let mut runner = AutomateRunner::new(config.automate.clone(), scenarios);
            let performed = runner.run(&mut channel)?;
            info!("Performed {} scenarios: {}", performed.len(), performed.join(", "));
        }
        Mode::Training => {
            let mut channel = connect(&manager)?;
            let mut session = TrainingSession::new(config.training.max_inputs);
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            session.run(&mut channel, stdin.lock(), &mut stdout)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petoi_serial::utils::ConfigError;
    use std::io::Write;

    #[test]
    fn test_explicit_config_and_port_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"petoi": {{"port": "/dev/ttyUSB0", "channel": {{"min_command_secs": 2}}}}}}"#).unwrap();
        let config_path = file.path().to_str().unwrap();

        let args = Args::parse_from(["petoi", "--config", config_path, "--port", "/dev/ttyACM0", "training"]);
        let manager = load_config(&args).unwrap();

        assert_eq!(manager.config_file_path(), Some(file.path()));
        assert_eq!(manager.config().petoi.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(manager.config().petoi.channel.min_command_secs, 2);
    }

    #[test]
    fn test_named_config_must_exist() {
        let args = Args::parse_from(["petoi", "automate", "--config", "/nonexistent/settings.json"]);
        assert!(matches!(
            load_config(&args),
            Err(RunnerError::Config(ConfigError::IoError { .. }))
        ));
    }

    #[test]
    fn test_connect_without_port() {
        let manager = ConfigurationManager::new();
        assert!(matches!(connect(&manager), Err(RunnerError::NoPort)));
    }
}
