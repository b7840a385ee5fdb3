mod config;
mod error;
mod paths;
mod session;

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use simplelog::{Config, LevelFilter, WriteLogger};

use crate::config::DemoConfig;
use crate::error::AppError;

const LOG_ENV: &str = "TABLESYNC_LOG";

fn log_level() -> LevelFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(LevelFilter::Debug)
}

/// Creates the log file, and its directory if needed.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| {
            io::Error::new(e.kind(), format!("failed to create {}: {}", dir.display(), e))
        })?;
    }
    File::create(path)
        .map_err(|e| io::Error::new(e.kind(), format!("failed to create {}: {}", path.display(), e)))
}

fn init_logging() {
    let Some(path) = paths::log_file() else {
        eprintln!("Warning: no cache directory, logging disabled");
        return;
    };

    match open_log_file(&path) {
        Ok(file) => {
            if let Err(e) = WriteLogger::init(log_level(), Config::default(), file) {
                eprintln!("Warning: failed to initialize logger: {}", e);
            }
        }
        Err(e) => eprintln!("Warning: {}, logging disabled", e),
    }
}

async fn run() -> Result<(), AppError> {
    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let config = DemoConfig::load(explicit.as_deref())?;
    log::info!("starting demo session at {}", config.start_url);

    let reports = session::run(config).await?;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_directory() {
        let dir = std::env::temp_dir().join(format!("tablesync-log-{}", std::process::id()));
        let path = dir.join("nested").join("latest.log");

        assert!(open_log_file(&path).is_ok());
        assert!(path.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_open_log_file_reports_unusable_directory() {
        let blocker =
            std::env::temp_dir().join(format!("tablesync-log-blocker-{}", std::process::id()));
        fs::write(&blocker, "not a directory").unwrap();

        let err = open_log_file(&blocker.join("latest.log")).unwrap_err();
        fs::remove_file(&blocker).unwrap();

        assert!(err.to_string().starts_with("failed to create"));
        assert!(err.to_string().contains("tablesync-log-blocker"));
    }
}
