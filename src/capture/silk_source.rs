use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::config::SourceConfig;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read input '{path}': {source}")]
    Read { path: String, source: io::Error },

    #[error("Failed to run command '{command}': {source}")]
    Command { command: String, source: io::Error },

    #[error("No data available from {0}")]
    NoData(String),
}

/// Producer of raw `timestamp|packets[|bytes]` text.
pub trait DataSource {
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<String, SourceError>;
}

/// Reads tool output from a file, or from stdin when no path is given.
pub struct FileSource {
    path: Option<PathBuf>,
}

impl FileSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        // "-" is the conventional spelling for stdin.
        let path = path.filter(|p| p != Path::new("-"));
        Self { path }
    }

    pub fn stdin() -> Self {
        Self { path: None }
    }
}

impl DataSource for FileSource {
    fn describe(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "stdin".to_string(),
        }
    }

    fn fetch(&self) -> Result<String, SourceError> {
        let content = match &self.path {
            Some(path) => fs::read_to_string(path),
            None => {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer).map(|_| buffer)
            }
        }
        .map_err(|source| SourceError::Read {
            path: self.describe(),
            source,
        })?;

        if content.trim().is_empty() {
            return Err(SourceError::NoData(self.describe()));
        }
        Ok(content)
    }
}

/// Runs the SiLK `rwfilter` pipeline, falling back to `rwuniq` when
/// `rwstats` prints nothing.
pub struct SilkSource {
    primary: String,
    fallback: Option<String>,
}

impl SilkSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            primary: Self::rwstats_command(config),
            fallback: Some(Self::rwuniq_command(config)),
        }
    }

    pub fn from_commands(primary: impl Into<String>, fallback: Option<String>) -> Self {
        Self {
            primary: primary.into(),
            fallback,
        }
    }

    fn rwfilter_command(config: &SourceConfig) -> String {
        format!(
            "rwfilter --start-date={} --end-date={} --sensor={} --type=all --proto={} --pass=stdout",
            config.start_date, config.end_date, config.sensor, config.protocol
        )
    }

    pub fn rwstats_command(config: &SourceConfig) -> String {
        format!(
            "{} | rwstats --fields=stime --values=packets,bytes --count=0 --bin-size={} --delimited='|'",
            Self::rwfilter_command(config),
            config.bin_size
        )
    }

    pub fn rwuniq_command(config: &SourceConfig) -> String {
        format!(
            "{} | rwuniq --fields=sTime --values=packets,bytes --bin-time={} --delimited='|'",
            Self::rwfilter_command(config),
            config.bin_size
        )
    }

    /// Check that the SiLK environment looks usable; returns the warnings.
    pub fn verify_environment() -> Vec<String> {
        let data_root = std::env::var("SILK_DATA_ROOTDIR").ok();
        let config_file = std::env::var("SILK_CONFIG_FILE").ok();
        log::debug!("SILK_DATA_ROOTDIR = {:?}", data_root);
        log::debug!("SILK_CONFIG_FILE = {:?}", config_file);

        let warnings = check_environment(data_root.as_deref(), config_file.as_deref());
        for warning in &warnings {
            log::warn!("{}", warning);
        }
        warnings
    }

    fn run(command: &str) -> Result<String, SourceError> {
        log::debug!("Executing command: {}", command);
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|source| SourceError::Command {
                command: command.to_string(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            log::warn!("Command produced errors: {}", stderr.trim());
        }
        if !output.status.success() {
            log::warn!("Command exited with {}", output.status);
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DataSource for SilkSource {
    fn describe(&self) -> String {
        "SiLK rwfilter".to_string()
    }

    fn fetch(&self) -> Result<String, SourceError> {
        let output = Self::run(&self.primary)?;
        if !output.trim().is_empty() {
            return Ok(output);
        }

        if let Some(fallback) = &self.fallback {
            log::info!("No output produced, trying alternative command");
            let output = Self::run(fallback)?;
            if !output.trim().is_empty() {
                return Ok(output);
            }
        }

        Err(SourceError::NoData(self.describe()))
    }
}

/// Environment problems that would keep the SiLK tools from finding data.
pub fn check_environment(data_root: Option<&str>, config_file: Option<&str>) -> Vec<String> {
    let mut warnings = Vec::new();

    if data_root.is_none() || config_file.is_none() {
        warnings.push("SiLK environment variables not fully set".to_string());
    }
    if let Some(dir) = data_root {
        if !Path::new(dir).exists() {
            warnings.push(format!("SILK_DATA_ROOTDIR {} does not exist", dir));
        }
    }
    if let Some(file) = config_file {
        if !Path::new(file).exists() {
            warnings.push(format!("SILK_CONFIG_FILE {} does not exist", file));
        }
    }

    warnings
}
