// Runtime configuration shared by the API and CLI binaries

use crate::types::RunPolicy;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub compiler: String,
    pub compiler_flags: Vec<String>,
    pub compile_timeout_ms: u64,
    pub time_limit_ms: u64,
    pub instrument: bool,
    pub instrument_grace_ms: u64,
    pub workspace_dir: PathBuf,
    pub fixtures_dir: PathBuf,
    pub questions_dir: PathBuf,
    pub misuse_log: PathBuf,
    pub suite_policy: RunPolicy,
    pub max_parallel_jobs: usize,
    pub execute_output_limit: usize,
    pub validate_output_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            compiler: "g++".to_string(),
            compiler_flags: vec!["-O2".to_string()],
            compile_timeout_ms: 30_000,
            time_limit_ms: 1000,
            instrument: false,
            instrument_grace_ms: 500,
            workspace_dir: std::env::temp_dir().join("gauntlet"),
            fixtures_dir: PathBuf::from("test_cases"),
            questions_dir: PathBuf::from("questions"),
            misuse_log: PathBuf::from("cheaters.txt"),
            suite_policy: RunPolicy::FailFast,
            max_parallel_jobs: 8,
            execute_output_limit: 200,
            validate_output_limit: 500,
        }
    }
}

impl Config {
    /// Load from process environment, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("GAUNTLET_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(port) = lookup("PORT") {
            let port: u16 = parse("PORT", &port)?;
            let host = config
                .bind_addr
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            config.bind_addr = format!("{}:{}", host, port);
        }
        if let Some(compiler) = lookup("GAUNTLET_COMPILER") {
            config.compiler = compiler;
        }
        if let Some(flags) = lookup("GAUNTLET_COMPILER_FLAGS") {
            config.compiler_flags = flags.split_whitespace().map(str::to_string).collect();
        }
        if let Some(v) = lookup("GAUNTLET_COMPILE_TIMEOUT_MS") {
            config.compile_timeout_ms = parse_positive("GAUNTLET_COMPILE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("GAUNTLET_TIME_LIMIT_MS") {
            config.time_limit_ms = parse_positive("GAUNTLET_TIME_LIMIT_MS", &v)?;
        }
        if let Some(v) = lookup("GAUNTLET_INSTRUMENT") {
            config.instrument = parse_bool("GAUNTLET_INSTRUMENT", &v)?;
        }
        if let Some(v) = lookup("GAUNTLET_INSTRUMENT_GRACE_MS") {
            config.instrument_grace_ms = parse("GAUNTLET_INSTRUMENT_GRACE_MS", &v)?;
        }
        if let Some(v) = lookup("GAUNTLET_WORKSPACE_DIR") {
            config.workspace_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("GAUNTLET_FIXTURES_DIR") {
            config.fixtures_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("GAUNTLET_QUESTIONS_DIR") {
            config.questions_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("GAUNTLET_MISUSE_LOG") {
            config.misuse_log = PathBuf::from(v);
        }
        if let Some(v) = lookup("GAUNTLET_SUITE_POLICY") {
            config.suite_policy = v.parse().map_err(|reason| ConfigError::Invalid {
                key: "GAUNTLET_SUITE_POLICY",
                value: v.clone(),
                reason,
            })?;
        }
        if let Some(v) = lookup("GAUNTLET_MAX_PARALLEL_JOBS") {
            config.max_parallel_jobs = parse_positive("GAUNTLET_MAX_PARALLEL_JOBS", &v)?;
        }
        if let Some(v) = lookup("GAUNTLET_EXECUTE_OUTPUT_LIMIT") {
            config.execute_output_limit = parse("GAUNTLET_EXECUTE_OUTPUT_LIMIT", &v)?;
        }
        if let Some(v) = lookup("GAUNTLET_VALIDATE_OUTPUT_LIMIT") {
            config.validate_output_limit = parse("GAUNTLET_VALIDATE_OUTPUT_LIMIT", &v)?;
        }

        Ok(config)
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_millis(self.compile_timeout_ms)
    }

    pub fn instrument_grace(&self) -> Duration {
        Duration::from_millis(self.instrument_grace_ms)
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_positive<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let parsed: T = parse(key, value)?;
    if parsed == T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
