//! Environment-sourced pipeline configuration.
//!
//! All settings are optional except the completion-provider credential,
//! whose absence is a fatal startup error. The entry point loads `.env`
//! via `dotenvy` before calling [`PipelineConfig::from_env`].

use std::env;

use crate::{Error, Result};

const DEFAULT_SERVICE_NAME: &str = "qa-pipeline";
const DEFAULT_TRACE_PORT: u16 = 4317;
const DEFAULT_CONTEXT_FILE: &str = "data/context.txt";
const DEFAULT_LOG_FILE: &str = "logs/pipeline_run.log";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Process-wide configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Completion-provider API credential. Mandatory.
    pub api_key: String,
    /// Service name reported to the trace backend.
    pub service_name: String,
    /// Explicit trace-backend host, if configured. When absent the
    /// telemetry layer probes a sequence of default hostnames.
    pub trace_host: Option<String>,
    /// Trace-backend port.
    pub trace_port: u16,
    /// Path of the context file the retrieve step loads.
    pub context_file: String,
    /// Path of the append-only step log.
    pub log_file: String,
    /// Model identifier passed to the completion provider.
    pub model: String,
}

impl PipelineConfig {
    /// Resolve configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `OPENAI_API_KEY` is unset or empty, or
    /// if `PIPELINE_TRACE_PORT` is set but not a valid port number.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "OPENAI_API_KEY is required but was not found; set it in the environment or .env file"
                        .to_string(),
                )
            })?;

        let trace_port = match env::var("PIPELINE_TRACE_PORT") {
            Ok(raw) => raw.trim().parse::<u16>().map_err(|_| {
                Error::Config(format!("PIPELINE_TRACE_PORT is not a valid port: '{raw}'"))
            })?,
            Err(_) => DEFAULT_TRACE_PORT,
        };

        Ok(Self {
            api_key,
            service_name: env_or("PIPELINE_SERVICE_NAME", DEFAULT_SERVICE_NAME),
            trace_host: env::var("PIPELINE_TRACE_HOST")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            trace_port,
            context_file: env_or("PIPELINE_CONTEXT_FILE", DEFAULT_CONTEXT_FILE),
            log_file: env_or("PIPELINE_LOG_FILE", DEFAULT_LOG_FILE),
            model: env_or("PIPELINE_MODEL", DEFAULT_MODEL),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    // These tests mutate the shared process environment, so they hold a
    // lock to keep the parallel test harness from interleaving them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_missing_credential_is_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        let saved = env::var("OPENAI_API_KEY").ok();
        env::remove_var("OPENAI_API_KEY");

        let err = PipelineConfig::from_env().unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        if let Some(value) = saved {
            env::set_var("OPENAI_API_KEY", value);
        }
    }

    #[test]
    fn test_defaults_applied() {
        let _guard = ENV_LOCK.lock().unwrap();
        let saved = env::var("OPENAI_API_KEY").ok();
        env::set_var("OPENAI_API_KEY", "sk-test");
        env::remove_var("PIPELINE_SERVICE_NAME");
        env::remove_var("PIPELINE_TRACE_PORT");
        env::remove_var("PIPELINE_TRACE_HOST");
        env::remove_var("PIPELINE_MODEL");

        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.service_name, DEFAULT_SERVICE_NAME);
        assert_eq!(config.trace_port, DEFAULT_TRACE_PORT);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.trace_host.is_none());

        match saved {
            Some(value) => env::set_var("OPENAI_API_KEY", value),
            None => env::remove_var("OPENAI_API_KEY"),
        }
    }
}
