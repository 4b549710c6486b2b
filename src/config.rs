use std::{env, num::NonZeroUsize, path::PathBuf};

use crate::error::ConfigErr;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SCALER_PATH: &str = "models/scaler.json";
const DEFAULT_MODEL_PATH: &str = "models/ridge.json";

/// Immutable process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    host: String,
    port: u16,
    workers: Option<NonZeroUsize>,
    scaler_path: PathBuf,
    model_path: PathBuf,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// `ConfigErr` if a variable is set to something unusable.
    pub fn from_env() -> Result<Self, ConfigErr> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Reads the configuration through the given variable lookup.
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of a variable, if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigErr>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(value) => value.trim().parse().map_err(|e| ConfigErr::InvalidVar {
                var: "PORT",
                value: value.clone(),
                reason: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let workers = match lookup("WORKERS") {
            Some(value) => Some(value.trim().parse().map_err(|e| ConfigErr::InvalidVar {
                var: "WORKERS",
                value: value.clone(),
                reason: format!("{e}"),
            })?),
            None => None,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            workers,
            scaler_path: lookup("SCALER_PATH")
                .unwrap_or_else(|| DEFAULT_SCALER_PATH.to_string())
                .into(),
            model_path: lookup("MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
                .into(),
        })
    }

    pub fn bind_addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }

    pub fn workers(&self) -> Option<usize> {
        self.workers.map(NonZeroUsize::get)
    }

    pub fn scaler_path(&self) -> &PathBuf {
        &self.scaler_path
    }

    pub fn model_path(&self) -> &PathBuf {
        &self.model_path
    }
}
