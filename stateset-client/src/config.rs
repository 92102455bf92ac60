use std::fs::canonicalize;
use std::path::PathBuf;
use std::time::Duration;

use ::config::{Config as Cfg, Environment, File, FileFormat, FileSourceFile};
use cosmrs::tendermint::chain;
use error_stack::{ensure, Result, ResultExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::logging::LogFormat;
use crate::tx::DEFAULT_GAS;

/// Environment variables with this prefix override file settings, e.g. `STATESET_API_COSMOS`.
pub const ENV_PREFIX: &str = "STATESET";

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to load config")]
    LoadConfig,
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct Config {
    /// REST gateway queried by the store.
    pub api_cosmos: Url,
    /// Tendermint RPC polled for new blocks.
    pub api_tendermint: Url,
    /// gRPC endpoint used for account lookups and broadcasts.
    pub grpc: Url,
    pub chain_id: chain::Id,
    pub address_prefix: String,
    pub fee_denom: String,
    pub default_gas: u64,
    #[serde(with = "humantime_serde")]
    pub block_poll_interval: Duration,
    pub block_stream_buffer: usize,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_cosmos: "http://localhost:1317".parse().unwrap(),
            api_tendermint: "http://localhost:26657".parse().unwrap(),
            grpc: "http://localhost:9090".parse().unwrap(),
            chain_id: "stateset".parse().unwrap(),
            address_prefix: "stateset".to_string(),
            fee_denom: "state".to_string(),
            default_gas: DEFAULT_GAS,
            block_poll_interval: Duration::from_secs(1),
            block_stream_buffer: 100,
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Merges the given files that exist, in order, then applies environment overrides.
    pub fn load(paths: &[PathBuf]) -> Result<Self, Error> {
        let files = find_config_files(paths);

        let cfg: Self = Cfg::builder()
            .add_source(files)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .and_then(Cfg::try_deserialize)
            .change_context(Error::LoadConfig)?;
        cfg.validate()?;

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), Error> {
        ensure!(
            self.block_stream_buffer > 0,
            Error::Zero {
                field: "block_stream_buffer"
            }
        );
        ensure!(
            !self.block_poll_interval.is_zero(),
            Error::Zero {
                field: "block_poll_interval"
            }
        );

        Ok(())
    }
}

fn find_config_files(paths: &[PathBuf]) -> Vec<File<FileSourceFile, FileFormat>> {
    let files = paths
        .iter()
        .map(canonicalize)
        .filter_map(std::result::Result::ok)
        .inspect(|path| info!("found config file {}", path.to_string_lossy()))
        .map(File::from)
        .collect::<Vec<_>>();

    if files.is_empty() {
        info!("found no config files to load");
    }

    files
}
