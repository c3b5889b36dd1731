use std::fs::File;
use std::io::Read as _;
use std::path::{Path, PathBuf};

use districtmap_core::metrics::{BoxedMetricsSource, PostgresMetrics};
use districtmap_core::tiles::BoxedSource;
use districtmap_core::tiles::postgres::{DistrictSource, PostgresPool};
use serde::{Deserialize, Serialize};
use subst::VariableMap;

use crate::DistrictMapResult;

mod pg;
pub use pg::{POOL_SIZE_DEFAULT, PostgresConfig};

mod srv;
pub use srv::{KEEP_ALIVE_DEFAULT, LISTEN_ADDRESSES_DEFAULT, SrvConfig};

pub type ConfigFileResult<T> = Result<T, ConfigFileError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigFileError {
    #[error("Unable to load config file {1}: {0}")]
    ConfigLoadError(#[source] std::io::Error, PathBuf),

    #[error("Unable to parse config file {1}: {0}")]
    ConfigParseError(#[source] subst::yaml::Error, PathBuf),

    #[error("A postgres connection string must be provided")]
    PostgresConnectionStringMissing,

    #[error("The postgres pool_size must be greater than or equal to 1")]
    PostgresPoolSizeInvalid,
}

/// On-disk and CLI-merged configuration.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(flatten)]
    pub srv: SrvConfig,
    pub postgres: Option<PostgresConfig>,
}

/// Resolved sources shared by all server workers.
#[derive(Clone, Debug)]
pub struct ServerState {
    pub tiles: BoxedSource,
    pub metrics: BoxedMetricsSource,
}

impl Config {
    /// Validates the merged configuration before resolving any connection.
    pub fn finalize(&self) -> ConfigFileResult<()> {
        let Some(postgres) = &self.postgres else {
            return Err(ConfigFileError::PostgresConnectionStringMissing);
        };
        if postgres.connection_string.is_none() {
            return Err(ConfigFileError::PostgresConnectionStringMissing);
        }
        if postgres.pool_size == Some(0) {
            return Err(ConfigFileError::PostgresPoolSizeInvalid);
        }
        Ok(())
    }

    /// Connects the pool and builds the tile and metrics sources.
    pub async fn resolve(&self) -> DistrictMapResult<ServerState> {
        let pg = self
            .postgres
            .as_ref()
            .ok_or(ConfigFileError::PostgresConnectionStringMissing)?;
        let connection_string = pg
            .connection_string
            .as_ref()
            .ok_or(ConfigFileError::PostgresConnectionStringMissing)?;

        let pool =
            PostgresPool::new(connection_string, pg.pool_size.unwrap_or(POOL_SIZE_DEFAULT)).await?;

        let schema = pg.schema.clone().unwrap_or_else(|| "public".to_string());
        let features_table = pg
            .features_table
            .clone()
            .unwrap_or_else(|| "district_map_features".to_string());
        let metrics_table = pg
            .metrics_table
            .clone()
            .unwrap_or_else(|| "district_metrics".to_string());

        let tiles: BoxedSource = Box::new(DistrictSource::new(
            "districts".to_string(),
            schema.clone(),
            features_table,
            pool.clone(),
        ));
        let metrics: BoxedMetricsSource =
            Box::new(PostgresMetrics::new(schema, metrics_table, pool));

        Ok(ServerState { tiles, metrics })
    }
}

/// Read config from a file
pub fn read_config(file_name: &Path) -> ConfigFileResult<Config> {
    let mut file = File::open(file_name)
        .map_err(|e| ConfigFileError::ConfigLoadError(e, file_name.into()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| ConfigFileError::ConfigLoadError(e, file_name.into()))?;
    parse_config(&contents, &subst::Env, file_name)
}

pub fn parse_config<'a, M>(contents: &str, env: &'a M, file_name: &Path) -> ConfigFileResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    subst::yaml::from_str(contents, env)
        .map_err(|e| ConfigFileError::ConfigParseError(e, file_name.into()))
}
