use deadpool_postgres::tokio_postgres::Error as TokioPgError;
use deadpool_postgres::{BuildError, PoolError};
use semver::Version;

use crate::tiles::TileCoord;

/// A convenience [`Result`] for `PostGIS`-backed sources.
pub type PostgresResult<T> = Result<T, PostgresError>;

/// Errors from the `PostGIS` pool and sources.
#[derive(thiserror::Error, Debug)]
pub enum PostgresError {
    /// A query failed outside of tile or quantile production.
    #[error("Postgres error while {1}: {0}")]
    PostgresError(#[source] TokioPgError, &'static str),

    /// The connection pool could not be built.
    #[error("Unable to build a Postgres connection pool {1}: {0}")]
    PoolBuildError(#[source] BuildError, String),

    /// No connection could be acquired from the pool.
    #[error("Unable to get a Postgres connection from the pool {1}: {0}")]
    PoolConnError(#[source] PoolError, String),

    /// The connection string did not parse.
    #[error("Unable to parse connection string {1}: {0}")]
    BadConnectionString(#[source] TokioPgError, String),

    /// The reported `PostGIS` version did not parse.
    #[error("Unable to parse PostGIS version {1}: {0}")]
    BadPostgisVersion(#[source] semver::Error, String),

    /// The reported `PostgreSQL` version did not parse.
    #[error("Unable to parse PostgreSQL version {1}: {0}")]
    BadPostgresVersion(#[source] semver::Error, String),

    /// The connected `PostGIS` lacks the primitives this server relies on.
    #[error("PostGIS version {0} is too old, minimum required is {1}")]
    PostgisTooOld(Version, Version),

    /// The connected `PostgreSQL` is older than the supported minimum.
    #[error("PostgreSQL version {0} is too old, minimum required is {1}")]
    PostgresqlTooOld(Version, Version),

    /// The tile query failed to prepare.
    #[error("Error preparing a tile query for source {1}: {2} {0}")]
    PrepareQueryError(#[source] TokioPgError, String, String),

    /// The tile query failed to execute.
    #[error("Unable to get tile {2} from {1}: {0}")]
    GetTileError(#[source] TokioPgError, String, TileCoord),

    /// The quantile query failed to execute.
    #[error("Unable to compute {2} quantile breaks from {1}: {0}")]
    QuantileError(#[source] TokioPgError, String, String),
}
