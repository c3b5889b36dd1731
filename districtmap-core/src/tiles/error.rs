/// Errors that can occur while producing tiles or metric quantiles.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    /// Errors from the `PostGIS`-backed sources.
    #[error(transparent)]
    PostgresError(#[from] super::postgres::PostgresError),
}

/// A convenience [`Result`] for `districtmap-core`.
pub type CoreResult<T> = Result<T, CoreError>;
