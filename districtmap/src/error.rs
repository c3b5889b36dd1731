use std::io;

/// A convenience [`Result`] for the districtmap server.
pub type DistrictMapResult<T> = Result<T, DistrictMapError>;

#[derive(thiserror::Error, Debug)]
pub enum DistrictMapError {
    #[error("Unable to bind to {1}: {0}")]
    BindingError(#[source] io::Error, String),

    #[error(transparent)]
    CoreError(#[from] districtmap_core::tiles::CoreError),

    #[error(transparent)]
    PostgresError(#[from] districtmap_core::tiles::postgres::PostgresError),

    #[error(transparent)]
    ConfigFileError(#[from] crate::config::ConfigFileError),

    #[error(transparent)]
    WebError(#[from] actix_web::Error),

    #[error(transparent)]
    IoError(#[from] io::Error),
}
