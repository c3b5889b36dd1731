//! Tile management for the districtmap server.
//!
//! This module provides the core abstractions for turning a tile request into
//! an encoded vector tile:
//! - [`TileCoord`] and [`TileFilter`] describe one request,
//! - [`ZoomPolicy`] derives the per-request simplification and filtering
//!   decisions,
//! - [`Source`] is the seam behind which a spatial engine produces the tile;
//!   the [`postgres`] implementation delegates to `PostGIS`.

mod coord;
pub use coord::{TileCoord, TileData};

mod policy;
pub use policy::ZoomPolicy;

mod source;
pub use source::{BoxedSource, Source, TileFilter};

mod error;
pub use error::{CoreError, CoreResult};

/// Implementation of the `PostGIS`-backed [`Source`].
pub mod postgres;
