use std::fmt::Debug;

use async_trait::async_trait;
use tilejson::TileJSON;

use crate::tiles::{CoreResult, TileCoord, TileData, ZoomPolicy};

/// Optional narrowing of a tile request to a single state.
///
/// The abbreviation is deliberately not validated against a list of known
/// states; it only ever travels as a bound query parameter, and an unknown
/// value simply produces an empty tile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileFilter {
    /// Two-letter state abbreviation, e.g. `TX`. `None` means no restriction.
    pub state: Option<String>,
}

impl TileFilter {
    /// Creates a filter from an optional state abbreviation.
    #[must_use]
    pub fn by_state(state: Option<String>) -> Self {
        Self { state }
    }

    /// Whether any narrowing is in effect.
    #[must_use]
    pub fn has_state(&self) -> bool {
        self.state.is_some()
    }
}

/// Core trait for district tile sources.
///
/// Implementors delegate tile production to a spatial engine offering
/// envelope computation, intersection, simplification, reprojection, and MVT
/// encoding. Any engine with those five primitives can stand behind this
/// trait.
#[async_trait]
pub trait Source: Send + Sync + Debug {
    /// Unique source identifier used in URLs and logs.
    fn get_id(&self) -> &str;

    /// `TileJSON` specification served to map clients.
    fn get_tilejson(&self) -> &TileJSON;

    /// Creates a boxed clone for trait object storage.
    fn clone_source(&self) -> BoxedSource;

    /// Produces the encoded tile for the given coordinates.
    ///
    /// `policy` is derived exactly once per request by the caller; the source
    /// must not recompute it. An empty result is not an error and is returned
    /// as empty bytes.
    async fn get_tile(
        &self,
        xyz: TileCoord,
        filter: &TileFilter,
        policy: &ZoomPolicy,
    ) -> CoreResult<TileData>;
}

/// Boxed tile source trait object for storage in collections.
pub type BoxedSource = Box<dyn Source>;

impl Clone for BoxedSource {
    fn clone(&self) -> Self {
        self.clone_source()
    }
}
