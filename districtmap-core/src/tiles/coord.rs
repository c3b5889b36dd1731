use std::fmt;

/// Raw tile bytes as produced by the spatial engine (MVT).
pub type TileData = Vec<u8>;

/// Address of one tile in the slippy-map tiling scheme.
///
/// Constructed per request and discarded after the response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level
    pub z: u8,
    /// Column
    pub x: u32,
    /// Row
    pub y: u32,
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
