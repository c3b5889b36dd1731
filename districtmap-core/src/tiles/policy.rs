//! Per-request rendering decisions derived from the zoom level.

/// Simplification tolerance (degrees) below [`MEDIUM_DETAIL_ZOOM`].
const COARSE_TOLERANCE: f64 = 0.01;
/// Simplification tolerance (degrees) between [`MEDIUM_DETAIL_ZOOM`] and [`FULL_DETAIL_ZOOM`].
const MEDIUM_TOLERANCE: f64 = 0.005;
/// Simplification tolerance (degrees) at [`FULL_DETAIL_ZOOM`] and above.
const FINE_TOLERANCE: f64 = 0.001;

const MEDIUM_DETAIL_ZOOM: u8 = 5;
const FULL_DETAIL_ZOOM: u8 = 7;

/// Zoom level at which every district becomes visible regardless of vendor signal.
const NATIONAL_VIEW_MAX_ZOOM: u8 = 6;

/// Rendering decisions for one tile request.
///
/// Derived once per request from `(zoom, filter presence)` and passed
/// unchanged to the query builder and the response cache policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomPolicy {
    /// Maximum allowed deviation (degrees) when reducing geometry vertex count.
    /// Higher zoom covers less ground per tile and needs less simplification.
    pub simplify_tolerance: f64,
    /// At low zoom without a state filter, rendering every district would be
    /// visually noisy and expensive; restrict to districts with vendor signal.
    pub is_national_view: bool,
}

impl ZoomPolicy {
    /// Derives the policy for one request.
    #[must_use]
    pub fn for_request(zoom: u8, has_state_filter: bool) -> Self {
        let simplify_tolerance = if zoom < MEDIUM_DETAIL_ZOOM {
            COARSE_TOLERANCE
        } else if zoom < FULL_DETAIL_ZOOM {
            MEDIUM_TOLERANCE
        } else {
            FINE_TOLERANCE
        };
        Self {
            simplify_tolerance,
            is_national_view: zoom < NATIONAL_VIEW_MAX_ZOOM && !has_state_filter,
        }
    }
}
