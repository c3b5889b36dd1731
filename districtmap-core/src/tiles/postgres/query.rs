//! Tile query assembly for the district map features view.

use postgres_protocol::escape::{escape_identifier, escape_literal};

use crate::tiles::ZoomPolicy;

/// Layer name under which district features are grouped in the encoded tile.
pub const DISTRICT_LAYER: &str = "districts";

/// MVT encoding parameters. Standard values for broad renderer compatibility.
const TILE_EXTENT: u32 = 4096;
const TILE_BUFFER: u32 = 64;
const CLIP_GEOM: bool = true;

/// SRID of the stored district geometries.
const GEOMETRY_SRID: i32 = 4326;
const GEOMETRY_COLUMN: &str = "geom";

/// Per-feature attributes carried into the encoded tile, in addition to the
/// geometry: identifier, display fields, sales assignment, and the four
/// vendor category labels.
const FEATURE_COLUMNS: &[&str] = &[
    "district_id",
    "name",
    "state",
    "owner",
    "plan_ids",
    "vendor_math",
    "vendor_ela",
    "vendor_science",
    "vendor_intervention",
];

/// A feature with all four of these unset carries no sales signal and is
/// hidden from the national view.
const VENDOR_CATEGORY_COLUMNS: &[&str] = &[
    "vendor_math",
    "vendor_ela",
    "vendor_science",
    "vendor_intervention",
];

/// One assembled tile query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileQuery {
    /// The SQL text. `$1..$3` are z/x/y, `$4` the simplification tolerance,
    /// and `$5` the state abbreviation when [`Self::has_state_param`] is set.
    pub sql: String,
    /// Whether the query expects the state abbreviation as `$5`.
    pub has_state_param: bool,
}

/// Composes the spatial-engine query for one tile request.
///
/// The statement selects district features intersecting the tile envelope,
/// simplifies them by the policy tolerance, reprojects to web mercator, and
/// encodes the result as a single MVT payload under the
/// [`DISTRICT_LAYER`] layer.
///
/// Predicates are assembled as discrete clauses joined with `AND`. Every
/// request-derived value is a bound parameter; only the configured view name
/// is spliced into the text, and only after identifier escaping.
#[must_use]
pub fn build_tile_query(
    schema: &str,
    table: &str,
    policy: &ZoomPolicy,
    has_state_filter: bool,
    supports_tile_margin: bool,
) -> TileQuery {
    let bbox_search = if supports_tile_margin {
        let margin = f64::from(TILE_BUFFER) / f64::from(TILE_EXTENT);
        format!("ST_TileEnvelope($1::integer, $2::integer, $3::integer, margin => {margin})")
    } else {
        "ST_TileEnvelope($1::integer, $2::integer, $3::integer)".to_string()
    };

    let geometry_column = escape_identifier(GEOMETRY_COLUMN);
    let mut predicates = vec![format!(
        "{geometry_column} && ST_Transform({bbox_search}, {GEOMETRY_SRID})"
    )];
    if has_state_filter {
        predicates.push(format!("{} = $5::text", escape_identifier("state")));
    }
    if policy.is_national_view {
        let signal = VENDOR_CATEGORY_COLUMNS
            .iter()
            .map(|c| format!("{} IS NOT NULL", escape_identifier(c)))
            .collect::<Vec<_>>()
            .join(" OR ");
        predicates.push(format!("({signal})"));
    }
    let where_clause = predicates.join("\n    AND ");

    let properties = FEATURE_COLUMNS
        .iter()
        .map(|c| format!(", {}", escape_identifier(c)))
        .collect::<String>();

    let layer = escape_literal(DISTRICT_LAYER);
    let schema = escape_identifier(schema);
    let table = escape_identifier(table);
    let sql = format!(
        r"
SELECT
  ST_AsMVT(tile, {layer}, {TILE_EXTENT}, 'geom')
FROM (
  SELECT
    ST_AsMVTGeom(
        ST_Transform(ST_Simplify({geometry_column}::geometry, $4::double precision), 3857),
        ST_TileEnvelope($1::integer, $2::integer, $3::integer),
        {TILE_EXTENT}, {TILE_BUFFER}, {CLIP_GEOM}
    ) AS geom
    {properties}
  FROM
    {schema}.{table}
  WHERE
    {where_clause}
) AS tile;
"
    )
    .trim()
    .to_string();

    TileQuery {
        sql,
        has_state_param: has_state_filter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(zoom: u8, state: bool) -> TileQuery {
        let policy = ZoomPolicy::for_request(zoom, state);
        build_tile_query("public", "district_map_features", &policy, state, true)
    }

    #[test]
    fn national_view_restricts_to_vendor_signal() {
        let q = query(3, false);
        assert!(!q.has_state_param);
        assert!(q.sql.contains(r#""vendor_math" IS NOT NULL"#));
        assert!(q.sql.contains(r#""vendor_intervention" IS NOT NULL"#));
        assert!(!q.sql.contains("$5"));
    }

    #[test]
    fn state_filter_binds_a_parameter() {
        let q = query(10, true);
        assert!(q.has_state_param);
        assert!(q.sql.contains(r#""state" = $5::text"#));
        // high zoom with a filter is never the national view
        assert!(!q.sql.contains("IS NOT NULL"));
    }

    #[test]
    fn plain_mid_zoom_query_has_only_the_envelope_predicate() {
        let q = query(6, false);
        assert!(!q.has_state_param);
        assert!(!q.sql.contains("$5"));
        assert!(!q.sql.contains("IS NOT NULL"));
        assert_eq!(q.sql.matches("AND").count(), 0);
    }

    #[test]
    fn envelope_margin_follows_pool_capability() {
        let policy = ZoomPolicy::for_request(3, false);
        let with = build_tile_query("public", "district_map_features", &policy, false, true);
        let without = build_tile_query("public", "district_map_features", &policy, false, false);
        assert!(with.sql.contains("margin =>"));
        assert!(!without.sql.contains("margin =>"));
    }

    #[test]
    fn encoding_parameters_are_fixed() {
        let q = query(8, false);
        assert!(q.sql.contains("ST_AsMVT(tile, 'districts', 4096, 'geom')"));
        assert!(q.sql.contains("4096, 64, true"));
        assert!(q.sql.contains("ST_Simplify(\"geom\"::geometry, $4::double precision)"));
        assert!(q.sql.contains("ST_Transform"));
    }

    #[test]
    fn identifiers_are_escaped() {
        let policy = ZoomPolicy::for_request(3, false);
        let q = build_tile_query("pub\"lic", "bad\"table", &policy, false, true);
        assert!(q.sql.contains(r#""pub""lic"."bad""table""#));
    }
}
