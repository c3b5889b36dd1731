use async_trait::async_trait;
use deadpool_postgres::tokio_postgres::types::{ToSql, Type};
use log::debug;
use tilejson::{TileJSON, tilejson};

use crate::tiles::postgres::PostgresError::{GetTileError, PrepareQueryError};
use crate::tiles::postgres::{PostgresPool, build_tile_query};
use crate::tiles::{BoxedSource, CoreResult, Source, TileCoord, TileData, TileFilter, ZoomPolicy};

/// District tile source backed by a `PostGIS` view.
///
/// Holds no per-request state; each [`Source::get_tile`] call acquires a
/// pooled connection for the duration of exactly one query.
#[derive(Clone, Debug)]
pub struct DistrictSource {
    id: String,
    schema: String,
    table: String,
    pool: PostgresPool,
    tilejson: TileJSON,
}

impl DistrictSource {
    /// Creates a source reading from `schema.table`.
    #[must_use]
    pub fn new(id: String, schema: String, table: String, pool: PostgresPool) -> Self {
        let tilejson = tilejson! {
            tiles: vec![],
            name: id.clone(),
            description: format!("District boundaries from {schema}.{table}")
        };
        Self {
            id,
            schema,
            table,
            pool,
            tilejson,
        }
    }
}

#[async_trait]
impl Source for DistrictSource {
    fn get_id(&self) -> &str {
        &self.id
    }

    fn get_tilejson(&self) -> &TileJSON {
        &self.tilejson
    }

    fn clone_source(&self) -> BoxedSource {
        Box::new(self.clone())
    }

    async fn get_tile(
        &self,
        xyz: TileCoord,
        filter: &TileFilter,
        policy: &ZoomPolicy,
    ) -> CoreResult<TileData> {
        let conn = self.pool.get().await?;

        let query = build_tile_query(
            &self.schema,
            &self.table,
            policy,
            filter.has_state(),
            self.pool.supports_tile_margin(),
        );

        let param_types: &[Type] = if query.has_state_param {
            &[
                Type::INT2,
                Type::INT8,
                Type::INT8,
                Type::FLOAT8,
                Type::TEXT,
            ]
        } else {
            &[Type::INT2, Type::INT8, Type::INT8, Type::FLOAT8]
        };

        let prep_query = conn
            .prepare_typed_cached(&query.sql, param_types)
            .await
            .map_err(|e| PrepareQueryError(e, self.id.clone(), query.sql.clone()))?;

        let z = i16::from(xyz.z);
        let x = i64::from(xyz.x);
        let y = i64::from(xyz.y);
        let tolerance = policy.simplify_tolerance;

        debug!("SQL: {} [{xyz}, {filter:?}]", query.sql);
        let tile = if let Some(state) = filter.state.as_deref() {
            let params: &[&(dyn ToSql + Sync)] = &[&z, &x, &y, &tolerance, &state];
            conn.query_opt(&prep_query, params).await
        } else {
            conn.query_opt(&prep_query, &[&z, &x, &y, &tolerance])
                .await
        };

        let tile = tile
            .map(|row| row.and_then(|r| r.get::<_, Option<TileData>>(0)))
            .map_err(|e| GetTileError(e, self.id.clone(), xyz))?
            .unwrap_or_default();

        Ok(tile)
    }
}
