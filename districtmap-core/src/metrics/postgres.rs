use async_trait::async_trait;
use log::debug;
use postgres_protocol::escape::escape_identifier;

use crate::metrics::{BoxedMetricsSource, FiscalYear, Metric, MetricsSource, QuantileBreaks};
use crate::tiles::CoreResult;
use crate::tiles::postgres::PostgresError::QuantileError;
use crate::tiles::postgres::PostgresPool;

/// Metrics source delegating quantile computation to the database's
/// `percentile_cont` aggregate.
#[derive(Clone, Debug)]
pub struct PostgresMetrics {
    schema: String,
    table: String,
    pool: PostgresPool,
}

/// Assembles the quantile query for one metric column.
///
/// The column comes from the closed [`Metric`] mapping and the view name from
/// configuration; both are escaped. The state restriction, when present, is
/// the only request-derived value and is bound as `$1`.
fn quantile_query(schema: &str, table: &str, column: &str, has_state: bool) -> String {
    let schema = escape_identifier(schema);
    let table = escape_identifier(table);
    let column = escape_identifier(column);
    let state_clause = if has_state {
        format!("\nWHERE {} = $1::text", escape_identifier("state"))
    } else {
        String::new()
    };
    format!(
        "SELECT percentile_cont(ARRAY[0.2, 0.4, 0.6, 0.8]) WITHIN GROUP (ORDER BY {column}) AS breaks\nFROM {schema}.{table}{state_clause}"
    )
}

impl PostgresMetrics {
    /// Creates a source reading from `schema.table`.
    #[must_use]
    pub fn new(schema: String, table: String, pool: PostgresPool) -> Self {
        Self {
            schema,
            table,
            pool,
        }
    }
}

#[async_trait]
impl MetricsSource for PostgresMetrics {
    async fn quantile_breaks(
        &self,
        metric: Metric,
        fy: FiscalYear,
        state: Option<&str>,
    ) -> CoreResult<QuantileBreaks> {
        let conn = self.pool.get().await?;
        let sql = quantile_query(
            &self.schema,
            &self.table,
            metric.column(fy),
            state.is_some(),
        );

        debug!("SQL: {sql} [{metric:?}, {fy:?}, {state:?}]");
        let row = if let Some(state) = state {
            conn.query_one(&sql, &[&state]).await
        } else {
            conn.query_one(&sql, &[]).await
        };

        // percentile_cont over an empty selection yields NULL
        let breaks: Option<QuantileBreaks> = row.map(|r| r.get("breaks")).map_err(|e| {
            QuantileError(
                e,
                self.pool.get_id().to_string(),
                format!("{metric:?}/{fy:?}"),
            )
        })?;

        Ok(breaks.unwrap_or_default())
    }

    fn clone_source(&self) -> BoxedMetricsSource {
        Box::new(self.clone())
    }
}
