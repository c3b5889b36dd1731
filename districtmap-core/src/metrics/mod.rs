//! Per-metric quantile breaks used for choropleth shading of districts.

mod source;
pub use source::{BoxedMetricsSource, FiscalYear, Metric, MetricsSource, QuantileBreaks};

mod postgres;
pub use postgres::PostgresMetrics;
