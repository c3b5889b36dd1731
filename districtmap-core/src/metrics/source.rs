use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::tiles::CoreResult;

/// Interior quintile break values (20/40/60/80) for one metric, ascending.
/// Empty when the selection has no rows.
pub type QuantileBreaks = Vec<f64>;

/// District metrics that can be shaded on the map.
///
/// A closed set: the variant, not the request, selects the backing column,
/// which keeps column names out of reach of request input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Student enrollment count.
    Enrollment,
    /// Total district funding.
    Funding,
    /// Funding divided by enrollment.
    PerPupilSpend,
}

/// Fiscal years the planning UI can display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiscalYear {
    /// Fiscal year 2026.
    Fy26,
    /// Fiscal year 2027.
    Fy27,
}

impl Metric {
    /// Column backing this metric for the requested fiscal year.
    ///
    /// fy27 funding figures are not loaded yet; `Funding` and
    /// `PerPupilSpend` still read the fy26 columns for fy27 requests.
    #[must_use]
    pub fn column(self, fy: FiscalYear) -> &'static str {
        match (self, fy) {
            (Self::Enrollment, FiscalYear::Fy26) => "enrollment_fy26",
            (Self::Enrollment, FiscalYear::Fy27) => "enrollment_fy27",
            (Self::Funding, _) => "funding_fy26",
            (Self::PerPupilSpend, _) => "per_pupil_spend_fy26",
        }
    }
}

/// Seam behind which an engine computes per-metric quantile breaks.
#[async_trait]
pub trait MetricsSource: Send + Sync + Debug {
    /// Computes the interior quintile breaks for `metric` in `fy`, optionally
    /// restricted to one state.
    async fn quantile_breaks(
        &self,
        metric: Metric,
        fy: FiscalYear,
        state: Option<&str>,
    ) -> CoreResult<QuantileBreaks>;

    /// Creates a boxed clone for trait object storage.
    fn clone_source(&self) -> BoxedMetricsSource;
}

/// Boxed metrics source trait object.
pub type BoxedMetricsSource = Box<dyn MetricsSource>;

impl Clone for BoxedMetricsSource {
    fn clone(&self) -> Self {
        self.clone_source()
    }
}
