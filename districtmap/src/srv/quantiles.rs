use actix_web::web::{Data, Path, Query};
use actix_web::{HttpResponse, Result as ActixResult, route};
use districtmap_core::metrics::{BoxedMetricsSource, FiscalYear, Metric, QuantileBreaks};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Deserialize, Clone)]
pub struct QuantileRequestQuery {
    /// Fiscal year to read metric columns for. Defaults to the current
    /// planning year (fy26).
    fy: Option<FiscalYear>,
    state: Option<String>,
}

#[derive(Serialize)]
struct QuantileResponse {
    metric: Metric,
    fiscal_year: FiscalYear,
    breaks: QuantileBreaks,
}

#[route("/quantiles/{metric}", method = "GET", method = "HEAD")]
pub async fn get_quantiles(
    path: Path<String>,
    query: Query<QuantileRequestQuery>,
    metrics: Data<BoxedMetricsSource>,
) -> ActixResult<HttpResponse> {
    let metric: Metric =
        match serde_json::from_value(serde_json::Value::String(path.into_inner())) {
            Ok(metric) => metric,
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(json!({"error": "Unknown metric"})));
            }
        };

    let query = query.into_inner();
    let fy = query.fy.unwrap_or(FiscalYear::Fy26);

    match metrics
        .quantile_breaks(metric, fy, query.state.as_deref())
        .await
    {
        Ok(breaks) => Ok(HttpResponse::Ok().json(QuantileResponse {
            metric,
            fiscal_year: fy,
            breaks,
        })),
        Err(e) => {
            error!("Failed to compute {metric:?} quantiles for {fy:?}: {e}");
            Ok(HttpResponse::InternalServerError()
                .json(json!({"error": "Failed to compute quantiles"})))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use actix_web::test::{TestRequest, call_service, init_service, read_body};
    use actix_web::{App, web};
    use async_trait::async_trait;
    use districtmap_core::metrics::MetricsSource;
    use districtmap_core::tiles::CoreResult;
    use districtmap_core::tiles::postgres::PostgresError;

    use super::*;

    type RecordedCall = (Metric, FiscalYear, Option<String>);

    #[derive(Debug, Clone)]
    struct TestMetrics {
        breaks: QuantileBreaks,
        fail: bool,
        calls: Arc<Mutex<Vec<RecordedCall>>>,
    }

    impl TestMetrics {
        fn new(breaks: QuantileBreaks) -> Self {
            Self {
                breaks,
                fail: false,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn last_call(&self) -> RecordedCall {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl MetricsSource for TestMetrics {
        async fn quantile_breaks(
            &self,
            metric: Metric,
            fy: FiscalYear,
            state: Option<&str>,
        ) -> CoreResult<QuantileBreaks> {
            self.calls
                .lock()
                .unwrap()
                .push((metric, fy, state.map(ToString::to_string)));
            if self.fail {
                return Err(PostgresError::PostgresqlTooOld(
                    semver::Version::new(9, 0, 0),
                    semver::Version::new(11, 0, 0),
                )
                .into());
            }
            Ok(self.breaks.clone())
        }

        fn clone_source(&self) -> BoxedMetricsSource {
            Box::new(self.clone())
        }
    }

    async fn get(metrics: &TestMetrics, uri: &str) -> actix_web::dev::ServiceResponse {
        let boxed: BoxedMetricsSource = Box::new(metrics.clone());
        let app = init_service(
            App::new()
                .app_data(web::Data::new(boxed))
                .service(get_quantiles),
        )
        .await;
        call_service(&app, TestRequest::get().uri(uri).to_request()).await
    }

    #[actix_rt::test]
    async fn breaks_are_returned_as_json() {
        let metrics = TestMetrics::new(vec![10.0, 20.0, 30.0, 40.0]);
        let resp = get(&metrics, "/quantiles/enrollment?fy=fy27&state=TX").await;
        assert_eq!(resp.status(), 200);
        let body = read_body(resp).await;
        assert_eq!(
            body,
            r#"{"metric":"enrollment","fiscal_year":"fy27","breaks":[10.0,20.0,30.0,40.0]}"#
                .as_bytes()
        );
        assert_eq!(
            metrics.last_call(),
            (
                Metric::Enrollment,
                FiscalYear::Fy27,
                Some("TX".to_string())
            )
        );
    }

    #[actix_rt::test]
    async fn fiscal_year_defaults_to_fy26() {
        let metrics = TestMetrics::new(vec![1.0, 2.0, 3.0, 4.0]);
        let resp = get(&metrics, "/quantiles/funding").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            metrics.last_call(),
            (Metric::Funding, FiscalYear::Fy26, None)
        );
    }

    #[actix_rt::test]
    async fn unknown_metric_is_rejected() {
        let metrics = TestMetrics::new(vec![]);
        let resp = get(&metrics, "/quantiles/turnover").await;
        assert_eq!(resp.status(), 400);
        let body = read_body(resp).await;
        assert_eq!(body, r#"{"error":"Unknown metric"}"#.as_bytes());
        assert!(metrics.calls.lock().unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn unknown_fiscal_year_is_rejected() {
        let metrics = TestMetrics::new(vec![]);
        let resp = get(&metrics, "/quantiles/funding?fy=fy99").await;
        assert_eq!(resp.status(), 400);
        assert!(metrics.calls.lock().unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn engine_failure_is_a_generic_internal_error() {
        let mut metrics = TestMetrics::new(vec![]);
        metrics.fail = true;
        let resp = get(&metrics, "/quantiles/per_pupil_spend").await;
        assert_eq!(resp.status(), 500);
        let body = read_body(resp).await;
        assert_eq!(body, r#"{"error":"Failed to compute quantiles"}"#.as_bytes());
    }
}
