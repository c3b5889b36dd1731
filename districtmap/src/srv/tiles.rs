use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::web::{Data, Path, Query};
use actix_web::{HttpResponse, Result as ActixResult, route};
use districtmap_core::tiles::{BoxedSource, TileCoord, TileFilter, ZoomPolicy};
use log::error;
use serde::Deserialize;
use serde_json::json;

/// Content type of the encoded tile payload.
pub const MVT_CONTENT_TYPE: &str = "application/vnd.mapbox-vector-tile";

/// Cache lifetime of national-view tiles: low zoom data changes rarely and
/// is expensive to regenerate.
const CACHE_CONTROL_NATIONAL: &str = "public, max-age=86400";
/// Cache lifetime of everything else, including empty tiles.
const CACHE_CONTROL_DEFAULT: &str = "public, max-age=3600";

#[derive(Deserialize, Clone)]
pub struct TileRequestQuery {
    state: Option<String>,
}

/// Parses raw `z/x/y` path segments into a tile coordinate.
///
/// The y segment may carry a tile-format suffix (`.pbf`, `.mvt`) which is
/// stripped before parsing. Anything that does not parse as a non-negative
/// integer of the expected width is rejected.
fn parse_tile_path(z: &str, x: &str, y: &str) -> Option<TileCoord> {
    let y = match y.split_once('.') {
        Some((y, "pbf" | "mvt")) => y,
        Some(_) => return None,
        None => y,
    };
    Some(TileCoord {
        z: z.parse().ok()?,
        x: x.parse().ok()?,
        y: y.parse().ok()?,
    })
}

/// HTTP cache lifetime for a non-empty tile.
fn tile_cache_control(policy: &ZoomPolicy) -> &'static str {
    if policy.is_national_view {
        CACHE_CONTROL_NATIONAL
    } else {
        CACHE_CONTROL_DEFAULT
    }
}

#[route("/tiles/{z}/{x}/{y}", method = "GET", method = "HEAD")]
pub async fn get_tile(
    path: Path<(String, String, String)>,
    query: Query<TileRequestQuery>,
    source: Data<BoxedSource>,
) -> ActixResult<HttpResponse> {
    let (z, x, y) = path.into_inner();
    let Some(xyz) = parse_tile_path(&z, &x, &y) else {
        return Ok(
            HttpResponse::BadRequest().json(json!({"error": "Invalid tile coordinates"}))
        );
    };

    let filter = TileFilter::by_state(query.into_inner().state);
    // evaluated once per request; both the tile query and the response
    // caching below depend on the same decision
    let policy = ZoomPolicy::for_request(xyz.z, filter.has_state());

    let tile = match source.get_tile(xyz, &filter, &policy).await {
        Ok(tile) => tile,
        Err(e) => {
            error!("Failed to generate tile {xyz}: {e}");
            return Ok(
                HttpResponse::InternalServerError().json(json!({"error": "Failed to generate tile"}))
            );
        }
    };

    Ok(if tile.is_empty() {
        // "no data here" is a stable, cacheable fact
        HttpResponse::NoContent()
            .insert_header((CACHE_CONTROL, CACHE_CONTROL_DEFAULT))
            .finish()
    } else {
        HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, MVT_CONTENT_TYPE))
            .insert_header((CACHE_CONTROL, tile_cache_control(&policy)))
            .body(tile)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use actix_web::test::{TestRequest, call_service, init_service, read_body};
    use actix_web::{App, web};
    use async_trait::async_trait;
    use districtmap_core::tiles::postgres::PostgresError;
    use districtmap_core::tiles::{CoreResult, Source, TileData};
    use tilejson::{TileJSON, tilejson};

    use super::*;

    type RecordedCall = (TileCoord, TileFilter, ZoomPolicy);

    #[derive(Debug, Clone)]
    struct TestSource {
        tj: TileJSON,
        data: TileData,
        fail: bool,
        calls: Arc<Mutex<Vec<RecordedCall>>>,
    }

    impl TestSource {
        fn new(data: TileData) -> Self {
            Self {
                tj: tilejson! { tiles: vec![] },
                data,
                fail: false,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn failing() -> Self {
            let mut source = Self::new(Vec::new());
            source.fail = true;
            source
        }

        fn last_call(&self) -> RecordedCall {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Source for TestSource {
        fn get_id(&self) -> &str {
            "test_source"
        }

        fn get_tilejson(&self) -> &TileJSON {
            &self.tj
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
            self.calls
                .lock()
                .unwrap()
                .push((xyz, filter.clone(), *policy));
            if self.fail {
                return Err(PostgresError::PostgresqlTooOld(
                    semver::Version::new(9, 0, 0),
                    semver::Version::new(11, 0, 0),
                )
                .into());
            }
            Ok(self.data.clone())
        }
    }

    async fn get(source: &TestSource, uri: &str) -> actix_web::dev::ServiceResponse {
        let boxed: BoxedSource = Box::new(source.clone());
        let app = init_service(
            App::new()
                .app_data(web::Data::new(boxed))
                .service(get_tile),
        )
        .await;
        call_service(&app, TestRequest::get().uri(uri).to_request()).await
    }

    #[actix_rt::test]
    async fn invalid_coordinates_are_rejected() {
        let source = TestSource::new(vec![1, 2, 3]);
        for uri in [
            "/tiles/abc/1/1",
            "/tiles/3/-1/1",
            "/tiles/3/1/1.png",
            "/tiles/300/1/1",
            "/tiles/3/1/1x",
        ] {
            let resp = get(&source, uri).await;
            assert_eq!(resp.status(), 400, "{uri}");
            let body = read_body(resp).await;
            assert_eq!(body, r#"{"error":"Invalid tile coordinates"}"#.as_bytes());
        }
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn tile_format_suffix_is_stripped() {
        let source = TestSource::new(vec![1, 2, 3]);
        for uri in ["/tiles/3/1/1.pbf", "/tiles/3/1/1.mvt", "/tiles/3/1/1"] {
            let resp = get(&source, uri).await;
            assert_eq!(resp.status(), 200, "{uri}");
            let (xyz, _, _) = source.last_call();
            assert_eq!(xyz, TileCoord { z: 3, x: 1, y: 1 });
        }
    }

    #[actix_rt::test]
    async fn empty_tile_is_no_content_and_cacheable() {
        let source = TestSource::new(Vec::new());
        let resp = get(&source, "/tiles/3/1/1").await;
        assert_eq!(resp.status(), 204);
        assert_eq!(
            resp.headers().get(CACHE_CONTROL).unwrap(),
            "public, max-age=3600"
        );
    }

    #[actix_rt::test]
    async fn national_tile_caches_for_a_day() {
        let source = TestSource::new(vec![1, 2, 3]);
        let resp = get(&source, "/tiles/3/1/1").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).unwrap(),
            "application/vnd.mapbox-vector-tile"
        );
        assert_eq!(
            resp.headers().get(CACHE_CONTROL).unwrap(),
            "public, max-age=86400"
        );
        assert_eq!(read_body(resp).await, vec![1, 2, 3]);

        let (_, filter, policy) = source.last_call();
        assert!(policy.is_national_view);
        assert!(!filter.has_state());
    }

    #[actix_rt::test]
    async fn filtered_tile_caches_for_an_hour() {
        let source = TestSource::new(vec![1, 2, 3]);
        let resp = get(&source, "/tiles/10/200/300?state=TX").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get(CACHE_CONTROL).unwrap(),
            "public, max-age=3600"
        );

        let (xyz, filter, policy) = source.last_call();
        assert_eq!(
            xyz,
            TileCoord {
                z: 10,
                x: 200,
                y: 300
            }
        );
        assert_eq!(filter.state.as_deref(), Some("TX"));
        assert!(!policy.is_national_view);
        assert!((policy.simplify_tolerance - 0.001).abs() < f64::EPSILON);
    }

    #[actix_rt::test]
    async fn low_zoom_with_filter_is_not_national() {
        let source = TestSource::new(vec![1, 2, 3]);
        let resp = get(&source, "/tiles/3/1/1?state=TX").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get(CACHE_CONTROL).unwrap(),
            "public, max-age=3600"
        );
        let (_, _, policy) = source.last_call();
        assert!(!policy.is_national_view);
        assert!((policy.simplify_tolerance - 0.01).abs() < f64::EPSILON);
    }

    #[actix_rt::test]
    async fn engine_failure_is_a_generic_internal_error() {
        let source = TestSource::failing();
        let resp = get(&source, "/tiles/3/1/1").await;
        assert_eq!(resp.status(), 500);
        let body = read_body(resp).await;
        assert_eq!(body, r#"{"error":"Failed to generate tile"}"#.as_bytes());
    }
}
