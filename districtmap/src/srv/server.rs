use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::http::header::CACHE_CONTROL;
use actix_web::middleware::{Logger, NormalizePath, TrailingSlash};
use actix_web::web::Data;
use actix_web::{App, HttpResponse, HttpServer, Responder, middleware, route, web};
use futures::TryFutureExt as _;
use serde::Serialize;

use crate::config::{KEEP_ALIVE_DEFAULT, LISTEN_ADDRESSES_DEFAULT, ServerState, SrvConfig};
use crate::srv::quantiles::get_quantiles;
use crate::srv::tiles::{MVT_CONTENT_TYPE, get_tile};
use crate::{DistrictMapError, DistrictMapResult};

/// Public description of the served tile source.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub tiles: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Catalog {
    #[must_use]
    pub fn new(state: &ServerState) -> Self {
        let tilejson = state.tiles.get_tilejson();
        Self {
            tiles: vec![CatalogEntry {
                id: state.tiles.get_id().to_string(),
                content_type: MVT_CONTENT_TYPE.to_string(),
                description: tilejson.description.clone(),
            }],
        }
    }
}

/// Root path, for humans poking at the server.
#[route("/", method = "GET", method = "HEAD")]
#[allow(clippy::unused_async)]
async fn get_index() -> &'static str {
    "districtmap server is running.\n\n\
    Tiles are served from /tiles/{z}/{x}/{y}, quantile breaks from /quantiles/{metric}.\n\
    A list of all available sources is available at http://<host>/catalog"
}

/// Return 200 OK if healthy. Used for readiness and liveness probes.
#[route("/health", method = "GET", method = "HEAD")]
#[allow(clippy::unused_async)]
async fn get_health() -> impl Responder {
    HttpResponse::Ok()
        .insert_header((CACHE_CONTROL, "no-cache"))
        .message_body("OK")
}

#[route("/catalog", method = "GET", method = "HEAD")]
#[allow(clippy::unused_async)]
async fn get_catalog(catalog: Data<Catalog>) -> impl Responder {
    HttpResponse::Ok().json(catalog)
}

pub fn router(cfg: &mut web::ServiceConfig) {
    cfg.service(get_health)
        .service(get_catalog)
        .service(get_tile)
        .service(get_quantiles)
        .service(get_index);
}

type Server = Pin<Box<dyn Future<Output = DistrictMapResult<()>>>>;

/// Create a future for an Actix web server together with the listening address.
pub fn new_server(config: SrvConfig, state: ServerState) -> DistrictMapResult<(Server, String)> {
    let catalog = Catalog::new(&state);

    let keep_alive = Duration::from_secs(config.keep_alive.unwrap_or(KEEP_ALIVE_DEFAULT));
    let worker_processes = config.worker_processes.unwrap_or_else(num_cpus::get);
    let listen_addresses = config
        .listen_addresses
        .clone()
        .unwrap_or_else(|| LISTEN_ADDRESSES_DEFAULT.to_string());
    let cors_origins = config.cors_origins.clone().unwrap_or_default();

    let factory = move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default().allowed_methods(vec!["GET", "HEAD"]), |cors, origin| {
                cors.allowed_origin(origin)
            });

        App::new()
            .app_data(Data::new(state.tiles.clone()))
            .app_data(Data::new(state.metrics.clone()))
            .app_data(Data::new(catalog.clone()))
            .wrap(middleware::Condition::new(!cors_origins.is_empty(), cors))
            .wrap(Logger::default())
            .wrap(NormalizePath::new(TrailingSlash::MergeOnly))
            .configure(router)
    };

    let server = HttpServer::new(factory)
        .bind(listen_addresses.clone())
        .map_err(|e| DistrictMapError::BindingError(e, listen_addresses.clone()))?
        .keep_alive(keep_alive)
        .shutdown_timeout(0)
        .workers(worker_processes)
        .run()
        .err_into();

    Ok((Box::pin(server), listen_addresses))
}
