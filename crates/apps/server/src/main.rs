mod pipeline;

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use formats::SourceCache;
use layers::html::DashboardPage;
use layers::routes::RouteLayer;
use parking_lot::Mutex;
use scene::{PartnerMatch, ProvinceSummary};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::pipeline::{
    PageLoad, PipelineConfig, invalidate_sources, load_page, refresh_stale_sources,
};

#[derive(Clone)]
struct AppState {
    config: Arc<PipelineConfig>,
    sources: Arc<Mutex<SourceCache>>,
}

impl AppState {
    fn new(config: PipelineConfig) -> Self {
        Self {
            config: Arc::new(config),
            sources: Arc::new(Mutex::new(SourceCache::new())),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = env::var("TRADE_MAP_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8501".to_string())
        .parse()
        .context("invalid TRADE_MAP_ADDR")?;

    let config = PipelineConfig {
        trade_path: env_var_path("TRADE_TABLE_PATH", "Rute_Perdagangan_Provinsi.xlsx"),
        boundary_path: env_var_path("BOUNDARY_PATH", "indonesia.geojson"),
        partner_match: env_var_partner_match("PARTNER_MATCH"),
    };
    info!(
        trade = %config.trade_path.display(),
        boundaries = %config.boundary_path.display(),
        partner_match = %config.partner_match,
        "trade map configured"
    );

    let state = AppState::new(config);

    // Warm the memo; a failure here only means the page will show the error.
    if let Err(response) = page_load(&state).await {
        warn!(status = %response.status(), "initial source load failed");
    }

    let app = router(state);

    info!("trade map listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/provinces", get(get_provinces))
        .route("/api/routes", get(get_routes))
        .route("/api/report", get(get_report))
        .route("/api/reload", post(reload))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

/// Runs `f` against the source memo on the blocking pool; a cold load holds
/// the lock while it reads files.
async fn with_sources<R, F>(state: &AppState, f: F) -> Result<R, Response>
where
    F: FnOnce(&Mutex<SourceCache>, &PipelineConfig) -> R + Send + 'static,
    R: Send + 'static,
{
    let sources = Arc::clone(&state.sources);
    let config = Arc::clone(&state.config);
    tokio::task::spawn_blocking(move || f(&sources, &config))
        .await
        .map_err(|err| {
            error!("source task failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "source task failed").into_response()
        })
}

/// Re-runs the whole pipeline, as every page view does.
async fn page_load(state: &AppState) -> Result<PageLoad, Response> {
    with_sources(state, load_page).await?.map_err(|err| {
        error!(path = %err.path().display(), "page load failed: {err}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to load trade map data: {err}"),
        )
            .into_response()
    })
}

async fn index(State(state): State<AppState>) -> Response {
    let load = match page_load(&state).await {
        Ok(load) => load,
        Err(response) => return response,
    };
    match DashboardPage::new(&load.trade, &load.scene).render() {
        Ok(body) => Html(body).into_response(),
        Err(err) => {
            error!("page render failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "render error").into_response()
        }
    }
}

async fn get_provinces(State(state): State<AppState>) -> Response {
    match page_load(&state).await {
        Ok(load) => {
            let provinces: Vec<ProvinceSummary> = load
                .scene
                .table
                .records()
                .iter()
                .map(|r| r.summary())
                .collect();
            Json(provinces).into_response()
        }
        Err(response) => response,
    }
}

async fn get_routes(State(state): State<AppState>) -> Response {
    match page_load(&state).await {
        Ok(load) => Json(RouteLayer::new(2).extract(&load.scene)).into_response(),
        Err(response) => response,
    }
}

async fn get_report(State(state): State<AppState>) -> Response {
    let load = match page_load(&state).await {
        Ok(load) => load,
        Err(response) => return response,
    };
    match with_sources(&state, |sources, _| sources.lock().stats()).await {
        Ok(cache) => Json(json!({
            "report": load.scene.report,
            "cache": cache,
        }))
        .into_response(),
        Err(response) => response,
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReloadParams {
    /// Only drop sources whose file contents changed.
    #[serde(default)]
    stale: bool,
}

async fn reload(
    State(state): State<AppState>,
    Query(params): Query<ReloadParams>,
) -> Response {
    let invalidated = if params.stale {
        with_sources(&state, |sources, _| refresh_stale_sources(sources).len()).await
    } else {
        with_sources(&state, invalidate_sources).await
    };
    match invalidated {
        Ok(invalidated) => {
            info!(invalidated, stale_only = params.stale, "sources invalidated");
            Json(json!({ "invalidated": invalidated })).into_response()
        }
        Err(response) => response,
    }
}

fn env_var_path(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn env_var_partner_match(key: &str) -> PartnerMatch {
    partner_match_or_default(key, env::var(key).ok().as_deref())
}

fn partner_match_or_default(key: &str, raw: Option<&str>) -> PartnerMatch {
    let default = PartnerMatch::default();
    match raw {
        Some(raw) => raw.parse().unwrap_or_else(|err| {
            warn!("{key}: {err}; using {default}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AppState, ReloadParams, get_provinces, get_report, get_routes, healthz, index,
        partner_match_or_default, reload,
    };
    use crate::pipeline::tests::{copied_config, demo_config};
    use axum::body::to_bytes;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::response::Response;
    use scene::PartnerMatch;

    fn demo_state() -> AppState {
        AppState::new(demo_config(PartnerMatch::LongestPrefix))
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).expect("json")
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let response = healthz().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn index_renders_dashboard() {
        let response = index(State(demo_state())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Peta Rute Perdagangan Antar Provinsi di Indonesia"));
        assert!(html.contains("Data Rute Perdagangan:"));
        assert!(html.contains("<td>Kalimantan Utara</td>"));
        assert!(html.contains("11 of 12 provinces joined; 11 purchase and 9 sale routes drawn"));
        assert!(html.contains("id=\"map-data\""));
    }

    #[tokio::test]
    async fn provinces_and_routes_are_served_as_json() {
        let state = demo_state();

        let provinces = body_json(get_provinces(State(state.clone())).await).await;
        let provinces = provinces.as_array().expect("array");
        assert_eq!(provinces.len(), 11);
        assert_eq!(provinces[0]["province"], "ACEH");

        let routes = body_json(get_routes(State(state.clone())).await).await;
        let edges = routes["edges"].as_array().expect("edges");
        assert_eq!(edges.len(), 20);
        assert_eq!(edges[0]["from"], "ACEH");
        assert_eq!(edges[0]["to"], "SUMATERA UTARA");
        assert_eq!(edges[0]["style"]["color"], "green");
    }

    #[tokio::test]
    async fn report_tracks_cache_and_reload_clears_it() {
        let state = demo_state();
        get_provinces(State(state.clone())).await;

        let report = body_json(get_report(State(state.clone())).await).await;
        assert_eq!(report["report"]["join"]["unmatched_no_trade"][0], "PAPUA");
        assert_eq!(report["cache"]["hits"], 2);
        assert_eq!(report["cache"]["entries"], 2);

        let reloaded =
            body_json(reload(State(state.clone()), Query(ReloadParams::default())).await).await;
        assert_eq!(reloaded["invalidated"], 2);
        assert!(state.sources.lock().is_empty());
    }

    #[tokio::test]
    async fn stale_reload_only_drops_changed_sources() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = AppState::new(copied_config(dir.path()));
        get_provinces(State(state.clone())).await;

        let unchanged =
            body_json(reload(State(state.clone()), Query(ReloadParams { stale: true })).await)
                .await;
        assert_eq!(unchanged["invalidated"], 0);

        std::fs::write(
            &state.config.trade_path,
            "Provinsi,Pembelian Terbesar,Penjualan Terbesar\nBali,Jawa Timur,Jawa Timur\n",
        )
        .expect("rewrite");
        let changed =
            body_json(reload(State(state.clone()), Query(ReloadParams { stale: true })).await)
                .await;
        assert_eq!(changed["invalidated"], 1);
        assert_eq!(state.sources.lock().len(), 1);

        let provinces = body_json(get_provinces(State(state.clone())).await).await;
        assert_eq!(provinces.as_array().map(Vec::len), Some(1));
        assert_eq!(provinces[0]["province"], "BALI");
    }

    #[test]
    fn invalid_partner_match_falls_back_to_default() {
        assert_eq!(
            partner_match_or_default("PARTNER_MATCH", Some("first-token")),
            PartnerMatch::FirstToken
        );
        assert_eq!(
            partner_match_or_default("PARTNER_MATCH", Some("fuzzy")),
            PartnerMatch::LongestPrefix
        );
        assert_eq!(
            partner_match_or_default("PARTNER_MATCH", None),
            PartnerMatch::LongestPrefix
        );
    }

    #[tokio::test]
    async fn load_failure_is_a_server_error() {
        let mut config = demo_config(PartnerMatch::default());
        config.trade_path = config.trade_path.with_file_name("missing.xlsx");
        let response = index(State(AppState::new(config))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("missing.xlsx"));
    }
}
