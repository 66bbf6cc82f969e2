mod error;
mod handlers;
pub mod render;

pub use error::ApiError;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::catalog::{load_catalog_or_empty, OilRecord};
use crate::config::Config;
use crate::images::ImageResolver;

pub struct AppState {
    pub config: Config,
    /// Catalog file re-read on every ranked request
    pub data_path: PathBuf,
    /// Catalog as loaded at startup; backs the detail page
    pub detail_oils: Vec<OilRecord>,
    pub images: ImageResolver,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// State for `config`, loading the detail copy of the catalog now
    pub fn new(config: Config, images: ImageResolver) -> Self {
        let data_path = config.data_file.clone();
        let detail_oils = load_catalog_or_empty(&data_path);
        Self {
            config,
            data_path,
            detail_oils,
            images,
        }
    }
}

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/filter/{mode}", get(handlers::filter))
        .route("/oil/{id}", get(handlers::oil_detail))
        .route("/compounds", get(handlers::compounds))
        .route("/blends", get(handlers::blends))
        .route("/properties", get(handlers::properties))
        .route("/get-oil-image", get(handlers::oil_image))
        .route("/images/placeholder.svg", get(handlers::placeholder))
        .route("/images/{key}", get(handlers::image_bytes))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the dashboard until Ctrl-C or SIGTERM
pub async fn serve(state: SharedState, addr: SocketAddr, open_browser: bool) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let local = listener.local_addr().unwrap_or(addr);

    tracing::info!(
        %local,
        data = %state.data_path.display(),
        oils = state.detail_oils.len(),
        "oilboard listening"
    );

    if open_browser {
        let url = crate::browser::dashboard_url(&local.ip().to_string(), local.port());
        if let Err(e) = crate::browser::open_url(&url) {
            tracing::warn!(error = %format!("{:#}", e), "could not open browser");
        }
    }

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{save_catalog, TagList};
    use crate::images::{CachedImage, ImageCache};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::env;
    use std::time::Duration;
    use tower::ServiceExt;

    fn sample_oils() -> Vec<OilRecord> {
        let mut lavender = OilRecord::new(1, "Lavender");
        lavender.botanical_name = "Lavandula angustifolia".to_string();
        lavender.therapeutic_properties = TagList::from_csv("Calming, Antiseptic");
        lavender.main_chemical_components = TagList::from_csv("Linalool, Linalyl acetate");
        lavender.blends_well_with = vec!["Lemon".to_string()];

        let mut lemon = OilRecord::new(2, "Lemon");
        lemon.therapeutic_properties = TagList::from_csv("Antiseptic");
        lemon.main_chemical_components = TagList::from_csv("Limonene, linalool");

        vec![lavender, lemon]
    }

    fn test_state(name: &str, oils: &[OilRecord]) -> SharedState {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let data_file = env::temp_dir().join(format!("{name}.json"));
        save_catalog(&data_file, oils).unwrap();

        let cache = ImageCache::new(env::temp_dir().join(format!("{name}_images")));
        cache.clear().unwrap();
        let client = crate::http::build_client(Duration::from_secs(1)).unwrap();
        let images = ImageResolver::new(
            client,
            cache,
            Vec::new(),
            Duration::from_secs(3600),
            "/images/placeholder.svg",
        );

        let config = Config {
            data_file,
            ..Config::default()
        };
        Arc::new(AppState::new(config, images))
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, bytes) = get(app, uri).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_catalog_size() {
        let app = create_router(test_state("oilboard_router_health", &sample_oils()));
        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["oils"], 2);
    }

    #[tokio::test]
    async fn index_renders_and_filters() {
        let app = create_router(test_state("oilboard_router_index", &sample_oils()));

        let (status, body) = get(&app, "/?filter=blends").await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("Lavender"));
        assert!(html.contains("Most Blendable"));

        let (_, body) = get(&app, "/?q=lem").await;
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains(r#"<a href="/oil/2">Lemon</a>"#));
        assert!(!html.contains(r#"<td><a href="/oil/1">Lavender</a></td>"#));
    }

    #[tokio::test]
    async fn filter_returns_json_view() {
        let app = create_router(test_state("oilboard_router_filter", &sample_oils()));
        let (status, body) = get_json(&app, "/filter/Beneficial?q=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "beneficial");
        assert_eq!(body["oils"].as_array().unwrap().len(), 2);
        assert_eq!(body["summary"]["total_oils"], 2);
        // Back-link added by normalization
        assert_eq!(body["oils"][1]["blends_well_with"][0], "Lavender");
    }

    #[tokio::test]
    async fn unknown_filter_falls_back_to_score() {
        let app = create_router(test_state("oilboard_router_filter_unknown", &sample_oils()));
        let (status, body) = get_json(&app, "/filter/sideways").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "score");
    }

    #[tokio::test]
    async fn oil_detail_found_and_missing() {
        let app = create_router(test_state("oilboard_router_detail", &sample_oils()));

        let (status, body) = get(&app, "/oil/1").await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("Lavandula angustifolia"));
        assert!(html.contains("Therapeutic"));

        let (status, body) = get_json(&app, "/oil/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn frequency_pages_render() {
        let app = create_router(test_state("oilboard_router_freq", &sample_oils()));
        for uri in ["/compounds", "/blends", "/properties"] {
            let (status, _) = get(&app, uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
        }
        let (_, body) = get(&app, "/compounds").await;
        let html = String::from_utf8(body).unwrap();
        // Case-insensitive per-oil count keeps the first spelling
        assert!(html.contains(r#"<tr><td>Linalool</td><td class="num">2</td></tr>"#));
    }

    #[tokio::test]
    async fn image_lookup_requires_a_name() {
        let app = create_router(test_state("oilboard_router_image_400", &sample_oils()));
        let (status, body) = get_json(&app, "/get-oil-image?oil_name=&botanical_name=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "bad_request");
    }

    #[tokio::test]
    async fn image_lookup_without_providers_uses_fallback() {
        let state = test_state("oilboard_router_image_fallback", &sample_oils());
        let app = create_router(state.clone());
        let (status, body) = get_json(&app, "/get-oil-image?oil_name=Lemon").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["image_url"], "/images/placeholder.svg");
        state.images.cache().clear().unwrap();
    }

    #[tokio::test]
    async fn cached_image_bytes_are_served() {
        let state = test_state("oilboard_router_image_bytes", &sample_oils());
        let entry = CachedImage {
            local_url: "/images/Citrus_limon".to_string(),
            source_url: Some("https://img.example/lemon.png".to_string()),
            content_type: Some("image/png".to_string()),
            fetched_at: chrono::Utc::now(),
        };
        state
            .images
            .cache()
            .insert("Citrus_limon", &entry, Some(b"png-bytes"))
            .unwrap();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/images/Citrus_limon").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"png-bytes");

        let (status, _) = get(&app, "/images/Nothing_here").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        state.images.cache().clear().unwrap();
    }

    #[tokio::test]
    async fn placeholder_is_svg() {
        let app = create_router(test_state("oilboard_router_placeholder", &[]));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/images/placeholder.svg")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
    }

    #[tokio::test]
    async fn duplicate_names_are_a_server_error() {
        let oils = vec![OilRecord::new(1, "Rose"), OilRecord::new(2, "Rose")];
        let app = create_router(test_state("oilboard_router_duplicates", &oils));
        let (status, body) = get_json(&app, "/filter/score").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "catalog_error");
    }

    #[tokio::test]
    async fn missing_catalog_serves_empty_dashboard() {
        let state = test_state("oilboard_router_missing", &[]);
        std::fs::remove_file(&state.data_path).unwrap();
        let app = create_router(state);
        let (status, body) = get_json(&app, "/filter/score").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["oils"].as_array().unwrap().is_empty());
        assert_eq!(body["summary"]["total_oils"], 0);
    }
}
