mod error;
mod http;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;

use asset_engine::AssetService;

pub use http::UPLOAD_FIELD;

/// Room for multipart boundaries and part headers on top of the payload.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

#[derive(Clone)]
struct AppState {
    service: AssetService,
}

/// Routes of the model asset API. The upload body limit follows the
/// service's validator ceiling.
pub fn router(service: AssetService) -> Router {
    let body_limit = service
        .validator()
        .max_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(http::handle_home))
        .route(
            "/upload",
            post(http::handle_upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/model/{id}", get(http::handle_fetch_model))
        .route("/models", get(http::handle_list_models))
        .with_state(AppState { service })
}

/// Model asset HTTP server. Returns once `shutdown` is cancelled and
/// in-flight requests have drained.
pub async fn run(
    port: u16,
    service: AssetService,
    shutdown: CancellationToken,
) -> Result<(), String> {
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|e| format!("bind api :{port}: {e}"))?;
    tracing::info!(port, "api server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| format!("axum serve: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use asset_api::{AssetId, AssetMeta, AssetRecord, AssetStore, NewAsset, StorageError};
    use asset_engine::IngestValidator;
    use storage_memory::MemoryAssetStore;

    use super::*;

    const BOUNDARY: &str = "----model-upload-boundary";

    fn app_with_limit(max_bytes: u64) -> Router {
        let service = AssetService::new(Arc::new(MemoryAssetStore::new()), IngestValidator::new(max_bytes));
        router(service)
    }

    /// Every operation fails as if the disk had gone away.
    struct FailingStore;

    fn disk_gone() -> StorageError {
        StorageError::io("read_dir /data/models", std::io::Error::other("input/output error"))
    }

    impl AssetStore for FailingStore {
        fn init(&self) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
            Box::pin(async { Ok(()) })
        }

        fn create(&self, _asset: NewAsset) -> Pin<Box<dyn Future<Output = Result<AssetId, StorageError>> + Send + '_>> {
            Box::pin(async { Err(disk_gone()) })
        }

        fn read(&self, _id: &AssetId) -> Pin<Box<dyn Future<Output = Result<Option<AssetRecord>, StorageError>> + Send + '_>> {
            Box::pin(async { Err(disk_gone()) })
        }

        fn list_metadata(&self) -> Pin<Box<dyn Future<Output = Result<Vec<AssetMeta>, StorageError>> + Send + '_>> {
            Box::pin(async { Err(disk_gone()) })
        }
    }

    fn app() -> Router {
        app_with_limit(asset_engine::DEFAULT_MAX_UPLOAD_BYTES)
    }

    fn multipart_upload(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        if !content_type.is_empty() {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/upload")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, _, body) = send(app, req).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn glb_upload_then_fetch() {
        let app = app();
        let payload: Vec<u8> = (0..1024u32).map(|i| (i % 251) as u8).collect();

        let (status, json) =
            send_json(&app, multipart_upload("model", "dragon.glb", "application/octet-stream", &payload)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["name"], "dragon.glb");
        assert_eq!(json["message"], "Model uploaded successfully");
        let id = json["id"].as_str().unwrap().to_string();

        let (status, headers, body) = send(&app, get(&format!("/model/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "model/gltf-binary");
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=31536000");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(body, payload);
    }

    #[tokio::test]
    async fn gltf_upload_is_served_as_json() {
        let app = app();
        let scene = br#"{"asset":{"version":"2.0"},"scenes":[]}"#;

        let (status, json) = send_json(&app, multipart_upload("model", "scene.GLTF", "text/plain", scene)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = json["id"].as_str().unwrap().to_string();

        let (status, headers, body) = send(&app, get(&format!("/model/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "model/gltf+json");
        assert_eq!(body, scene);
    }

    #[tokio::test]
    async fn unsupported_format_is_rejected_and_not_stored() {
        let app = app();
        let (status, json) = send_json(&app, multipart_upload("model", "model.obj", "text/plain", b"v 0 0 0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Only GLB and GLTF files are supported");
        assert_eq!(json["kind"], "unsupported_format");

        let (status, list) = send_json(&app, get("/models")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list, serde_json::json!([]));
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let app = app();
        let (status, json) = send_json(&app, multipart_upload("model", "empty.glb", "model/gltf-binary", b"")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "empty_payload");
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let app = app_with_limit(16);
        let (status, json) = send_json(&app, multipart_upload("model", "big.glb", "", &[7u8; 17])).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["kind"], "payload_too_large");
    }

    #[tokio::test]
    async fn body_beyond_transport_limit_is_rejected() {
        let app = app_with_limit(16);
        let huge = vec![1u8; 2 * MULTIPART_OVERHEAD_BYTES as usize];
        let (status, json) = send_json(&app, multipart_upload("model", "big.glb", "", &huge)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["kind"], "payload_too_large");
    }

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let app = app();

        let (status, json) = send_json(&app, multipart_upload("other", "dragon.glb", "", b"glb")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No file uploaded");

        let not_multipart = Request::post("/upload")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, json) = send_json(&app, not_multipart).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn form_without_chosen_file_is_rejected() {
        let app = app();
        let (status, json) =
            send_json(&app, multipart_upload("model", "", "application/octet-stream", b"")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No file uploaded");
        assert_eq!(json["kind"], "no_file");
    }

    #[tokio::test]
    async fn storage_failures_are_opaque_500s() {
        let app = router(AssetService::new(Arc::new(FailingStore), IngestValidator::default()));

        let (status, json) = send_json(&app, multipart_upload("model", "dragon.glb", "", b"glb")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, serde_json::json!({"error": "Failed to upload model", "kind": "storage"}));

        let path = format!("/model/{}", AssetId::generate());
        let (status, json) = send_json(&app, get(&path)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, serde_json::json!({"error": "Failed to retrieve model", "kind": "storage"}));

        let (status, json) = send_json(&app, get("/models")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, serde_json::json!({"error": "Failed to list models", "kind": "storage"}));
    }

    #[tokio::test]
    async fn unknown_model_is_404() {
        let app = app();
        for id in ["5f2b9c1e-8d4a-4c3b-9e7f-1a2b3c4d5e6f", "not-an-id"] {
            let (status, json) = send_json(&app, get(&format!("/model/{id}"))).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(json["error"], "Model not found");
        }
    }

    #[tokio::test]
    async fn list_returns_metadata_without_data() {
        let app = app();
        send(&app, multipart_upload("model", "a.glb", "model/gltf-binary", b"aaaa")).await;
        send(&app, multipart_upload("model", "b.gltf", "application/json", b"{}")).await;

        let (status, list) = send_json(&app, get("/models")).await;
        assert_eq!(status, StatusCode::OK);
        let items = list.as_array().unwrap();
        assert_eq!(items.len(), 2);
        for item in items {
            assert!(item.get("data").is_none());
            assert!(item["id"].is_string());
            assert!(item["uploadedAt"].is_i64());
            assert!(item["declaredContentType"].is_string());
        }
    }

    #[tokio::test]
    async fn home_route_greets() {
        let (status, _, body) = send(&app(), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().starts_with("Welcome to the 3D Model API server!"));
    }
}
