use crate::error::ApiError;
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use cograph_analysis::{detect, score, CommunityAlgorithm, CommunityParams, EdgeAlgorithm, EdgeParams};
use cograph_core::Warning;
use cograph_storage::GraphStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRequest {
    pub data_file: String,
    pub algorithm: String,
    #[serde(default)]
    pub params: CommunityParams,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResponse {
    pub assignments: BTreeMap<String, usize>,
    pub community_count: usize,
    #[serde(default)]
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgesRequest {
    pub data_file: String,
    pub algorithm: String,
    /// Defaults to every point of the graph.
    #[serde(default)]
    pub node_ids: Option<Vec<String>>,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub normalized: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EdgesResponse {
    pub edges: Vec<cograph_analysis::EdgeScore>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(store: Arc<GraphStore>, port: u16) -> std::io::Result<()> {
        tracing::info!(port, data_dir = %store.data_dir().display(), "REST API listening");
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new().wrap(cors).configure(routes(store.clone()))
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Registers every route on `cfg`; shared by the server and the tests.
pub fn routes(store: Arc<GraphStore>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(store))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({ "error": message })),
                )
                .into()
            }))
            .route("/health", web::get().to(health))
            .route("/graphs/{data_file:.*}", web::get().to(get_graph))
            .route("/cluster", web::post().to(cluster))
            .route("/edges", web::post().to(edges));
    }
}

async fn health(store: web::Data<Arc<GraphStore>>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "loaded": store.loaded(),
    }))
}

async fn get_graph(store: web::Data<Arc<GraphStore>>, path: web::Path<String>) -> ApiResult {
    let data_file = path.into_inner();
    let store = store.get_ref().clone();
    let graph = web::block(move || store.get(&data_file)).await??;
    Ok(HttpResponse::Ok().json(graph.as_ref()))
}

async fn cluster(store: web::Data<Arc<GraphStore>>, req: web::Json<ClusterRequest>) -> ApiResult {
    let req = req.into_inner();
    let algorithm: CommunityAlgorithm = req.algorithm.parse()?;
    req.params.validate()?;
    let store = store.get_ref().clone();

    let detection = web::block(move || -> Result<_, ApiError> {
        let graph = store.get(&req.data_file)?;
        Ok(detect(&graph, algorithm, &req.params)?)
    })
    .await??;

    Ok(HttpResponse::Ok().json(ClusterResponse {
        assignments: detection.assignments,
        community_count: detection.community_count,
        warnings: detection.warnings,
    }))
}

async fn edges(store: web::Data<Arc<GraphStore>>, req: web::Json<EdgesRequest>) -> ApiResult {
    let req = req.into_inner();
    let algorithm: EdgeAlgorithm = req.algorithm.parse()?;
    let params = EdgeParams {
        normalized: req.normalized.unwrap_or(true),
    };
    let store = store.get_ref().clone();

    let edges = web::block(move || -> Result<_, ApiError> {
        let graph = store.get(&req.data_file)?;
        let scores = match &req.node_ids {
            Some(ids) => score(&graph, ids, algorithm, req.top_k, &params)?,
            None => {
                let all: Vec<&str> = graph.points.iter().map(|p| p.id.as_str()).collect();
                score(&graph, &all, algorithm, req.top_k, &params)?
            }
        };
        Ok(scores)
    })
    .await??;

    Ok(HttpResponse::Ok().json(EdgesResponse { edges }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use cograph_core::BuildConfig;
    use std::fs;

    fn store() -> (tempfile::TempDir, Arc<GraphStore>) {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        // Two tag triangles joined through "rock" and "jazz".
        let mut lines = String::new();
        for tags in [
            r#"["rock", "indie", "pop"]"#,
            r#"["rock", "indie", "pop"]"#,
            r#"["jazz", "blues", "soul"]"#,
            r#"["jazz", "blues", "soul"]"#,
            r#"["rock", "jazz"]"#,
            r#"["rock", "jazz"]"#,
        ] {
            lines.push_str(&format!("{{\"id\": \"r\", \"tags\": {}}}\n", tags));
        }
        fs::write(data.join("music.jsonl"), lines).unwrap();
        let store = GraphStore::new(&data, dir.path().join("cache"), BuildConfig::default()).unwrap();
        (dir, Arc::new(store))
    }

    #[actix_web::test]
    async fn test_health() {
        let (_dir, store) = store();
        let app = test::init_service(App::new().configure(routes(store))).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_get_graph() {
        let (_dir, store) = store();
        let app = test::init_service(App::new().configure(routes(store))).await;
        let req = test::TestRequest::get().uri("/graphs/music.jsonl").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["points"].as_array().unwrap().len(), 6);
        assert_eq!(body["links"].as_array().unwrap().len(), 7);

        let missing = test::TestRequest::get().uri("/graphs/none.jsonl").to_request();
        let resp = test::call_service(&app, missing).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_cluster() {
        let (_dir, store) = store();
        let app = test::init_service(App::new().configure(routes(store))).await;
        let req = test::TestRequest::post()
            .uri("/cluster")
            .set_json(serde_json::json!({
                "dataFile": "music.jsonl",
                "algorithm": "edge_betweenness",
                "params": {}
            }))
            .to_request();
        let body: ClusterResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.assignments.len(), 6);
        assert_eq!(body.community_count, 2);
        assert_eq!(body.assignments["rock"], body.assignments["pop"]);
        assert_eq!(body.assignments["jazz"], body.assignments["soul"]);
        assert_ne!(body.assignments["rock"], body.assignments["jazz"]);
    }

    #[actix_web::test]
    async fn test_edges_on_subset() {
        let (_dir, store) = store();
        let app = test::init_service(App::new().configure(routes(store))).await;
        let req = test::TestRequest::post()
            .uri("/edges")
            .set_json(serde_json::json!({
                "dataFile": "music.jsonl",
                "algorithm": "bridges",
                "topK": 1
            }))
            .to_request();
        let body: EdgesResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.edges.len(), 1);
        assert_eq!(body.edges[0].source, "jazz");
        assert_eq!(body.edges[0].target, "rock");
        assert_eq!(body.edges[0].score, 1.0);

        let subset = test::TestRequest::post()
            .uri("/edges")
            .set_json(serde_json::json!({
                "dataFile": "music.jsonl",
                "algorithm": "edge_betweenness",
                "nodeIds": ["rock", "indie", "pop"],
            }))
            .to_request();
        let body: EdgesResponse = test::call_and_read_body_json(&app, subset).await;
        assert_eq!(body.edges.len(), 3);
        assert!(body.edges.iter().all(|e| e.source != "jazz" && e.target != "jazz"));
    }

    #[actix_web::test]
    async fn test_bad_requests() {
        let (_dir, store) = store();
        let app = test::init_service(App::new().configure(routes(store))).await;

        let unknown = test::TestRequest::post()
            .uri("/cluster")
            .set_json(serde_json::json!({"dataFile": "music.jsonl", "algorithm": "spectral"}))
            .to_request();
        let resp = test::call_service(&app, unknown).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("spectral"));

        let no_k = test::TestRequest::post()
            .uri("/cluster")
            .set_json(serde_json::json!({"dataFile": "music.jsonl", "algorithm": "k_clique"}))
            .to_request();
        assert_eq!(test::call_service(&app, no_k).await.status(), StatusCode::BAD_REQUEST);

        let traversal = test::TestRequest::post()
            .uri("/edges")
            .set_json(serde_json::json!({"dataFile": "../music.jsonl", "algorithm": "bridges"}))
            .to_request();
        assert_eq!(test::call_service(&app, traversal).await.status(), StatusCode::BAD_REQUEST);

        let malformed = test::TestRequest::post()
            .uri("/edges")
            .set_json(serde_json::json!({"algorithm": "bridges"}))
            .to_request();
        assert_eq!(test::call_service(&app, malformed).await.status(), StatusCode::BAD_REQUEST);
    }
}
