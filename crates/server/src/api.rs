//! JSON API for search, chat and recommendations.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use storefront_assistant::{ReplySource, ShoppingAssistant};
use storefront_core::domain::purchase::UserId;
use storefront_core::errors::{ApplicationError, InterfaceError};
use storefront_core::ranking::{RankedShortlist, RankingEngine, RankingPass, ScoredCandidate};
use storefront_core::signals::SignalSet;

#[derive(Clone)]
pub struct ApiState {
    pub engine: RankingEngine,
    pub assistant: Arc<ShoppingAssistant>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub pass: RankingPass,
    pub had_results: bool,
    pub signals: SignalSet,
    pub products: Vec<ScoredCandidate>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub answer: String,
    pub source: ReplySource,
    pub had_results: bool,
    pub products: Vec<ScoredCandidate>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub success: bool,
    pub user_id: String,
    pub pass: RankingPass,
    pub had_results: bool,
    pub products: Vec<ScoredCandidate>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    pub message: &'static str,
    pub correlation_id: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/search", get(search))
        .route("/api/ai-chat", post(ai_chat))
        .route("/api/recommendations/{user_id}", get(recommendations))
        .with_state(state)
}

pub async fn search(
    State(state): State<ApiState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<SearchResponse> {
    let correlation_id = new_correlation_id();
    let shortlist = state
        .engine
        .search(&params.q)
        .await
        .map_err(|error| reject("api.search", &correlation_id, ApplicationError::from(error)))?;

    info!(
        event_name = "api.search.completed",
        correlation_id = %correlation_id,
        pass = ?shortlist.pass,
        results = shortlist.len(),
        "search ranked"
    );

    let RankedShortlist { items, had_results, pass, signals } = shortlist;
    Ok(Json(SearchResponse { success: true, pass, had_results, signals, products: items }))
}

pub async fn ai_chat(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let correlation_id = new_correlation_id();
    let Json(request) = payload.map_err(|rejection| malformed_body(&correlation_id, rejection))?;
    let reply = state
        .assistant
        .answer(&request.question)
        .await
        .map_err(|error| reject("api.ai_chat", &correlation_id, error))?;

    info!(
        event_name = "api.ai_chat.completed",
        correlation_id = %correlation_id,
        source = ?reply.source,
        pass = ?reply.shortlist.pass,
        results = reply.shortlist.len(),
        "chat answered"
    );

    Ok(Json(ChatResponse {
        success: true,
        answer: reply.answer,
        source: reply.source,
        had_results: reply.shortlist.had_results,
        products: reply.shortlist.items,
    }))
}

pub async fn recommendations(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> ApiResult<RecommendationResponse> {
    let correlation_id = new_correlation_id();
    let user = UserId::new(user_id.trim());
    let shortlist = state.engine.recommend(&user).await.map_err(|error| {
        reject("api.recommendations", &correlation_id, ApplicationError::from(error))
    })?;

    info!(
        event_name = "api.recommendations.completed",
        correlation_id = %correlation_id,
        pass = ?shortlist.pass,
        results = shortlist.len(),
        "recommendations ranked"
    );

    Ok(Json(RecommendationResponse {
        success: true,
        user_id: user.0,
        pass: shortlist.pass,
        had_results: shortlist.had_results,
        products: shortlist.items,
    }))
}

fn new_correlation_id() -> String {
    format!("req-{}", Uuid::new_v4().simple())
}

const MALFORMED_BODY_MESSAGE: &str = "Send a JSON body like {\"question\": \"...\"}.";

fn malformed_body(correlation_id: &str, rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    let detail = rejection.body_text();
    warn!(
        event_name = "api.request.rejected",
        route = "api.ai_chat",
        correlation_id = %correlation_id,
        status = StatusCode::BAD_REQUEST.as_u16(),
        detail = %detail,
        "request body rejected"
    );

    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            success: false,
            error: detail,
            message: MALFORMED_BODY_MESSAGE,
            correlation_id: correlation_id.to_string(),
        }),
    )
}

fn reject(
    event: &'static str,
    correlation_id: &str,
    error: ApplicationError,
) -> (StatusCode, Json<ApiError>) {
    let interface = error.into_interface(correlation_id);
    let (status, detail) = match &interface {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        InterfaceError::ServiceUnavailable { message, .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, message.clone())
        }
        InterfaceError::Internal { message, .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
        }
    };

    warn!(
        event_name = "api.request.rejected",
        route = event,
        correlation_id = %interface.correlation_id(),
        status = status.as_u16(),
        detail = %detail,
        "request rejected"
    );

    // Only input errors echo their detail back to the caller.
    let error = if status == StatusCode::BAD_REQUEST {
        detail
    } else {
        interface.user_message().to_string()
    };

    (
        status,
        Json(ApiError {
            success: false,
            error,
            message: interface.user_message(),
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::extract::{Path, Query, State};
    use axum::http::{Request, StatusCode};
    use axum::Json;
    use rust_decimal::Decimal;
    use serde_json::Value;
    use storefront_assistant::ShoppingAssistant;
    use storefront_core::domain::product::{ProductCandidate, ProductId};
    use storefront_core::domain::purchase::{PurchaseHistory, UserId};
    use storefront_core::ranking::{
        CandidateLoader, CandidateQuery, LoaderError, RankingEngine, RankingPass,
    };
    use storefront_db::InMemoryCatalog;
    use tower::ServiceExt;

    use super::{recommendations, router, search, ApiState, SearchParams};

    async fn state() -> ApiState {
        let catalog = InMemoryCatalog::with_products([
            ProductCandidate::new(1, "Cotton Shirt", "men's clothing", Decimal::new(2230, 2))
                .with_description("Casual cotton shirt for the office")
                .with_tags("casual,cotton"),
            ProductCandidate::new(2, "Silver Ring", "jewelery", Decimal::new(1299, 2))
                .with_tags("silver,gift"),
            ProductCandidate::new(3, "Gaming Laptop", "electronics", Decimal::new(89900, 2))
                .with_tags("gaming"),
            ProductCandidate::new(4, "Denim Jacket", "men's clothing", Decimal::new(4500, 2))
                .with_tags("casual,denim"),
        ]);
        catalog.record_purchase(UserId::new("alice"), ProductId(1), 1).await;
        catalog.record_purchase(UserId::new("bob"), ProductId(1), 1).await;
        catalog.record_purchase(UserId::new("bob"), ProductId(4), 2).await;
        catalog.record_purchase(UserId::new("carol"), ProductId(2), 3).await;

        with_loader(Arc::new(catalog))
    }

    fn with_loader(loader: Arc<dyn CandidateLoader>) -> ApiState {
        let engine = RankingEngine::new(loader);
        let assistant =
            ShoppingAssistant::new(engine.clone(), None).expect("assistant should build");
        ApiState { engine, assistant: Arc::new(assistant) }
    }

    struct DownLoader;

    #[async_trait]
    impl CandidateLoader for DownLoader {
        async fn load_candidates(
            &self,
            _query: &CandidateQuery,
        ) -> Result<Vec<ProductCandidate>, LoaderError> {
            Err(LoaderError::Unavailable("database is locked".to_string()))
        }

        async fn load_purchase_history(
            &self,
            _user: &UserId,
        ) -> Result<PurchaseHistory, LoaderError> {
            Err(LoaderError::Unavailable("database is locked".to_string()))
        }

        async fn load_popularity(&self) -> Result<HashMap<ProductId, u64>, LoaderError> {
            Err(LoaderError::Unavailable("database is locked".to_string()))
        }

        async fn load_products(
            &self,
            _ids: &BTreeSet<ProductId>,
        ) -> Result<Vec<ProductCandidate>, LoaderError> {
            Err(LoaderError::Unavailable("database is locked".to_string()))
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 1 << 20).await.expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn search_handler_returns_strict_shortlist() {
        let Json(payload) = search(
            State(state().await),
            Query(SearchParams { q: "cotton shirt under $30".to_string() }),
        )
        .await
        .expect("search succeeds");

        assert!(payload.success);
        assert_eq!(payload.pass, RankingPass::Strict);
        assert_eq!(payload.products.iter().map(|p| p.product.id.0).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn empty_search_is_bad_request_with_correlation_id() {
        let (status, Json(error)) =
            search(State(state().await), Query(SearchParams { q: "  ".to_string() }))
                .await
                .expect_err("empty query rejected");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!error.success);
        assert_eq!(error.error, "query text is required");
        assert!(error.correlation_id.starts_with("req-"));
    }

    #[tokio::test]
    async fn loader_outage_is_service_unavailable_without_leaking_detail() {
        let (status, Json(error)) = search(
            State(with_loader(Arc::new(DownLoader))),
            Query(SearchParams { q: "shirt".to_string() }),
        )
        .await
        .expect_err("outage surfaces");

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!error.error.contains("locked"));
    }

    #[tokio::test]
    async fn recommendations_handler_returns_hybrid_breakdown() {
        let Json(payload) =
            recommendations(State(state().await), Path("alice".to_string()))
                .await
                .expect("recommend succeeds");

        assert_eq!(payload.pass, RankingPass::Hybrid);
        assert!(payload.products.iter().all(|item| item.product.id != ProductId(1)));
        let top = payload.products.first().expect("at least one recommendation");
        assert_eq!(top.product.id, ProductId(4));
        let components = top.components.expect("hybrid items carry components");
        assert_eq!(components.collaborative, 1.0);
        assert_eq!(components.popularity, 2.0);
    }

    #[tokio::test]
    async fn router_serves_chat_with_fallback_answer() {
        let app = router(state().await);
        let request = Request::post("/api/ai-chat")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"question":"silver ring gift"}"#))
            .expect("request builds");

        let response = app.oneshot(request).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);

        let payload = body_json(response).await;
        assert_eq!(payload["success"], Value::Bool(true));
        assert_eq!(payload["had_results"], Value::Bool(true));
        assert_eq!(payload["source"], "shortlist");
        assert_eq!(payload["products"][0]["title"], "Silver Ring");
        assert!(payload["products"][0].get("relevance_score").is_none());
    }

    #[tokio::test]
    async fn router_rejects_blank_chat_question() {
        let app = router(state().await);
        let request = Request::post("/api/ai-chat")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"question":""}"#))
            .expect("request builds");

        let response = app.oneshot(request).await.expect("router responds");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = body_json(response).await;
        assert_eq!(payload["success"], Value::Bool(false));
    }

    #[tokio::test]
    async fn router_wraps_malformed_chat_bodies_in_error_envelope() {
        let cases = [
            ("application/json", "not json at all"),
            ("text/plain", r#"{"question":"silver ring"}"#),
            ("application/json", r#"{"question": 42}"#),
        ];

        for (content_type, body) in cases {
            let app = router(state().await);
            let request = Request::post("/api/ai-chat")
                .header("content-type", content_type)
                .body(Body::from(body))
                .expect("request builds");

            let response = app.oneshot(request).await.expect("router responds");

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
            let payload = body_json(response).await;
            assert_eq!(payload["success"], Value::Bool(false));
            assert!(payload["correlation_id"].as_str().unwrap_or_default().starts_with("req-"));
            assert!(!payload["error"].as_str().unwrap_or_default().is_empty());
        }
    }

    #[tokio::test]
    async fn router_serves_cold_start_recommendations() {
        let app = router(state().await);
        let request = Request::get("/api/recommendations/newcomer")
            .body(Body::empty())
            .expect("request builds");

        let response = app.oneshot(request).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);

        let payload = body_json(response).await;
        assert_eq!(payload["pass"], "cold_start");
        assert_eq!(payload["products"][0]["id"], 2);
        assert_eq!(payload["products"][0]["components"]["popularity"], 3.0);
    }

    #[tokio::test]
    async fn router_returns_no_match_payload() {
        let app = router(state().await);
        let request = Request::get("/api/search?q=laptop%20under%205")
            .body(Body::empty())
            .expect("request builds");

        let response = app.oneshot(request).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);

        let payload = body_json(response).await;
        assert_eq!(payload["had_results"], Value::Bool(false));
        assert_eq!(payload["pass"], "relaxed");
        assert_eq!(payload["products"], Value::Array(Vec::new()));
    }
}
