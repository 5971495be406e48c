//! HTTP handlers for the follow-graph API

use crate::engine::{EngineError, SocialGraphEngine};
use crate::graph::{GraphError, RelationshipStatus, UserId};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

pub type AppState = Arc<SocialGraphEngine>;

/// Error response rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    Engine(EngineError),
    BadRequest(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Engine(e)
    }
}

impl From<GraphError> for ApiError {
    fn from(e: GraphError) -> Self {
        ApiError::Engine(e.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(EngineError::Graph(e)) => match e {
                GraphError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                GraphError::UserNotFound(_) | GraphError::FollowNotFound { .. } => StatusCode::NOT_FOUND,
                GraphError::AlreadyFollowing { .. } => StatusCode::CONFLICT,
            },
            ApiError::Engine(EngineError::Persistence(_) | EngineError::Join(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Engine(e) => e.to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
        };
        if status.is_server_error() {
            error!("Request failed: {}", message);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

fn parse_id(raw: &str) -> ApiResult<UserId> {
    Ok(UserId::parse(raw)?)
}

#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    pub follower: String,
    pub followee: String,
}

#[derive(Debug, Deserialize)]
pub struct PairParams {
    pub a: String,
    pub b: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathParams {
    pub from: String,
    pub to: String,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct UserParams {
    pub user: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub skip: usize,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DepthParams {
    pub depth: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub a: UserId,
    pub b: UserId,
    pub status: RelationshipStatus,
}

#[derive(Debug, Serialize)]
pub struct PathResponse {
    pub from: UserId,
    pub to: UserId,
    /// Empty when no path exists within the depth bound
    pub path: Vec<UserId>,
    pub degrees: Option<usize>,
}

/// `POST /follow`
pub async fn follow_handler(
    State(engine): State<AppState>,
    payload: Result<Json<FollowRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let follower = parse_id(&req.follower)?;
    let followee = parse_id(&req.followee)?;

    let at = engine.follow(&follower, &followee).await?;
    Ok(Json(json!({
        "follower": follower,
        "followee": followee,
        "followed_at": at,
    })))
}

/// `DELETE /follow`
pub async fn unfollow_handler(
    State(engine): State<AppState>,
    payload: Result<Json<FollowRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let follower = parse_id(&req.follower)?;
    let followee = parse_id(&req.followee)?;

    engine.unfollow(&follower, &followee).await?;
    Ok(Json(json!({
        "follower": follower,
        "followee": followee,
        "unfollowed": true,
    })))
}

/// `GET /status?a=&b=`
pub async fn relationship_handler(
    State(engine): State<AppState>,
    params: Result<Query<PairParams>, QueryRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Query(params) = params?;
    let a = parse_id(&params.a)?;
    let b = parse_id(&params.b)?;

    let status = engine.relationship_status(&a, &b).await;
    Ok(Json(StatusResponse { a, b, status }))
}

/// `GET /path?from=&to=&maxDepth=`
pub async fn path_handler(
    State(engine): State<AppState>,
    params: Result<Query<PathParams>, QueryRejection>,
) -> ApiResult<Json<PathResponse>> {
    let Query(params) = params?;
    let from = parse_id(&params.from)?;
    let to = parse_id(&params.to)?;

    let response = match engine.connection_path(&from, &to, params.max_depth).await {
        Some(conn) => PathResponse { from, to, path: conn.path, degrees: Some(conn.degrees) },
        None => PathResponse { from, to, path: Vec::new(), degrees: None },
    };
    Ok(Json(response))
}

/// `GET /mutual?a=&b=&limit=`
pub async fn mutual_handler(
    State(engine): State<AppState>,
    params: Result<Query<PairParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(params) = params?;
    let a = parse_id(&params.a)?;
    let b = parse_id(&params.b)?;

    Ok(Json(engine.mutual_connections(&a, &b, params.limit).await))
}

/// `GET /recommendations?user=&limit=`
pub async fn recommendations_handler(
    State(engine): State<AppState>,
    params: Result<Query<UserParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(params) = params?;
    let user = parse_id(&params.user)?;

    Ok(Json(engine.recommendations(&user, params.limit).await?))
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

/// `GET /trending?limit=`
pub async fn trending_handler(
    State(engine): State<AppState>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(params) = params?;
    Ok(Json(engine.trending_users(params.limit).await?))
}

/// `GET /users?skip=&limit=`
pub async fn users_handler(
    State(engine): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(params) = params?;
    Ok(Json(engine.users(params.skip, params.limit).await))
}

/// `PUT /users/:id`; 201 when the user is new
pub async fn register_user_handler(
    State(engine): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let created = engine.register_user(&id).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(json!({ "id": id, "created": created }))))
}

/// `DELETE /users/:id`
pub async fn remove_user_handler(
    State(engine): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    engine.remove_user(&id).await?;
    Ok(Json(json!({ "id": id, "removed": true })))
}

/// `GET /users/:id/stats?depth=`
pub async fn user_stats_handler(
    State(engine): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<DepthParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(params) = params?;
    let id = parse_id(&id)?;
    Ok(Json(engine.user_stats(&id, params.depth).await?))
}

pub async fn followers_handler(
    State(engine): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    Ok(Json(engine.followers(&id).await?))
}

pub async fn following_handler(
    State(engine): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    Ok(Json(engine.following(&id).await?))
}

pub async fn friends_handler(
    State(engine): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    Ok(Json(engine.friends(&id).await?))
}

/// Handler for system status
pub async fn status_handler(State(engine): State<AppState>) -> impl IntoResponse {
    let stats = engine.statistics().await;
    Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "graph": stats,
    }))
}
