use axum::{
	Extension, Json, Router,
	body::Body,
	extract::{
		Path, Query, State,
		rejection::{JsonRejection, QueryRejection},
	},
	http::{HeaderMap, Request, StatusCode},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;
use shelf_service::{
	AnalyticsPeriod, AnalyticsResponse, BatchCategorizeRequest, BatchCategorizeResponse,
	BookmarkView, CategorizeRequest, CategorizeResponse, CollectionDetail, CollectionSummary,
	CollectionTreeNode, ContentRequest, ContentResponse, CreateBookmarkRequest,
	CreateBookmarkResponse, CreateCollectionRequest, Error, ImportRequest, ImportResponse,
	LikeResponse, ListRequest, ListResponse, PreferencesView, SearchRequest, SuggestTagsRequest,
	SuggestTagsResponse, ThumbnailRequest, ThumbnailResponse, UpdateBookmarkRequest,
	UpdateCollectionRequest, UpdatePreferencesRequest,
};

pub const HEADER_USER_ID: &str = "X-Shelf-User-Id";

const HEADER_AUTHORIZATION: &str = "Authorization";

/// Caller identity forwarded by the session layer, set by the identity middleware.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

#[derive(Debug, Default, Deserialize)]
struct AnalyticsQuery {
	period: Option<String>,
}

pub fn router(state: AppState) -> Router {
	let v1 = Router::new()
		.route("/bookmarks", get(list_bookmarks).post(create_bookmark))
		.route("/bookmarks/search", get(search_bookmarks))
		.route("/bookmarks/categorize", post(categorize))
		.route("/bookmarks/batch-categorize", post(batch_categorize))
		.route("/bookmarks/suggest-tags", post(suggest_tags))
		.route("/bookmarks/extract-thumbnail", post(extract_thumbnail))
		.route("/bookmarks/extract-content", post(extract_content))
		.route("/bookmarks/import", post(import_bookmarks))
		.route(
			"/bookmarks/{bookmark_id}",
			get(get_bookmark).put(update_bookmark).delete(delete_bookmark),
		)
		.route("/bookmarks/{bookmark_id}/like", post(like_bookmark).delete(unlike_bookmark))
		.route("/collections", get(list_collections).post(create_collection))
		.route("/collections/tree", get(collection_tree))
		.route(
			"/collections/{collection_id}",
			get(get_collection).put(update_collection).delete(delete_collection),
		)
		.route("/analytics", get(analytics))
		.route("/preferences", get(get_preferences).put(put_preferences))
		.layer(middleware::from_fn_with_state(state.clone(), identity_middleware));

	Router::new().route("/health", get(health)).nest("/v1", v1).with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn identity_middleware(
	State(state): State<AppState>,
	mut req: Request<Body>,
	next: Next,
) -> Response {
	if let Some(expected) = state.service.cfg.security.api_auth_token.as_deref()
		&& read_bearer_token(req.headers()) != Some(expected)
	{
		return unauthenticated("A valid bearer token is required.").into_response();
	}

	let Some(user_id) = read_user_id(req.headers()) else {
		return unauthenticated("The X-Shelf-User-Id header is required.").into_response();
	};

	req.extensions_mut().insert(UserId(user_id));

	next.run(req).await
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(HEADER_AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

fn read_user_id(headers: &HeaderMap) -> Option<String> {
	let raw = headers.get(HEADER_USER_ID)?;
	let value = raw.to_str().ok()?.trim();

	if value.is_empty() { None } else { Some(value.to_string()) }
}

fn parse_id(raw: &str, field: &str) -> Result<Uuid, ApiError> {
	Uuid::parse_str(raw.trim()).map_err(|_| {
		json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			format!("{field} must be a UUID."),
			Some(vec![format!("$.{field}")]),
		)
	})
}

async fn list_bookmarks(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	query: Result<Query<ListRequest>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
	let Query(req) = query?;
	let response = state.service.list_bookmarks(&user_id, req).await?;

	Ok(Json(response))
}

async fn search_bookmarks(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	query: Result<Query<SearchRequest>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
	let Query(req) = query?;
	let response = state.service.search_bookmarks(&user_id, req).await?;

	Ok(Json(response))
}

async fn create_bookmark(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	payload: Result<Json<CreateBookmarkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateBookmarkResponse>), ApiError> {
	let Json(req) = payload?;
	let response = state.service.create_bookmark(&user_id, req).await?;
	let status = if response.created { StatusCode::CREATED } else { StatusCode::OK };

	Ok((status, Json(response)))
}

async fn get_bookmark(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	Path(bookmark_id): Path<String>,
) -> Result<Json<BookmarkView>, ApiError> {
	let bookmark_id = parse_id(&bookmark_id, "bookmark_id")?;
	let response = state.service.get_bookmark(&user_id, bookmark_id).await?;

	Ok(Json(response))
}

async fn update_bookmark(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	Path(bookmark_id): Path<String>,
	payload: Result<Json<UpdateBookmarkRequest>, JsonRejection>,
) -> Result<Json<BookmarkView>, ApiError> {
	let bookmark_id = parse_id(&bookmark_id, "bookmark_id")?;
	let Json(req) = payload?;
	let response = state.service.update_bookmark(&user_id, bookmark_id, req).await?;

	Ok(Json(response))
}

async fn delete_bookmark(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	Path(bookmark_id): Path<String>,
) -> Result<StatusCode, ApiError> {
	let bookmark_id = parse_id(&bookmark_id, "bookmark_id")?;

	state.service.delete_bookmark(&user_id, bookmark_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn like_bookmark(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	Path(bookmark_id): Path<String>,
) -> Result<(StatusCode, Json<LikeResponse>), ApiError> {
	let bookmark_id = parse_id(&bookmark_id, "bookmark_id")?;
	let response = state.service.like_bookmark(&user_id, bookmark_id).await?;
	let status = if response.created { StatusCode::CREATED } else { StatusCode::OK };

	Ok((status, Json(response)))
}

async fn unlike_bookmark(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	Path(bookmark_id): Path<String>,
) -> Result<Json<LikeResponse>, ApiError> {
	let bookmark_id = parse_id(&bookmark_id, "bookmark_id")?;
	let response = state.service.unlike_bookmark(&user_id, bookmark_id).await?;

	Ok(Json(response))
}

async fn categorize(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	payload: Result<Json<CategorizeRequest>, JsonRejection>,
) -> Result<Json<CategorizeResponse>, ApiError> {
	let Json(req) = payload?;
	let response = state.service.categorize(&user_id, req).await?;

	Ok(Json(response))
}

async fn batch_categorize(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	payload: Result<Json<BatchCategorizeRequest>, JsonRejection>,
) -> Result<Json<BatchCategorizeResponse>, ApiError> {
	let Json(req) = payload?;
	let response = state.service.batch_categorize(&user_id, req).await?;

	Ok(Json(response))
}

async fn suggest_tags(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	payload: Result<Json<SuggestTagsRequest>, JsonRejection>,
) -> Result<Json<SuggestTagsResponse>, ApiError> {
	let Json(req) = payload?;
	let response = state.service.suggest_tags(&user_id, req).await?;

	Ok(Json(response))
}

async fn extract_thumbnail(
	State(state): State<AppState>,
	payload: Result<Json<ThumbnailRequest>, JsonRejection>,
) -> Result<Json<ThumbnailResponse>, ApiError> {
	let Json(req) = payload?;
	let Some(response) = state.service.extract_thumbnail(req).await? else {
		return Err(json_error(
			StatusCode::NOT_FOUND,
			"NOT_FOUND",
			"No thumbnail could be derived from this URL.",
			None,
		));
	};

	Ok(Json(response))
}

async fn extract_content(
	State(state): State<AppState>,
	payload: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<Json<ContentResponse>, ApiError> {
	let Json(req) = payload?;

	Ok(Json(state.service.extract_content(req).await?))
}

async fn import_bookmarks(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<Json<ImportResponse>, ApiError> {
	let Json(req) = payload?;
	let response = state.service.import_bookmarks(&user_id, req).await?;

	Ok(Json(response))
}

async fn list_collections(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
) -> Result<Json<Vec<CollectionSummary>>, ApiError> {
	let response = state.service.list_collections(&user_id).await?;

	Ok(Json(response))
}

async fn collection_tree(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
) -> Result<Json<Vec<CollectionTreeNode>>, ApiError> {
	let response = state.service.collection_tree(&user_id).await?;

	Ok(Json(response))
}

async fn create_collection(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	payload: Result<Json<CreateCollectionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CollectionSummary>), ApiError> {
	let Json(req) = payload?;
	let response = state.service.create_collection(&user_id, req).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn get_collection(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	Path(collection_id): Path<String>,
) -> Result<Json<CollectionDetail>, ApiError> {
	let collection_id = parse_id(&collection_id, "collection_id")?;
	let response = state.service.get_collection(&user_id, collection_id).await?;

	Ok(Json(response))
}

async fn update_collection(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	Path(collection_id): Path<String>,
	payload: Result<Json<UpdateCollectionRequest>, JsonRejection>,
) -> Result<Json<CollectionSummary>, ApiError> {
	let collection_id = parse_id(&collection_id, "collection_id")?;
	let Json(req) = payload?;
	let response = state.service.update_collection(&user_id, collection_id, req).await?;

	Ok(Json(response))
}

async fn delete_collection(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	Path(collection_id): Path<String>,
) -> Result<StatusCode, ApiError> {
	let collection_id = parse_id(&collection_id, "collection_id")?;

	state.service.delete_collection(&user_id, collection_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn analytics(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
	let Query(query) = query?;
	let period = AnalyticsPeriod::parse(query.period.as_deref());
	let response = state.service.analytics(&user_id, period).await?;

	Ok(Json(response))
}

async fn get_preferences(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
) -> Result<Json<PreferencesView>, ApiError> {
	let response = state.service.get_preferences(&user_id).await?;

	Ok(Json(response))
}

async fn put_preferences(
	State(state): State<AppState>,
	Extension(UserId(user_id)): Extension<UserId>,
	payload: Result<Json<UpdatePreferencesRequest>, JsonRejection>,
) -> Result<Json<PreferencesView>, ApiError> {
	let Json(req) = payload?;
	let response = state.service.put_preferences(&user_id, req).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::Unauthenticated { message } => unauthenticated(message),
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			Error::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			Error::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "CONFLICT", message, None),
			Error::Provider { message } =>
				json_error(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message, None),
			Error::Storage { message } => {
				tracing::error!(error = %message, "Storage failure while serving a request.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"INTERNAL_ERROR",
					"Internal error.",
					None,
				)
			},
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(err: JsonRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text(), None)
	}
}

impl From<QueryRejection> for ApiError {
	fn from(err: QueryRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", err.body_text(), None)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

fn unauthenticated(message: impl Into<String>) -> ApiError {
	json_error(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", message, None)
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderValue;

	use super::*;

	#[test]
	fn bearer_token_requires_prefix_and_value() {
		let mut headers = HeaderMap::new();

		assert_eq!(read_bearer_token(&headers), None);

		headers.insert(HEADER_AUTHORIZATION, HeaderValue::from_static("Bearer  secret "));

		assert_eq!(read_bearer_token(&headers), Some("secret"));

		headers.insert(HEADER_AUTHORIZATION, HeaderValue::from_static("Basic secret"));

		assert_eq!(read_bearer_token(&headers), None);

		headers.insert(HEADER_AUTHORIZATION, HeaderValue::from_static("Bearer "));

		assert_eq!(read_bearer_token(&headers), None);
	}

	#[test]
	fn blank_user_header_is_missing() {
		let mut headers = HeaderMap::new();

		headers.insert(HEADER_USER_ID, HeaderValue::from_static("   "));

		assert_eq!(read_user_id(&headers), None);

		headers.insert(HEADER_USER_ID, HeaderValue::from_static(" user-1 "));

		assert_eq!(read_user_id(&headers).as_deref(), Some("user-1"));
	}

	#[test]
	fn storage_errors_do_not_leak_details() {
		let err = ApiError::from(Error::Storage { message: "password=hunter2".to_string() });

		assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(err.error_code, "INTERNAL_ERROR");
		assert!(!err.message.contains("hunter2"));
	}
}
