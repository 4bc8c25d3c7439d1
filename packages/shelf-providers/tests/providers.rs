use std::{
	collections::HashMap,
	future::IntoFuture,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use axum::{
	Json, Router,
	extract::{Query, State},
	http::{HeaderMap, StatusCode, header::USER_AGENT},
	response::Html,
	routing,
};
use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};
use tokio::{
	net::TcpListener,
	sync::{oneshot, oneshot::Sender},
};

use shelf_config::{CategorizerProviderConfig, PageProviderConfig, ThumbnailProviderConfig};
use shelf_domain::categorize::BookmarkText;
use shelf_providers::categorizer::{self, TagHints};

#[derive(Clone)]
struct ChatState {
	answers: Arc<Vec<String>>,
	calls: Arc<AtomicUsize>,
}

async fn spawn(app: Router) -> (String, Sender<()>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind mock server.");
	let addr = listener.local_addr().expect("Failed to read mock server address.");
	let (tx, rx) = oneshot::channel();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		let _ = rx.await;
	});

	tokio::spawn(async move {
		let _ = server.into_future().await;
	});

	(format!("http://{addr}"), tx)
}

async fn chat_handler(
	State(state): State<ChatState>,
	headers: HeaderMap,
	Json(body): Json<Value>,
) -> Json<Value> {
	assert_eq!(
		headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
		Some("Bearer test-key")
	);
	assert_eq!(body["model"], "test-model");

	let call = state.calls.fetch_add(1, Ordering::SeqCst);
	let answer =
		state.answers.get(call).or_else(|| state.answers.last()).cloned().unwrap_or_default();

	Json(serde_json::json!({
		"choices": [ { "message": { "role": "assistant", "content": answer } } ]
	}))
}

fn categorizer_cfg(api_base: String) -> CategorizerProviderConfig {
	CategorizerProviderConfig {
		enabled: true,
		api_base,
		api_key: "test-key".to_string(),
		path: "/v1/chat/completions".to_string(),
		model: "test-model".to_string(),
		temperature: 0.3,
		timeout_ms: 5_000,
		batch_size: 5,
		batch_delay_ms: 0,
		default_headers: Map::new(),
	}
}

async fn chat_server(answers: &[&str]) -> (String, Sender<()>, Arc<AtomicUsize>) {
	let calls = Arc::new(AtomicUsize::new(0));
	let state = ChatState {
		answers: Arc::new(answers.iter().map(|answer| answer.to_string()).collect()),
		calls: calls.clone(),
	};
	let app =
		Router::new().route("/v1/chat/completions", routing::post(chat_handler)).with_state(state);
	let (base, tx) = spawn(app).await;

	(base, tx, calls)
}

#[test]
fn builds_bearer_auth_header() {
	let headers =
		shelf_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn non_string_default_header_is_rejected() {
	let mut extra = Map::new();

	extra.insert("X-Retries".to_string(), Value::from(3));

	let err = shelf_providers::auth_headers("secret", &extra).expect_err("Expected an error.");

	assert!(matches!(err, shelf_providers::Error::InvalidConfig { .. }));
}

#[tokio::test]
async fn categorize_retries_after_an_unusable_answer() {
	let (base, tx, calls) = chat_server(&[
		"not json at all",
		r#"{"category": "development", "tags": ["Rust", "Async"], "keywords": ["tokio"],
		    "summary": "An async runtime.", "confidence": 0.9}"#,
	])
	.await;
	let cfg = categorizer_cfg(base);
	let input = BookmarkText {
		title: "Tokio",
		url: "https://tokio.rs",
		description: Some("Async runtime for Rust"),
		content: None,
	};
	let parsed = categorizer::categorize(&cfg, &input).await.expect("Categorize must succeed.");

	assert_eq!(calls.load(Ordering::SeqCst), 2);
	assert_eq!(parsed.category, "Development");
	assert_eq!(parsed.tags, vec!["rust", "async"]);
	assert_eq!(parsed.summary, "An async runtime.");

	let _ = tx.send(());
}

#[tokio::test]
async fn categorize_gives_up_after_repeated_garbage() {
	let (base, tx, calls) = chat_server(&["still not json"]).await;
	let cfg = categorizer_cfg(base);
	let input =
		BookmarkText { title: "T", url: "https://t.example", description: None, content: None };

	assert!(categorizer::categorize(&cfg, &input).await.is_err());
	assert_eq!(calls.load(Ordering::SeqCst), 2);

	let _ = tx.send(());
}

#[tokio::test]
async fn suggest_tags_parses_comma_list() {
	let (base, tx, _) = chat_server(&["Rust, Web Frameworks, rust, Axum"]).await;
	let cfg = categorizer_cfg(base);
	let hints = TagHints {
		title: "Axum",
		url: "https://github.com/tokio-rs/axum",
		description: None,
		category: Some("Development"),
	};
	let tags = categorizer::suggest_tags(&cfg, &hints).await.expect("Suggestions must succeed.");

	assert_eq!(tags, vec!["rust", "web frameworks", "axum"]);

	let _ = tx.send(());
}

async fn preview_handler(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
	assert_eq!(params.get("screenshot").map(String::as_str), Some("true"));
	assert_eq!(params.get("meta").map(String::as_str), Some("true"));

	let image = match params.get("url").map(String::as_str) {
		Some("https://blog.example/post") =>
			serde_json::json!({ "url": "https://cdn.example/og.png" }),
		_ => Value::Null,
	};

	Json(serde_json::json!({ "status": "success", "data": { "image": image } }))
}

#[tokio::test]
async fn thumbnail_lookup_reads_preview_image() {
	let app = Router::new().route("/", routing::get(preview_handler));
	let (base, tx) = spawn(app).await;
	let cfg =
		ThumbnailProviderConfig { enabled: true, api_base: format!("{base}/"), timeout_ms: 5_000 };
	let found = shelf_providers::thumbnail::lookup(&cfg, "https://blog.example/post")
		.await
		.expect("Lookup must succeed.");
	let missing = shelf_providers::thumbnail::lookup(&cfg, "https://blank.example")
		.await
		.expect("Lookup must succeed.");

	assert_eq!(found.as_deref(), Some("https://cdn.example/og.png"));
	assert_eq!(missing, None);

	let _ = tx.send(());
}

const ARTICLE_HTML: &str = r#"<!doctype html>
<html lang="de-AT">
<head>
	<title>Async &amp; Await</title>
	<meta name="description" content="A tour of async Rust.">
	<link rel="shortcut icon" href="/favicon.ico">
	<style>body { color: red; }</style>
	<script>console.log("hidden");</script>
</head>
<body><h1>Ignored heading</h1><p>Futures are lazy.</p></body>
</html>"#;

async fn article_handler(headers: HeaderMap) -> Html<&'static str> {
	assert_eq!(headers.get(USER_AGENT).and_then(|v| v.to_str().ok()), Some("shelf-test"));

	Html(ARTICLE_HTML)
}

fn page_cfg() -> PageProviderConfig {
	PageProviderConfig { enabled: true, user_agent: "shelf-test".to_string(), timeout_ms: 5_000 }
}

#[tokio::test]
async fn page_extraction_reads_metadata_and_visible_text() {
	let app = Router::new().route("/posts/async", routing::get(article_handler));
	let (base, tx) = spawn(app).await;
	let url = format!("{base}/posts/async");
	let page =
		shelf_providers::page::extract(&page_cfg(), &url).await.expect("Extraction must succeed.");

	assert_eq!(page.title, "Async & Await");
	assert_eq!(page.description, "A tour of async Rust.");
	assert_eq!(page.language, "de");
	assert_eq!(page.favicon, format!("{base}/favicon.ico"));
	assert_eq!(page.content, "Async & Await Ignored heading Futures are lazy.");
	assert_eq!(page.word_count, 8);
	assert_eq!(page.reading_time, 1);

	let _ = tx.send(());
}

#[tokio::test]
async fn page_fetch_rejects_errors_and_non_html() {
	let app = Router::new()
		.route("/gone", routing::get(|| async { StatusCode::NOT_FOUND }))
		.route("/data", routing::get(|| async { Json(serde_json::json!({ "ok": true })) }));
	let (base, tx) = spawn(app).await;
	let cfg = page_cfg();

	assert!(shelf_providers::page::fetch_html(&cfg, &format!("{base}/gone")).await.is_err());
	assert!(matches!(
		shelf_providers::page::fetch_html(&cfg, &format!("{base}/data")).await,
		Err(shelf_providers::Error::InvalidResponse { .. })
	));

	let _ = tx.send(());
}
