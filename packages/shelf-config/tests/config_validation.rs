use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use shelf_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let mut table = root.as_table_mut().expect("Template config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{section}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("shelf_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> shelf_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = shelf_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

fn assert_validation(result: shelf_config::Result<Config>, expected: &str) {
	let err = result.expect_err("Expected a validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");
	assert!(err.to_string().contains(expected), "Unexpected error message: {err}");
}

#[test]
fn template_config_is_valid() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string()).expect("Template must load.");

	assert_eq!(cfg.query.default_limit, 50);
	assert_eq!(cfg.providers.categorizer.batch_size, 5);
}

#[test]
fn shelf_example_toml_is_valid() {
	let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shelf.example.toml");

	shelf_config::load(&path).expect("shelf.example.toml must be valid.");
}

#[test]
fn blank_api_auth_token_is_normalized_to_none() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string()).expect("Template must load.");

	assert!(cfg.security.api_auth_token.is_none());
}

#[test]
fn missing_optional_sections_use_defaults() {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let table = root.as_table_mut().expect("Template config must be a table.");

	table.remove("query");
	table.remove("enrichment");
	table.remove("import");

	if let Some(providers) = table.get_mut("providers").and_then(Value::as_table_mut) {
		providers.remove("page");
	}

	let cfg = load_payload(toml::to_string(&root).expect("Failed to render config."))
		.expect("Config without optional sections must load.");

	assert_eq!(cfg.query.max_limit, 200);
	assert_eq!(cfg.query.search_default_limit, 20);
	assert!(!cfg.enrichment.auto_categorize);
	assert!(cfg.enrichment.thumbnails);
	assert_eq!(cfg.import.collection_name, "Browser Import");
	assert!(cfg.providers.page.enabled);
	assert_eq!(cfg.providers.page.timeout_ms, 10_000);
}

#[test]
fn page_fetch_timeout_must_be_positive() {
	let payload = sample_toml_with("providers.page", "timeout_ms", Value::Integer(0));

	assert_validation(
		load_payload(payload),
		"providers.page.timeout_ms must be greater than zero.",
	);
}

#[test]
fn page_user_agent_is_required_when_enabled() {
	let mut cfg = base_config();

	cfg.providers.page.user_agent = " ".to_string();

	let err = shelf_config::validate(&cfg).expect_err("Expected user agent validation error.");

	assert!(err.to_string().contains("providers.page.user_agent must be non-empty"));

	cfg.providers.page.enabled = false;

	assert!(shelf_config::validate(&cfg).is_ok());
}

#[test]
fn unreadable_path_reports_read_error() {
	let path = env::temp_dir().join("shelf_config_test_missing_file.toml");
	let err = shelf_config::load(&path).expect_err("Expected a read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}

#[test]
fn non_loopback_bind_is_rejected_when_localhost_only() {
	let payload = sample_toml_with("service", "http_bind", Value::String("0.0.0.0:8080".into()));

	assert_validation(load_payload(payload), "must be a loopback address");
}

#[test]
fn non_loopback_bind_is_allowed_when_not_localhost_only() {
	let mut cfg = base_config();

	cfg.service.http_bind = "0.0.0.0:8080".to_string();
	cfg.security.bind_localhost_only = false;

	assert!(shelf_config::validate(&cfg).is_ok());
}

#[test]
fn http_bind_must_be_a_socket_address() {
	let mut cfg = base_config();

	cfg.service.http_bind = "localhost".to_string();

	let err = shelf_config::validate(&cfg).expect_err("Expected bind validation error.");

	assert!(err.to_string().contains("service.http_bind must be a socket address"));
}

#[test]
fn pool_size_must_be_positive() {
	let payload = sample_toml_with("storage.postgres", "pool_max_conns", Value::Integer(0));

	assert_validation(
		load_payload(payload),
		"storage.postgres.pool_max_conns must be greater than zero.",
	);
}

#[test]
fn default_limit_cannot_exceed_max_limit() {
	let payload = sample_toml_with("query", "default_limit", Value::Integer(500));

	assert_validation(
		load_payload(payload),
		"query.default_limit must not exceed query.max_limit.",
	);
}

#[test]
fn search_default_limit_cannot_exceed_max_limit() {
	let mut cfg = base_config();

	cfg.query.search_default_limit = cfg.query.max_limit + 1;

	let err = shelf_config::validate(&cfg).expect_err("Expected limit validation error.");

	assert!(err.to_string().contains("query.search_default_limit must not exceed"));
}

#[test]
fn limits_must_be_positive() {
	let payload = sample_toml_with("query", "max_limit", Value::Integer(0));

	assert_validation(load_payload(payload), "query.max_limit must be greater than zero.");
}

#[test]
fn categorizer_key_is_required_when_enabled() {
	let payload = sample_toml_with("providers.categorizer", "api_key", Value::String("  ".into()));

	assert_validation(load_payload(payload), "providers.categorizer.api_key must be non-empty");
}

#[test]
fn categorizer_key_is_optional_when_disabled() {
	let mut cfg = base_config();

	cfg.providers.categorizer.enabled = false;
	cfg.providers.categorizer.api_key = String::new();

	assert!(shelf_config::validate(&cfg).is_ok());
}

#[test]
fn categorizer_temperature_must_be_in_range() {
	let mut cfg = base_config();

	cfg.providers.categorizer.temperature = 3.5;

	let err = shelf_config::validate(&cfg).expect_err("Expected temperature validation error.");

	assert!(err.to_string().contains("providers.categorizer.temperature"));

	cfg.providers.categorizer.temperature = f32::NAN;

	assert!(shelf_config::validate(&cfg).is_err());
}

#[test]
fn categorizer_batch_size_must_be_positive() {
	let payload = sample_toml_with("providers.categorizer", "batch_size", Value::Integer(0));

	assert_validation(
		load_payload(payload),
		"providers.categorizer.batch_size must be greater than zero.",
	);
}

#[test]
fn provider_timeouts_must_be_positive() {
	let payload = sample_toml_with("providers.thumbnail", "timeout_ms", Value::Integer(0));

	assert_validation(
		load_payload(payload),
		"providers.thumbnail.timeout_ms must be greater than zero.",
	);
}

#[test]
fn import_collection_name_cannot_be_blank() {
	let payload = sample_toml_with("import", "collection_name", Value::String("   ".into()));

	assert_validation(load_payload(payload), "import.collection_name must be non-empty.");
}
