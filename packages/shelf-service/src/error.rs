pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unauthenticated: {message}")]
	Unauthenticated { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<shelf_storage::Error> for Error {
	fn from(err: shelf_storage::Error) -> Self {
		match err {
			shelf_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			shelf_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			shelf_storage::Error::NotFound(message) => Self::NotFound { message },
			shelf_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}

impl From<shelf_providers::Error> for Error {
	fn from(err: shelf_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<shelf_domain::filter::FilterError> for Error {
	fn from(err: shelf_domain::filter::FilterError) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
