#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
}
impl Error {
	/// Maps a unique-constraint violation to [`Error::Conflict`]; everything else passes through.
	pub(crate) fn from_write(err: sqlx::Error, conflict: impl FnOnce() -> String) -> Self {
		match &err {
			sqlx::Error::Database(db_err) if db_err.is_unique_violation() =>
				Self::Conflict(conflict()),
			_ => Self::Sqlx(err),
		}
	}
}
