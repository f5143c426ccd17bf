pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("User password error: {0}")]
    UserPasswordError(#[from] argon2::password_hash::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Record already exists: {0}")]
    DuplicateRecord(String),

    #[error("{0} is still used by some recipes")]
    ReferencedRecord(String),

    #[error("Referenced {0} does not exist")]
    InvalidReference(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid order by field: {0}")]
    InvalidOrderByField(String),

    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl Error {
    /// Unique constraint violations are reported as [`Error::DuplicateRecord`]
    pub(crate) fn unique_violation(entity: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
        move |e| match e {
            sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => {
                Error::DuplicateRecord(entity.to_string())
            }
            e => Error::DatabaseError(e),
        }
    }

    pub(crate) fn not_found(entity: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
        move |e| match e {
            sqlx::Error::RowNotFound => Error::RecordNotFound(entity.to_string()),
            e => Error::DatabaseError(e),
        }
    }
}
