use feedhub_domain::shared::DomainError;

use super::RepositoryErrorMapper;

/// Extension trait for sqlx results to attach repository context
pub trait ResultExt<T> {
    /// Usage: `query.fetch_all(pool).await.map_repo_error("Load items")?`
    fn map_repo_error(self, context: &str) -> Result<T, DomainError>;
}

impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn map_repo_error(self, context: &str) -> Result<T, DomainError> {
        self.map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, context))
    }
}
