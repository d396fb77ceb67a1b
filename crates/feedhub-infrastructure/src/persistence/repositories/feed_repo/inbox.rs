use super::types::now_millis;
use crate::persistence::ResultExt;
use feedhub_domain::feed::FeedScope;
use feedhub_domain::shared::DomainError;

impl super::SqliteFeedRepository {
    /// Labels in creation order. A feed without labels gets the default one.
    pub(super) async fn labels_impl(&self, scope: &FeedScope) -> Result<Vec<String>, DomainError> {
        let labels: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT label FROM feed_labels
            WHERE uid = ?1 AND flavour = ?2
            ORDER BY created_at ASC, label ASC
            "#,
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .fetch_all(&*self.pool)
        .await
        .map_repo_error("Load labels")?;

        if !labels.is_empty() {
            return Ok(labels);
        }

        self.save_label_impl(scope, &self.default_label).await?;
        Ok(vec![self.default_label.clone()])
    }

    pub(super) async fn save_label_impl(&self, scope: &FeedScope, label: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO feed_labels (uid, flavour, label, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .bind(label)
        .bind(now_millis())
        .execute(&*self.pool)
        .await
        .map_repo_error("Save label")?;
        Ok(())
    }

    /// A feed with no counter row starts at zero.
    pub(super) async fn unread_persistent_items_impl(&self, scope: &FeedScope) -> Result<u64, DomainError> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT count FROM unread_inbox_counts WHERE uid = ?1 AND flavour = ?2",
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_repo_error("Load unread count")?;

        match count {
            Some(count) => Ok(count.max(0) as u64),
            None => {
                self.store_unread_count(scope, 0).await?;
                Ok(0)
            }
        }
    }

    pub(super) async fn update_unread_persistent_items_count_impl(
        &self,
        scope: &FeedScope,
    ) -> Result<(), DomainError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM feed_items WHERE uid = ?1 AND flavour = ?2 AND persistent = 1",
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .fetch_one(&*self.pool)
        .await
        .map_repo_error("Count persistent items")?;

        self.store_unread_count(scope, count).await
    }

    async fn store_unread_count(&self, scope: &FeedScope, count: i64) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO unread_inbox_counts (uid, flavour, count, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(uid, flavour) DO UPDATE SET
                count = ?3,
                updated_at = ?4
            "#,
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .bind(count)
        .bind(now_millis())
        .execute(&*self.pool)
        .await
        .map_repo_error("Save unread count")?;
        Ok(())
    }
}
