use std::time::Instant;

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::info;

use super::types::{now_millis, to_document, to_millis};
use crate::persistence::ResultExt;
use feedhub_domain::element::{Element, ElementKind};
use feedhub_domain::feed::{Action, Event, FeedScope, Item, Message, Nudge};
use feedhub_domain::shared::{DomainError, ElementId};

impl super::SqliteFeedRepository {
    /// Takes the write lock up front. A deferred transaction that reads
    /// before writing cannot upgrade while another writer is active and
    /// fails immediately with SQLITE_BUSY.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, DomainError> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_repo_error("Begin write transaction")
    }

    /// Idempotent write of an item. New items are rejected when the same
    /// `(id, sequence_number)` is already stored; the check and the upsert
    /// share one transaction.
    pub(super) async fn save_feed_item_impl(
        &self,
        scope: &FeedScope,
        item: &Item,
        is_new: bool,
    ) -> Result<Item, DomainError> {
        item.validate()?;
        let start = Instant::now();

        // Conversations live in their own table.
        let mut stored = item.clone();
        stored.conversations.clear();
        let document = to_document(&stored, "Serialize feed item")?;

        let mut tx = self.begin_write().await?;

        if is_new {
            ensure_absent(&mut tx, "feed_items", scope, &item.id, item.sequence_number, ElementKind::Item)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO feed_items (uid, flavour, id, sequence_number, expiry, persistent, status, visibility, label, document, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(uid, flavour, id) DO UPDATE SET
                sequence_number = ?4,
                expiry = ?5,
                persistent = ?6,
                status = ?7,
                visibility = ?8,
                label = ?9,
                document = ?10,
                updated_at = ?11
            "#,
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .bind(item.id.as_str())
        .bind(item.sequence_number)
        .bind(to_millis(item.expiry))
        .bind(item.persistent)
        .bind(item.status.as_str())
        .bind(item.visibility.as_str())
        .bind(&item.label)
        .bind(document)
        .bind(now_millis())
        .execute(&mut *tx)
        .await
        .map_repo_error("Save feed item")?;

        tx.commit().await.map_repo_error("Commit feed item")?;

        info!(
            "💾 save_feed_item({}, {}, new: {}): {:.2}ms",
            scope,
            item.id,
            is_new,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(item.clone())
    }

    pub(super) async fn save_nudge_impl(
        &self,
        scope: &FeedScope,
        nudge: &Nudge,
        is_new: bool,
    ) -> Result<Nudge, DomainError> {
        nudge.validate()?;
        let document = to_document(nudge, "Serialize nudge")?;

        let mut tx = self.begin_write().await?;

        if is_new {
            ensure_absent(&mut tx, "feed_nudges", scope, &nudge.id, nudge.sequence_number, ElementKind::Nudge)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO feed_nudges (uid, flavour, id, sequence_number, expiry, status, visibility, title, document, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(uid, flavour, id) DO UPDATE SET
                sequence_number = ?4,
                expiry = ?5,
                status = ?6,
                visibility = ?7,
                title = ?8,
                document = ?9,
                updated_at = ?10
            "#,
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .bind(nudge.id.as_str())
        .bind(nudge.sequence_number)
        .bind(to_millis(nudge.expiry))
        .bind(nudge.status.as_str())
        .bind(nudge.visibility.as_str())
        .bind(&nudge.title)
        .bind(document)
        .bind(now_millis())
        .execute(&mut *tx)
        .await
        .map_repo_error("Save nudge")?;

        tx.commit().await.map_repo_error("Commit nudge")?;
        Ok(nudge.clone())
    }

    /// Actions are only ever created or deleted, so every save is a new one.
    pub(super) async fn save_action_impl(
        &self,
        scope: &FeedScope,
        action: &Action,
    ) -> Result<Action, DomainError> {
        action.validate()?;
        let document = to_document(action, "Serialize action")?;

        let mut tx = self.begin_write().await?;

        ensure_absent(&mut tx, "feed_actions", scope, &action.id, action.sequence_number, ElementKind::Action)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO feed_actions (uid, flavour, id, sequence_number, document, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(uid, flavour, id) DO UPDATE SET
                sequence_number = ?4,
                document = ?5,
                updated_at = ?6
            "#,
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .bind(action.id.as_str())
        .bind(action.sequence_number)
        .bind(document)
        .bind(now_millis())
        .execute(&mut *tx)
        .await
        .map_repo_error("Save action")?;

        tx.commit().await.map_repo_error("Commit action")?;
        Ok(action.clone())
    }

    pub(super) async fn post_message_impl(
        &self,
        scope: &FeedScope,
        item_id: &ElementId,
        message: &Message,
    ) -> Result<Message, DomainError> {
        message.validate()?;
        let document = to_document(message, "Serialize message")?;

        let mut tx = self.begin_write().await?;

        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM feed_messages
                WHERE uid = ?1 AND flavour = ?2 AND item_id = ?3 AND id = ?4 AND sequence_number = ?5
            )
            "#,
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .bind(item_id.as_str())
        .bind(message.id.as_str())
        .bind(message.sequence_number)
        .fetch_one(&mut *tx)
        .await
        .map_repo_error("Check message existence")?;

        if exists {
            return Err(duplicate(ElementKind::Message, &message.id, message.sequence_number));
        }

        sqlx::query(
            r#"
            INSERT INTO feed_messages (uid, flavour, item_id, id, sequence_number, document, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(uid, flavour, item_id, id) DO UPDATE SET
                sequence_number = ?5,
                document = ?6,
                updated_at = ?7
            "#,
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .bind(item_id.as_str())
        .bind(message.id.as_str())
        .bind(message.sequence_number)
        .bind(document)
        .bind(now_millis())
        .execute(&mut *tx)
        .await
        .map_repo_error("Save message")?;

        tx.commit().await.map_repo_error("Commit message")?;
        Ok(message.clone())
    }

    /// Removes the item and its message thread.
    pub(super) async fn delete_feed_item_impl(
        &self,
        scope: &FeedScope,
        item_id: &ElementId,
    ) -> Result<(), DomainError> {
        let mut tx = self.begin_write().await?;

        sqlx::query("DELETE FROM feed_messages WHERE uid = ?1 AND flavour = ?2 AND item_id = ?3")
            .bind(scope.uid())
            .bind(scope.flavour().as_str())
            .bind(item_id.as_str())
            .execute(&mut *tx)
            .await
            .map_repo_error("Delete item messages")?;

        sqlx::query("DELETE FROM feed_items WHERE uid = ?1 AND flavour = ?2 AND id = ?3")
            .bind(scope.uid())
            .bind(scope.flavour().as_str())
            .bind(item_id.as_str())
            .execute(&mut *tx)
            .await
            .map_repo_error("Delete feed item")?;

        tx.commit().await.map_repo_error("Commit item delete")?;
        Ok(())
    }

    pub(super) async fn delete_element_impl(
        &self,
        table: &'static str,
        scope: &FeedScope,
        id: &ElementId,
    ) -> Result<(), DomainError> {
        let sql = format!("DELETE FROM {} WHERE uid = ?1 AND flavour = ?2 AND id = ?3", table);
        sqlx::query(&sql)
            .bind(scope.uid())
            .bind(scope.flavour().as_str())
            .bind(id.as_str())
            .execute(&*self.pool)
            .await
            .map_repo_error(&format!("Delete from {}", table))?;
        Ok(())
    }

    pub(super) async fn delete_message_impl(
        &self,
        scope: &FeedScope,
        item_id: &ElementId,
        message_id: &ElementId,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "DELETE FROM feed_messages WHERE uid = ?1 AND flavour = ?2 AND item_id = ?3 AND id = ?4",
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .bind(item_id.as_str())
        .bind(message_id.as_str())
        .execute(&*self.pool)
        .await
        .map_repo_error("Delete message")?;
        Ok(())
    }

    /// Append-only event log.
    pub(super) async fn save_event_impl(
        &self,
        table: &'static str,
        event: &Event,
    ) -> Result<(), DomainError> {
        event.validate()?;
        let document = to_document(event, "Serialize event")?;
        let flavour = event
            .context
            .flavour
            .map(|f| f.as_str())
            .unwrap_or_default();

        let sql = format!(
            "INSERT INTO {} (id, uid, flavour, name, document, recorded_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            table
        );
        sqlx::query(&sql)
            .bind(event.id.as_str())
            .bind(&event.context.user_id)
            .bind(flavour)
            .bind(&event.name)
            .bind(document)
            .bind(now_millis())
            .execute(&*self.pool)
            .await
            .map_repo_error(&format!("Save event into {}", table))?;
        Ok(())
    }
}

async fn ensure_absent(
    conn: &mut SqliteConnection,
    table: &'static str,
    scope: &FeedScope,
    id: &ElementId,
    sequence_number: i64,
    kind: ElementKind,
) -> Result<(), DomainError> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE uid = ?1 AND flavour = ?2 AND id = ?3 AND sequence_number = ?4)",
        table
    );
    let exists: bool = sqlx::query_scalar(&sql)
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .bind(id.as_str())
        .bind(sequence_number)
        .fetch_one(&mut *conn)
        .await
        .map_repo_error(&format!("Check {} existence", kind))?;

    if exists {
        return Err(duplicate(kind, id, sequence_number));
    }
    Ok(())
}

fn duplicate(kind: ElementKind, id: &ElementId, sequence_number: i64) -> DomainError {
    DomainError::DuplicateElement {
        kind: kind.to_string(),
        id: id.to_string(),
        sequence_number,
    }
}
