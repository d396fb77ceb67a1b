use std::time::Instant;

use sqlx::{QueryBuilder, Sqlite};
use tracing::info;

use super::types::{now_millis, DocumentRow};
use crate::persistence::ResultExt;
use feedhub_domain::feed::query::dedup_by_id;
use feedhub_domain::feed::{
    Action, FeedScope, FeedSnapshot, Item, ItemQuery, Message, Nudge, NudgeQuery,
};
use feedhub_domain::shared::{DomainError, ElementId};

impl super::SqliteFeedRepository {
    pub(super) async fn get_feed_impl(
        &self,
        scope: &FeedScope,
        query: &ItemQuery,
    ) -> Result<FeedSnapshot, DomainError> {
        let start = Instant::now();

        let items = self.get_items_impl(scope, query).await?;
        let nudges = self.get_nudges_impl(scope, &query.nudge_query()).await?;
        let actions = self.get_actions_impl(scope).await?;

        info!(
            "📊 get_feed({}): {:.2}ms, actions: {}, nudges: {}, items: {}",
            scope,
            start.elapsed().as_secs_f64() * 1000.0,
            actions.len(),
            nudges.len(),
            items.len()
        );

        let mut snapshot = FeedSnapshot::empty(scope);
        snapshot.actions = actions;
        snapshot.nudges = nudges;
        snapshot.items = items;
        Ok(snapshot)
    }

    pub(super) async fn get_items_impl(
        &self,
        scope: &FeedScope,
        query: &ItemQuery,
    ) -> Result<Vec<Item>, DomainError> {
        let mut builder = scoped_select("feed_items", scope);

        if let Some(persistent) = query.persistent.as_predicate() {
            builder.push(" AND persistent = ").push_bind(persistent);
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(visibility) = query.visibility {
            builder.push(" AND visibility = ").push_bind(visibility.as_str());
        }
        push_expiry_predicate(&mut builder, query.expired_predicate());
        if let Some(labels) = query.label_filter() {
            builder.push(" AND label IN (");
            let mut separated = builder.separated(", ");
            for label in labels {
                separated.push_bind(label.clone());
            }
            separated.push_unseparated(")");
        }

        builder
            .push(" ORDER BY expiry DESC, id DESC, sequence_number DESC LIMIT ")
            .push_bind(query.limit as i64);

        let rows: Vec<DocumentRow> = builder
            .build_query_as()
            .fetch_all(&*self.pool)
            .await
            .map_repo_error("Load feed items")?;

        let items = rows
            .into_iter()
            .map(DocumentRow::to_element::<Item>)
            .collect::<Result<Vec<_>, _>>()?;

        let mut items = dedup_by_id(items, |item| &item.id);
        for item in &mut items {
            item.conversations = self.get_messages_impl(scope, &item.id).await?;
        }
        Ok(items)
    }

    pub(super) async fn get_nudges_impl(
        &self,
        scope: &FeedScope,
        query: &NudgeQuery,
    ) -> Result<Vec<Nudge>, DomainError> {
        let mut builder = scoped_select("feed_nudges", scope);

        builder
            .push(" AND status = ")
            .push_bind(query.status_filter().as_str())
            .push(" AND visibility = ")
            .push_bind(query.visibility_filter().as_str());
        push_expiry_predicate(&mut builder, query.expired_predicate());

        builder
            .push(" ORDER BY id DESC, sequence_number DESC LIMIT ")
            .push_bind(query.limit as i64);

        let rows: Vec<DocumentRow> = builder
            .build_query_as()
            .fetch_all(&*self.pool)
            .await
            .map_repo_error("Load nudges")?;

        let nudges = rows
            .into_iter()
            .map(DocumentRow::to_element::<Nudge>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dedup_by_id(nudges, |nudge| &nudge.id))
    }

    pub(super) async fn get_actions_impl(&self, scope: &FeedScope) -> Result<Vec<Action>, DomainError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT document FROM feed_actions
            WHERE uid = ?1 AND flavour = ?2
            ORDER BY id DESC, sequence_number DESC
            "#,
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .fetch_all(&*self.pool)
        .await
        .map_repo_error("Load actions")?;

        let actions = rows
            .into_iter()
            .map(DocumentRow::to_element::<Action>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dedup_by_id(actions, |action| &action.id))
    }

    pub(super) async fn get_feed_item_impl(
        &self,
        scope: &FeedScope,
        item_id: &ElementId,
    ) -> Result<Option<Item>, DomainError> {
        let item: Option<Item> = self.fetch_latest("feed_items", scope, item_id).await?;
        match item {
            Some(mut item) => {
                item.conversations = self.get_messages_impl(scope, &item.id).await?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    pub(super) async fn get_nudge_impl(
        &self,
        scope: &FeedScope,
        nudge_id: &ElementId,
    ) -> Result<Option<Nudge>, DomainError> {
        self.fetch_latest("feed_nudges", scope, nudge_id).await
    }

    pub(super) async fn get_action_impl(
        &self,
        scope: &FeedScope,
        action_id: &ElementId,
    ) -> Result<Option<Action>, DomainError> {
        self.fetch_latest("feed_actions", scope, action_id).await
    }

    pub(super) async fn get_nudge_by_title_impl(
        &self,
        scope: &FeedScope,
        title: &str,
    ) -> Result<Option<Nudge>, DomainError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            SELECT document FROM feed_nudges
            WHERE uid = ?1 AND flavour = ?2 AND title = ?3
            ORDER BY sequence_number DESC
            LIMIT 1
            "#,
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .bind(title)
        .fetch_optional(&*self.pool)
        .await
        .map_repo_error("Load nudge by title")?;

        row.map(DocumentRow::to_element).transpose()
    }

    pub(super) async fn get_message_impl(
        &self,
        scope: &FeedScope,
        item_id: &ElementId,
        message_id: &ElementId,
    ) -> Result<Option<Message>, DomainError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            SELECT document FROM feed_messages
            WHERE uid = ?1 AND flavour = ?2 AND item_id = ?3 AND id = ?4
            ORDER BY sequence_number DESC
            LIMIT 1
            "#,
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .bind(item_id.as_str())
        .bind(message_id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_repo_error("Load message")?;

        row.map(DocumentRow::to_element).transpose()
    }

    pub(super) async fn get_messages_impl(
        &self,
        scope: &FeedScope,
        item_id: &ElementId,
    ) -> Result<Vec<Message>, DomainError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT document FROM feed_messages
            WHERE uid = ?1 AND flavour = ?2 AND item_id = ?3
            ORDER BY id DESC, sequence_number DESC
            "#,
        )
        .bind(scope.uid())
        .bind(scope.flavour().as_str())
        .bind(item_id.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_repo_error("Load messages")?;

        let messages = rows
            .into_iter()
            .map(DocumentRow::to_element::<Message>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dedup_by_id(messages, |message| &message.id))
    }

    /// Latest version of one element: by id, highest sequence number first.
    async fn fetch_latest<E>(
        &self,
        table: &'static str,
        scope: &FeedScope,
        id: &ElementId,
    ) -> Result<Option<E>, DomainError>
    where
        E: feedhub_domain::element::Element + serde::de::DeserializeOwned,
    {
        let start = Instant::now();
        let sql = format!(
            "SELECT document FROM {} WHERE uid = ?1 AND flavour = ?2 AND id = ?3 \
             ORDER BY sequence_number DESC LIMIT 1",
            table
        );

        let row: Option<DocumentRow> = sqlx::query_as(&sql)
            .bind(scope.uid())
            .bind(scope.flavour().as_str())
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_repo_error(&format!("Load {} element", table))?;

        info!(
            "📊 fetch_latest({}, {}): {:.2}ms, found: {}",
            table,
            id,
            start.elapsed().as_secs_f64() * 1000.0,
            row.is_some()
        );

        row.map(DocumentRow::to_element).transpose()
    }
}

fn scoped_select<'a>(table: &str, scope: &FeedScope) -> QueryBuilder<'a, Sqlite> {
    let mut builder = QueryBuilder::new(format!("SELECT document FROM {} WHERE uid = ", table));
    builder
        .push_bind(scope.uid().to_string())
        .push(" AND flavour = ")
        .push_bind(scope.flavour().as_str());
    builder
}

fn push_expiry_predicate(builder: &mut QueryBuilder<'_, Sqlite>, expired: Option<bool>) {
    match expired {
        Some(false) => {
            builder.push(" AND expiry >= ").push_bind(now_millis());
        }
        Some(true) => {
            builder.push(" AND expiry <= ").push_bind(now_millis());
        }
        None => {}
    }
}
