use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::Item;
use super::nudge::Nudge;
use super::value_objects::{BooleanFilter, Status, Visibility};
use crate::shared::ElementId;

/// Upper bound on a composed item read. There is no cursor; reads return
/// the most recent N.
pub const DEFAULT_ITEMS_LIMIT: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub labels: Vec<String>,
}

impl FilterParams {
    pub fn labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

/// Filters for a composed item read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuery {
    pub persistent: BooleanFilter,
    pub status: Option<Status>,
    pub visibility: Option<Visibility>,
    pub expired: Option<BooleanFilter>,
    pub filter_params: Option<FilterParams>,
    pub limit: usize,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            persistent: BooleanFilter::Both,
            status: None,
            visibility: None,
            expired: None,
            filter_params: None,
            limit: DEFAULT_ITEMS_LIMIT,
        }
    }
}

impl ItemQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persistent(mut self, filter: BooleanFilter) -> Self {
        self.persistent = filter;
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn expired(mut self, filter: BooleanFilter) -> Self {
        self.expired = Some(filter);
        self
    }

    pub fn labels(mut self, params: FilterParams) -> Self {
        self.filter_params = Some(params);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Labels to match, only when at least one was given.
    pub fn label_filter(&self) -> Option<&[String]> {
        self.filter_params
            .as_ref()
            .map(|p| p.labels.as_slice())
            .filter(|labels| !labels.is_empty())
    }

    /// Expiry predicate as (column must be >= now) / (column must be <= now).
    pub fn expired_predicate(&self) -> Option<bool> {
        self.expired.and_then(|f| f.as_predicate())
    }

    /// No predicate at all: every item in the scope qualifies.
    pub fn is_unfiltered(&self) -> bool {
        self.persistent == BooleanFilter::Both
            && self.status.is_none()
            && self.visibility.is_none()
            && self.expired_predicate().is_none()
            && self.label_filter().is_none()
    }

    pub fn matches(&self, item: &Item, now: DateTime<Utc>) -> bool {
        if !self.persistent.accepts(item.persistent) {
            return false;
        }
        if self.status.map_or(false, |s| s != item.status) {
            return false;
        }
        if self.visibility.map_or(false, |v| v != item.visibility) {
            return false;
        }
        match self.expired_predicate() {
            Some(false) if item.expiry < now => return false,
            Some(true) if item.expiry > now => return false,
            _ => {}
        }
        if let Some(labels) = self.label_filter() {
            if !labels.iter().any(|l| l == &item.label) {
                return false;
            }
        }
        true
    }

    /// The nudge filters implied by this item query.
    pub fn nudge_query(&self) -> NudgeQuery {
        NudgeQuery {
            status: self.status,
            visibility: self.visibility,
            expired: self.expired,
            limit: self.limit,
        }
    }
}

/// Filters for a nudge read. Omitted filters narrow the read to what a
/// user should currently see: pending, shown and not yet expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NudgeQuery {
    pub status: Option<Status>,
    pub visibility: Option<Visibility>,
    pub expired: Option<BooleanFilter>,
    pub limit: usize,
}

impl Default for NudgeQuery {
    fn default() -> Self {
        Self {
            status: None,
            visibility: None,
            expired: None,
            limit: DEFAULT_ITEMS_LIMIT,
        }
    }
}

impl NudgeQuery {
    pub fn status_filter(&self) -> Status {
        self.status.unwrap_or(Status::Pending)
    }

    pub fn visibility_filter(&self) -> Visibility {
        self.visibility.unwrap_or(Visibility::Show)
    }

    /// Same encoding as `ItemQuery::expired_predicate`, except that an
    /// omitted filter hides expired nudges. `Both` lifts the predicate.
    pub fn expired_predicate(&self) -> Option<bool> {
        match self.expired {
            None => Some(false),
            Some(filter) => filter.as_predicate(),
        }
    }

    pub fn matches(&self, nudge: &Nudge, now: DateTime<Utc>) -> bool {
        if nudge.status != self.status_filter() || nudge.visibility != self.visibility_filter() {
            return false;
        }
        match self.expired_predicate() {
            Some(false) => nudge.expiry >= now,
            Some(true) => nudge.expiry <= now,
            None => true,
        }
    }
}

/// Item order: expiry DESC, then id DESC, then sequence number DESC.
pub fn compare_items(a: &Item, b: &Item) -> Ordering {
    b.expiry
        .cmp(&a.expiry)
        .then_with(|| compare_id_sequence(&a.id, a.sequence_number, &b.id, b.sequence_number))
}

/// Order used for actions, nudges and messages: id DESC, sequence number DESC.
pub fn compare_id_sequence(a_id: &ElementId, a_seq: i64, b_id: &ElementId, b_seq: i64) -> Ordering {
    b_id.cmp(a_id).then_with(|| b_seq.cmp(&a_seq))
}

/// Keep the first occurrence of every id, preserving order.
pub fn dedup_by_id<T, F>(elements: Vec<T>, id_of: F) -> Vec<T>
where
    F: Fn(&T) -> &ElementId,
{
    let mut seen = HashSet::new();
    elements
        .into_iter()
        .filter(|e| seen.insert(id_of(e).clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::link::Link;
    use chrono::Duration;

    fn item(id: &str, seq: i64, expiry: DateTime<Utc>, persistent: bool) -> Item {
        let mut item = Item::new(
            "author",
            "text",
            Link::png_image("https://example.com/i.png"),
            expiry,
        );
        item.id = ElementId::from_string(id);
        item.sequence_number = seq;
        item.persistent = persistent;
        item
    }

    #[test]
    fn test_default_query_is_unfiltered() {
        let query = ItemQuery::new();
        assert!(query.is_unfiltered());
        assert_eq!(query.limit, DEFAULT_ITEMS_LIMIT);

        assert!(ItemQuery::new().expired(BooleanFilter::Both).is_unfiltered());
        assert!(ItemQuery::new().labels(FilterParams::default()).is_unfiltered());
        assert!(!ItemQuery::new().persistent(BooleanFilter::True).is_unfiltered());
    }

    #[test]
    fn test_persistent_both_is_union() {
        let now = Utc::now();
        let items = vec![
            item("a", 1, now + Duration::days(1), true),
            item("b", 1, now + Duration::days(1), false),
        ];
        let count = |filter| {
            let q = ItemQuery::new().persistent(filter);
            items.iter().filter(|i| q.matches(i, now)).count()
        };
        assert_eq!(count(BooleanFilter::True), 1);
        assert_eq!(count(BooleanFilter::False), 1);
        assert_eq!(count(BooleanFilter::Both), 2);
    }

    #[test]
    fn test_expired_filter() {
        let now = Utc::now();
        let live = item("live", 1, now + Duration::hours(1), false);
        let dead = item("dead", 1, now - Duration::hours(1), false);

        let not_expired = ItemQuery::new().expired(BooleanFilter::False);
        assert!(not_expired.matches(&live, now));
        assert!(!not_expired.matches(&dead, now));

        let expired = ItemQuery::new().expired(BooleanFilter::True);
        assert!(!expired.matches(&live, now));
        assert!(expired.matches(&dead, now));

        let both = ItemQuery::new().expired(BooleanFilter::Both);
        assert!(both.matches(&live, now) && both.matches(&dead, now));
    }

    #[test]
    fn test_label_filter() {
        let now = Utc::now();
        let mut a = item("a", 1, now, false);
        a.label = "Claims".to_string();
        let query = ItemQuery::new().labels(FilterParams::labels(["Claims", "Offers"]));
        assert!(query.matches(&a, now));
        a.label = "Other".to_string();
        assert!(!query.matches(&a, now));
    }

    #[test]
    fn test_item_ordering() {
        let now = Utc::now();
        let mut items = vec![
            item("a", 1, now, false),
            item("b", 1, now, false),
            item("b", 2, now, false),
            item("z", 1, now - Duration::days(1), false),
            item("c", 1, now + Duration::days(1), false),
        ];
        items.sort_by(compare_items);
        let order: Vec<_> = items
            .iter()
            .map(|i| format!("{}{}", i.id, i.sequence_number))
            .collect();
        assert_eq!(order, vec!["c1", "b2", "b1", "a1", "z1"]);
    }

    #[test]
    fn test_dedup_keeps_first() {
        let now = Utc::now();
        let items = vec![item("a", 2, now, false), item("a", 1, now, false), item("b", 1, now, false)];
        let deduped = dedup_by_id(items, |i| &i.id);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].sequence_number, 2);
    }

    #[test]
    fn test_nudge_reads_default_to_live_pending_shown() {
        let now = Utc::now();
        let nudge = |title: &str, status, visibility, expiry| {
            let mut nudge = Nudge::new(title, "text", expiry);
            nudge.status = status;
            nudge.visibility = visibility;
            nudge
        };
        let nudges = vec![
            nudge("live", Status::Pending, Visibility::Show, now + Duration::days(1)),
            nudge("done", Status::Done, Visibility::Show, now + Duration::days(1)),
            nudge("hidden", Status::Pending, Visibility::Hide, now + Duration::days(1)),
            nudge("expired", Status::Pending, Visibility::Show, now - Duration::days(1)),
        ];
        let titles = |query: NudgeQuery| -> Vec<String> {
            nudges
                .iter()
                .filter(|n| query.matches(n, now))
                .map(|n| n.title.clone())
                .collect()
        };

        assert_eq!(titles(NudgeQuery::default()), vec!["live"]);
        assert_eq!(titles(ItemQuery::new().nudge_query()), vec!["live"]);
        assert_eq!(
            titles(NudgeQuery {
                status: Some(Status::Done),
                ..NudgeQuery::default()
            }),
            vec!["done"]
        );
        assert_eq!(
            titles(NudgeQuery {
                expired: Some(BooleanFilter::Both),
                ..NudgeQuery::default()
            }),
            vec!["live", "expired"]
        );
    }

    #[test]
    fn test_nudge_query_carries_item_limit() {
        assert_eq!(ItemQuery::new().limit(25).nudge_query().limit, 25);
        assert_eq!(NudgeQuery::default().limit, DEFAULT_ITEMS_LIMIT);
    }
}
