//! Feed query parsing and the feed service.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use social_common::{AppError, AppResult};
use social_db::repositories::{FeedPredicate, FeedRepository, FeedRow, SortDirection};
use validator::Validate;

use super::post::normalize_tags;

/// Largest page a caller may request.
pub const MAX_FEED_LIMIT: u64 = 20;

/// Largest offset the store can bind (a Postgres `bigint`).
pub const MAX_FEED_OFFSET: u64 = i64::MAX as u64;

/// Raw feed query-string parameters, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
    pub tags: Option<String>,
    pub search: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}

/// A validated feed query.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct FeedQuery {
    #[validate(range(min = 1, max = 20))]
    pub limit: u64,
    pub offset: u64,
    pub sort: SortDirection,
    #[validate(length(max = 5))]
    pub tags: Vec<String>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub until: Option<DateTime<Utc>>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            limit: MAX_FEED_LIMIT,
            offset: 0,
            sort: SortDirection::Asc,
            tags: Vec::new(),
            search: None,
            since: None,
            until: None,
        }
    }
}

impl FeedQuery {
    /// Parse and validate raw parameters. Nothing touches the store here.
    pub fn parse(params: &FeedParams) -> AppResult<Self> {
        let mut query = Self::default();

        if let Some(limit) = non_empty(params.limit.as_deref()) {
            query.limit = limit
                .parse()
                .map_err(|_| AppError::BadQuery(format!("limit must be an integer, got {limit:?}")))?;
        }
        if let Some(offset) = non_empty(params.offset.as_deref()) {
            query.offset = offset
                .parse::<u64>()
                .ok()
                .filter(|o| *o <= MAX_FEED_OFFSET)
                .ok_or_else(|| {
                    AppError::BadQuery(format!(
                        "offset must be an integer in 0..={MAX_FEED_OFFSET}, got {offset:?}"
                    ))
                })?;
        }
        if let Some(sort) = non_empty(params.sort.as_deref()) {
            query.sort = match sort {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                other => {
                    return Err(AppError::BadQuery(format!(
                        "sort must be asc or desc, got {other:?}"
                    )));
                }
            };
        }
        if let Some(tags) = non_empty(params.tags.as_deref()) {
            query.tags = normalize_tags(tags.split(','));
        }
        // Matched literally, surrounding whitespace included
        query.search = params
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);
        query.since = parse_bound("since", params.since.as_deref());
        query.until = parse_bound("until", params.until.as_deref());

        query
            .validate()
            .map_err(|e| AppError::BadQuery(e.to_string()))?;
        Ok(query)
    }

    /// Compile this query into the predicate list for `viewer_id`.
    #[must_use]
    pub fn predicates(&self, viewer_id: i64) -> Vec<FeedPredicate> {
        let mut predicates = vec![FeedPredicate::FollowedBy(viewer_id)];
        if !self.tags.is_empty() {
            predicates.push(FeedPredicate::HasAllTags(self.tags.clone()));
        }
        if let Some(search) = &self.search {
            predicates.push(FeedPredicate::TextContains(search.clone()));
        }
        if let Some(since) = self.since {
            predicates.push(FeedPredicate::CreatedSince(since));
        }
        if let Some(until) = self.until {
            predicates.push(FeedPredicate::CreatedBefore(until));
        }
        predicates
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// A malformed bound is treated as absent
fn parse_bound(name: &'static str, value: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = non_empty(value)?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!(param = name, value = raw, error = %e, "Ignoring malformed time bound");
            None
        }
    }
}

/// Feed service.
#[derive(Clone)]
pub struct FeedService {
    feed_repo: FeedRepository,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(feed_repo: FeedRepository) -> Self {
        Self { feed_repo }
    }

    /// Posts by users `viewer_id` follows, filtered and paginated by `query`.
    pub async fn get_feed(&self, viewer_id: i64, query: &FeedQuery) -> AppResult<Vec<FeedRow>> {
        let predicates = query.predicates(viewer_id);
        tracing::debug!(viewer_id, ?predicates, "Fetching feed");

        self.feed_repo
            .fetch(&predicates, query.sort, query.limit, query.offset)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn params() -> FeedParams {
        FeedParams::default()
    }

    #[test]
    fn test_defaults() {
        let query = FeedQuery::parse(&params()).unwrap();

        assert_eq!(query.limit, 20);
        assert_eq!(query.offset, 0);
        assert_eq!(query.sort, SortDirection::Asc);
        assert!(query.tags.is_empty());
        assert_eq!(query.predicates(43), vec![FeedPredicate::FollowedBy(43)]);
    }

    #[test]
    fn test_limit_bounds() {
        for bad in ["0", "21", "-1", "ten"] {
            let p = FeedParams {
                limit: Some(bad.to_string()),
                ..params()
            };
            assert!(
                matches!(FeedQuery::parse(&p), Err(AppError::BadQuery(_))),
                "limit {bad} should be rejected"
            );
        }

        let p = FeedParams {
            limit: Some("1".to_string()),
            ..params()
        };
        assert_eq!(FeedQuery::parse(&p).unwrap().limit, 1);
    }

    #[test]
    fn test_negative_offset_rejected() {
        let p = FeedParams {
            offset: Some("-5".to_string()),
            ..params()
        };
        assert!(matches!(FeedQuery::parse(&p), Err(AppError::BadQuery(_))));
    }

    #[test]
    fn test_offset_beyond_bigint_rejected() {
        for bad in [u64::MAX.to_string(), (MAX_FEED_OFFSET + 1).to_string()] {
            let p = FeedParams {
                offset: Some(bad.clone()),
                ..params()
            };
            assert!(
                matches!(FeedQuery::parse(&p), Err(AppError::BadQuery(_))),
                "offset {bad} should be rejected"
            );
        }

        let p = FeedParams {
            offset: Some(MAX_FEED_OFFSET.to_string()),
            ..params()
        };
        assert_eq!(FeedQuery::parse(&p).unwrap().offset, MAX_FEED_OFFSET);
    }

    #[test]
    fn test_search_keeps_surrounding_whitespace() {
        let p = FeedParams {
            search: Some(" rock".to_string()),
            ..params()
        };
        let query = FeedQuery::parse(&p).unwrap();
        assert_eq!(query.search.as_deref(), Some(" rock"));

        let p = FeedParams {
            search: Some("   ".to_string()),
            ..params()
        };
        assert!(FeedQuery::parse(&p).unwrap().search.is_none());
    }

    #[test]
    fn test_sort_must_be_known() {
        let p = FeedParams {
            sort: Some("sideways".to_string()),
            ..params()
        };
        assert!(matches!(FeedQuery::parse(&p), Err(AppError::BadQuery(_))));

        let p = FeedParams {
            sort: Some("desc".to_string()),
            ..params()
        };
        assert_eq!(FeedQuery::parse(&p).unwrap().sort, SortDirection::Desc);
    }

    #[test]
    fn test_at_most_five_tags() {
        let p = FeedParams {
            tags: Some("a,b,c,d,e".to_string()),
            ..params()
        };
        assert_eq!(FeedQuery::parse(&p).unwrap().tags.len(), 5);

        let p = FeedParams {
            tags: Some("a,b,c,d,e,f".to_string()),
            ..params()
        };
        assert!(matches!(FeedQuery::parse(&p), Err(AppError::BadQuery(_))));
    }

    #[test]
    fn test_search_length_limit() {
        let p = FeedParams {
            search: Some("x".repeat(101)),
            ..params()
        };
        assert!(matches!(FeedQuery::parse(&p), Err(AppError::BadQuery(_))));

        let p = FeedParams {
            search: Some("x".repeat(100)),
            ..params()
        };
        assert!(FeedQuery::parse(&p).is_ok());
    }

    #[test]
    fn test_time_bounds() {
        let p = FeedParams {
            since: Some("2025-01-01T00:00:00Z".to_string()),
            until: Some("yesterday".to_string()),
            ..params()
        };
        let query = FeedQuery::parse(&p).unwrap();

        assert!(query.since.is_some());
        assert!(query.until.is_none());
        assert!(matches!(
            query.predicates(1).last(),
            Some(FeedPredicate::CreatedSince(_))
        ));
    }

    #[test]
    fn test_predicates_in_order() {
        let p = FeedParams {
            tags: Some("music, live,music".to_string()),
            search: Some("tour".to_string()),
            ..params()
        };
        let query = FeedQuery::parse(&p).unwrap();

        assert_eq!(
            query.predicates(43),
            vec![
                FeedPredicate::FollowedBy(43),
                FeedPredicate::HasAllTags(vec!["live".to_string(), "music".to_string()]),
                FeedPredicate::TextContains("tour".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_feed_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<std::collections::BTreeMap<String, sea_orm::Value>>::new()])
                .into_connection(),
        );

        let service = FeedService::new(FeedRepository::new(db));
        let rows = service.get_feed(43, &FeedQuery::default()).await.unwrap();
        assert!(rows.is_empty());
    }
}
