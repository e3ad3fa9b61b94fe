//! Paged partition reads: page size bounds and continuation token handling.

use crate::error::AppError;
use crate::store::{ContinuationToken, EntityPage, TableEntity, MAX_PAGE_SIZE};
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub const PAGE_SIZE_PARAM: &str = "pageSize";
pub const CONTINUATION_TOKEN_PARAM: &str = "continuationToken";

#[derive(Clone, Debug, PartialEq)]
pub struct PageRequest {
    pub page_size: u32,
    pub continuation: Option<ContinuationToken>,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page_size: DEFAULT_PAGE_SIZE,
            continuation: None,
        }
    }
}

impl PageRequest {
    /// Parse `pageSize` and `continuationToken` query parameters. The token is the JSON object
    /// returned by the previous page, passed back verbatim. Sizes above the store maximum are clamped.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let page_size = match params.get(PAGE_SIZE_PARAM).map(|s| s.trim()) {
            None | Some("") => DEFAULT_PAGE_SIZE,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n.min(MAX_PAGE_SIZE),
                _ => {
                    return Err(AppError::BadRequest(format!(
                        "{} must be a positive integer",
                        PAGE_SIZE_PARAM
                    )))
                }
            },
        };
        let continuation = match params.get(CONTINUATION_TOKEN_PARAM).map(|s| s.trim()) {
            None | Some("") | Some("null") => None,
            Some(raw) => Some(serde_json::from_str::<ContinuationToken>(raw).map_err(|e| {
                AppError::BadRequest(format!("invalid {}: {}", CONTINUATION_TOKEN_PARAM, e))
            })?),
        };
        Ok(PageRequest {
            page_size,
            continuation,
        })
    }
}

/// One page of records and the token to resume from, or None at the end of the partition.
#[derive(Clone, Debug, Default)]
pub struct Page {
    pub records: Vec<TableEntity>,
    pub continuation_token: Option<ContinuationToken>,
}

/// A token exists when the store reported either marker; a lone marker is still a valid resume point.
pub fn compose_token(next_partition_key: Option<String>, next_row_key: Option<String>) -> Option<ContinuationToken> {
    if next_partition_key.is_none() && next_row_key.is_none() {
        return None;
    }
    Some(ContinuationToken {
        partition_key: next_partition_key,
        row_key: next_row_key,
    })
}

impl From<EntityPage> for Page {
    fn from(page: EntityPage) -> Self {
        Page {
            records: page.entities,
            continuation_token: compose_token(page.next_partition_key, page.next_row_key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let req = PageRequest::from_query(&HashMap::new()).unwrap();
        assert_eq!(req, PageRequest::default());
        assert_eq!(req.page_size, 10);
    }

    #[test]
    fn test_page_size_bounds() {
        let req = PageRequest::from_query(&params(&[("pageSize", "5000")])).unwrap();
        assert_eq!(req.page_size, MAX_PAGE_SIZE);
        assert!(PageRequest::from_query(&params(&[("pageSize", "0")])).is_err());
        assert!(PageRequest::from_query(&params(&[("pageSize", "ten")])).is_err());
        assert!(PageRequest::from_query(&params(&[("pageSize", "-1")])).is_err());
    }

    #[test]
    fn test_token_parsing() {
        let req = PageRequest::from_query(&params(&[(
            "continuationToken",
            r#"{"PartitionKey":"food","RowKey":"abc"}"#,
        )]))
        .unwrap();
        let token = req.continuation.unwrap();
        assert_eq!(token.partition_key.as_deref(), Some("food"));
        assert_eq!(token.row_key.as_deref(), Some("abc"));

        let req = PageRequest::from_query(&params(&[("continuationToken", "null")])).unwrap();
        assert!(req.continuation.is_none());

        let err = PageRequest::from_query(&params(&[("continuationToken", "not-json")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_compose_token() {
        assert!(compose_token(None, None).is_none());
        let both = compose_token(Some("food".into()), Some("r".into())).unwrap();
        assert_eq!(both.row_key.as_deref(), Some("r"));
        let row_only = compose_token(None, Some("r".into())).unwrap();
        assert!(row_only.partition_key.is_none());
        let partition_only = compose_token(Some("food".into()), None).unwrap();
        assert!(partition_only.row_key.is_none());
    }
}
