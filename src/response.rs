//! Response helpers: stored records, empty successes and paged listings.

use crate::service::Page;
use crate::store::TableEntity;
use axum::{http::StatusCode, Json};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub fn success_ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn success_empty() -> StatusCode {
    StatusCode::OK
}

/// A page of records under a kind-specific key (`cards`, `topics`, `modules`) plus `continuationToken`,
/// which is null once the partition is exhausted.
pub struct PageBody {
    pub items_key: &'static str,
    pub page: Page,
}

impl Serialize for PageBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.items_key, &self.page.records)?;
        map.serialize_entry("continuationToken", &self.page.continuation_token)?;
        map.end()
    }
}

pub fn success_page(items_key: &'static str, page: Page) -> (StatusCode, Json<PageBody>) {
    success_ok(PageBody { items_key, page })
}

pub fn success_record(record: TableEntity) -> (StatusCode, Json<TableEntity>) {
    success_ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ContinuationToken;
    use serde_json::json;

    #[test]
    fn test_page_body_shape() {
        let body = PageBody {
            items_key: "cards",
            page: Page::default(),
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"cards": [], "continuationToken": null}));

        let body = PageBody {
            items_key: "topics",
            page: Page {
                records: Vec::new(),
                continuation_token: Some(ContinuationToken {
                    partition_key: Some("m".into()),
                    row_key: Some("t".into()),
                }),
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"topics": [], "continuationToken": {"PartitionKey": "m", "RowKey": "t"}})
        );
    }
}
