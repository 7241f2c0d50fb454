//! `structuredQuery` bodies for the Firestore REST `runQuery` endpoint.

use serde_json::{json, Value};

use crate::source::LinkQuery;

const ORDER_FIELD: &str = "uploadedDate";

/// Builds the `runQuery` request body for `query` against `collection`.
pub(crate) fn run_query_body(collection: &str, query: &LinkQuery) -> Value {
    let mut structured = json!({
        "from": [{ "collectionId": collection }],
        "orderBy": [
            { "field": { "fieldPath": ORDER_FIELD }, "direction": "ASCENDING" },
            { "field": { "fieldPath": "__name__" }, "direction": "ASCENDING" },
        ],
    });

    let mut filters = Vec::new();
    if let Some(since) = query.since {
        filters.push(field_filter("GREATER_THAN_OR_EQUAL", &since.format("%Y-%m-%d").to_string()));
    }
    if let Some(until) = query.until {
        filters.push(field_filter("LESS_THAN_OR_EQUAL", &until.format("%Y-%m-%d").to_string()));
    }
    match filters.len() {
        0 => {}
        1 => structured["where"] = filters.remove(0),
        _ => {
            structured["where"] = json!({
                "compositeFilter": { "op": "AND", "filters": filters }
            });
        }
    }

    if let Some(cursor) = &query.start_after {
        structured["startAt"] = json!({
            "values": [
                { "stringValue": cursor.uploaded_date },
                { "referenceValue": cursor.document_name },
            ],
            "before": false,
        });
    }

    if let Some(limit) = query.limit {
        structured["limit"] = json!(limit);
    }

    json!({ "structuredQuery": structured })
}

fn field_filter(op: &str, date: &str) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": ORDER_FIELD },
            "op": op,
            "value": { "stringValue": date },
        }
    })
}
