use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::error::CrmlinkError;

use super::types::{IntegrationItem, ItemType};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Map a `{"results": [...]}` page into integration items, in result order.
///
/// A record without an `id` fails the whole page.
pub fn normalize_items(
    response: &Value,
    item_type: &ItemType,
    is_directory: bool,
    app_base_url: &str,
) -> Result<Vec<IntegrationItem>, CrmlinkError> {
    let Some(results) = response.get("results").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    results
        .iter()
        .map(|record| normalize_record(record, item_type, is_directory, app_base_url))
        .collect()
}

fn normalize_record(
    record: &Value,
    item_type: &ItemType,
    is_directory: bool,
    app_base_url: &str,
) -> Result<IntegrationItem, CrmlinkError> {
    let id = record_id(record)?;
    let empty = Map::new();
    let properties = record
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    Ok(IntegrationItem {
        source_url: source_url(app_base_url, item_type, &id),
        display_name: display_name(properties, item_type),
        created_at: property(properties, "createdate").and_then(parse_timestamp),
        modified_at: property(properties, "lastmodifieddate").and_then(parse_timestamp),
        item_type: item_type.clone(),
        is_directory,
        id,
    })
}

fn record_id(record: &Value) -> Result<String, CrmlinkError> {
    match record.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(CrmlinkError::MissingKey("id".to_string())),
    }
}

/// String property value; null and non-string values read as absent.
fn property<'a>(properties: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    properties.get(key).and_then(Value::as_str)
}

fn non_empty<'a>(properties: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    property(properties, key).filter(|v| !v.is_empty())
}

/// Derive a never-empty display name for the record.
pub fn display_name(properties: &Map<String, Value>, item_type: &ItemType) -> String {
    let derived = match item_type {
        ItemType::Contact => {
            let first = property(properties, "firstname").unwrap_or("");
            let last = property(properties, "lastname").unwrap_or("");
            let full = format!("{first} {last}").trim().to_string();
            if full.is_empty() {
                non_empty(properties, "email").map(str::to_string)
            } else {
                Some(full)
            }
        }
        ItemType::Company => non_empty(properties, "name").map(str::to_string),
        ItemType::Deal => non_empty(properties, "dealname").map(str::to_string),
        ItemType::Other(_) => None,
    };
    derived.unwrap_or_else(|| item_type.default_display_name().to_string())
}

/// Deep link to the record in the provider app; `None` for unknown types.
pub fn source_url(app_base_url: &str, item_type: &ItemType, id: &str) -> Option<String> {
    item_type.object_path().map(|path| {
        format!(
            "{}/contacts/{path}/{id}",
            app_base_url.trim_end_matches('/')
        )
    })
}

/// Parse an ISO-8601 timestamp, treating a trailing `Z` as `+00:00`.
///
/// Values without an offset are read as UTC. Anything unparsable yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    let normalized = match raw.strip_suffix('Z') {
        Some(head) => format!("{head}+00:00"),
        None => raw.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt);
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt);
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}
