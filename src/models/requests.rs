//! Request DTOs for the gateway API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Request body for the lookup operation (POST /games/lookup)
///
/// `ids` is kept as raw JSON so that a missing field or a non-list value is
/// reported as an invalid argument rather than a deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub ids: Option<Value>,
}

impl LookupRequest {
    /// Validates the request data, returning the ids on success and an
    /// error message otherwise.
    pub fn validate(&self) -> Result<Vec<String>, String> {
        let items = match &self.ids {
            None | Some(Value::Null) => return Err("ids is required".to_string()),
            Some(Value::Array(items)) => items,
            Some(_) => return Err("ids must be a list".to_string()),
        };
        if items.is_empty() {
            return Err("ids must not be empty".to_string());
        }

        items
            .iter()
            .map(|item| match item {
                Value::String(id) if !id.trim().is_empty() => Ok(id.clone()),
                Value::String(_) => Err("ids must not be blank".to_string()),
                _ => Err("ids must contain only strings".to_string()),
            })
            .collect()
    }
}

/// Query string for the search operation (GET /search)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
    /// Defaults to 20, capped at 50
    #[serde(default)]
    pub max_results: Option<usize>,
    /// Defaults to true
    #[serde(default)]
    pub ignore_case: Option<bool>,
}

impl SearchParams {
    /// Returns the query, or an error message when it is missing or blank.
    pub fn validate(&self) -> Result<&str, String> {
        match self.query.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => Ok(query),
            _ => Err("query must not be blank".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(json: &str) -> LookupRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_lookup_request_valid() {
        let ids = lookup(r#"{"ids": ["13", "181"]}"#).validate().unwrap();
        assert_eq!(ids, vec!["13", "181"]);
    }

    #[test]
    fn test_lookup_request_missing_ids() {
        assert!(lookup("{}").validate().is_err());
        assert!(lookup(r#"{"ids": null}"#).validate().is_err());
    }

    #[test]
    fn test_lookup_request_not_a_list() {
        let err = lookup(r#"{"ids": "13"}"#).validate().unwrap_err();
        assert!(err.contains("list"));
    }

    #[test]
    fn test_lookup_request_empty_or_blank() {
        assert!(lookup(r#"{"ids": []}"#).validate().is_err());
        assert!(lookup(r#"{"ids": ["1", " "]}"#).validate().is_err());
        assert!(lookup(r#"{"ids": [1, 2]}"#).validate().is_err());
    }

    #[test]
    fn test_search_params_validate() {
        let params = SearchParams {
            query: Some("  catan ".to_string()),
            ..SearchParams::default()
        };
        assert_eq!(params.validate().unwrap(), "catan");

        assert!(SearchParams::default().validate().is_err());
        let blank = SearchParams {
            query: Some("   ".to_string()),
            ..SearchParams::default()
        };
        assert!(blank.validate().is_err());
    }
}
