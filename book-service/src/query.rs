//! Find request payload
//!
//! A [`FindQuery`] bundles the optional column projection, the filter
//! [`Condition`] and the ordering of a book search. It arrives either as the
//! JSON body of `POST /books` or as the `query` parameter of `GET /books`:
//!
//! ```json
//! {
//!   "select": ["id", "title"],
//!   "where": {"o": "AND", "e": [{"o": "LIKE", "f": "title", "v": "%Tintin%"}]},
//!   "order_by": {"field": "id", "desc": true}
//! }
//! ```
//!
//! Every key is optional; an empty object finds everything.

use std::fmt;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;

use crate::condition::{Condition, ConditionError};

/// Ordering of the result set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Column to order by; an empty field means no ordering
    pub field: String,
    /// Descending when true
    #[serde(default)]
    pub desc: bool,
}

impl OrderBy {
    /// Ascending order on `field`
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            desc: false,
        }
    }

    /// Descending order on `field`
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            desc: true,
        }
    }
}

/// Projection, filter and ordering of a book search
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FindQuery {
    /// Columns to return; `None` returns every column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,

    /// Filter; an empty condition matches every row
    #[serde(rename = "where", skip_serializing_if = "Condition::is_empty")]
    pub condition: Condition,

    /// Ordering; storage order when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
}

#[derive(Deserialize)]
struct QueryParts {
    #[serde(default)]
    select: Option<Vec<String>>,
    #[serde(default)]
    order_by: Option<OrderBy>,
}

impl FindQuery {
    /// Assemble a query from its parts
    ///
    /// # Example
    ///
    /// ```rust
    /// use book_service::condition::Condition;
    /// use book_service::query::{fields, FindQuery, OrderBy};
    ///
    /// let query = FindQuery::new(
    ///     Some(fields(["id", "title"])),
    ///     Condition::new().like("title", "Tintin"),
    ///     Some(OrderBy::desc("id")),
    /// );
    /// assert_eq!(query.select.as_deref().map(<[_]>::len), Some(2));
    /// ```
    pub fn new(
        select: Option<Vec<String>>,
        condition: Condition,
        order_by: Option<OrderBy>,
    ) -> Self {
        Self {
            select,
            condition,
            order_by,
        }
    }

    /// Query with only a filter
    pub fn filter(condition: Condition) -> Self {
        Self {
            condition,
            ..Self::default()
        }
    }

    /// Decode a query from JSON text
    ///
    /// Condition errors are reported as they are, so clients see which node
    /// was rejected.
    pub fn from_json(json: &str) -> Result<Self, ConditionError> {
        let value: Json = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Decode a query from a parsed JSON value
    pub fn from_value(value: Json) -> Result<Self, ConditionError> {
        let Json::Object(mut map) = value else {
            return Err(ConditionError::Malformed(format!(
                "find query must be a JSON object: {value}"
            )));
        };

        let condition = match map.remove("where") {
            None | Some(Json::Null) => Condition::new(),
            Some(raw) => Condition::from_value(raw)?,
        };
        let parts: QueryParts = serde_json::from_value(Json::Object(map))?;

        Ok(Self {
            select: parts.select,
            condition,
            order_by: parts.order_by,
        })
    }

    /// JSON text for the `query` parameter of `GET /books`, before URL encoding
    pub fn to_query_string(&self) -> String {
        self.to_string()
    }

    /// Every column the query refers to: projection, filter fields and ordering
    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.select
            .iter()
            .flatten()
            .map(String::as_str)
            .chain(self.condition.fields())
            .chain(
                self.order_by
                    .iter()
                    .map(|o| o.field.as_str())
                    .filter(|f| !f.is_empty()),
            )
    }
}

impl fmt::Display for FindQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl<'de> Deserialize<'de> for FindQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Json::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

/// Build a `select` list from column names
pub fn fields<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Value;

    #[test]
    fn test_empty_object_is_default() {
        let query = FindQuery::from_json("{}").unwrap();
        assert_eq!(query, FindQuery::default());
        assert!(query.condition.compile().is_empty());
    }

    #[test]
    fn test_null_where_is_empty_condition() {
        let query = FindQuery::from_json(r#"{"where":null,"select":null}"#).unwrap();
        assert!(query.condition.is_empty());
        assert!(query.select.is_none());
    }

    #[test]
    fn test_round_trip_through_query_string() {
        let query = FindQuery::new(
            Some(fields(["id", "title"])),
            Condition::new()
                .like("title", "harry potter")
                .not(Condition::new().equal("author", "Lord Voldermort")),
            Some(OrderBy::desc("id")),
        );
        let decoded = FindQuery::from_json(&query.to_query_string()).unwrap();
        assert_eq!(decoded, query);

        let compiled = decoded.condition.compile();
        assert_eq!(compiled.text, "title LIKE ? AND NOT (author = ?)");
        assert_eq!(
            compiled.params,
            vec![Value::from("%harry potter%"), Value::from("Lord Voldermort")]
        );
    }

    #[test]
    fn test_serialized_keys() {
        let query = FindQuery::new(
            Some(fields(["title"])),
            Condition::new().equal("id", 2),
            Some(OrderBy::asc("title")),
        );
        let json: Json = serde_json::from_str(&query.to_query_string()).unwrap();
        assert_eq!(json["select"], serde_json::json!(["title"]));
        assert_eq!(json["where"]["o"], "AND");
        assert_eq!(json["order_by"], serde_json::json!({"field": "title", "desc": false}));
    }

    #[test]
    fn test_empty_parts_are_omitted() {
        assert_eq!(FindQuery::default().to_query_string(), "{}");
    }

    #[test]
    fn test_condition_error_is_reported_verbatim() {
        let err = FindQuery::from_json(r#"{"where":{"o":"AND","e":[{"o":"LIKE","f":"title","v":1000}]}}"#)
            .unwrap_err();
        assert!(matches!(err, ConditionError::UnsupportedTypeValue { ref value, .. } if value == "1000"));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            FindQuery::from_json("[1,2]"),
            Err(ConditionError::Malformed(_))
        ));
        assert!(matches!(
            FindQuery::from_json(r#"{"select":"title"}"#),
            Err(ConditionError::Malformed(_))
        ));
    }

    #[test]
    fn test_serde_deserialize_uses_same_rules() {
        let query: FindQuery =
            serde_json::from_str(r#"{"order_by":{"field":"id"}}"#).unwrap();
        assert_eq!(query.order_by, Some(OrderBy::asc("id")));

        let err = serde_json::from_str::<FindQuery>(r#"{"where":{"o":"XOR","e":[]}}"#).unwrap_err();
        assert!(err.to_string().contains("unsupported expression XOR"));
    }

    #[test]
    fn test_columns_lists_every_reference() {
        let query = FindQuery::new(
            Some(fields(["id"])),
            Condition::new().equal("author", "Herge"),
            Some(OrderBy::desc("title")),
        );
        let columns: Vec<_> = query.columns().collect();
        assert_eq!(columns, vec!["id", "author", "title"]);

        let unordered = FindQuery::new(None, Condition::new(), Some(OrderBy::asc("")));
        assert_eq!(unordered.columns().count(), 0);
    }
}
