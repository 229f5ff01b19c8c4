//! Compact JSON wire shape of a condition tree
//!
//! A combinator travels as `{"o": "AND", "e": [...]}` and a leaf as
//! `{"o": "LIKE", "f": "title", "v": "%potter%"}`. Decoding validates every
//! node and rejects the whole document on the first bad one. Values arriving
//! here are used verbatim: unlike [`Condition::like`], decoding never adds `%`
//! wildcards.

use serde::{
    de::Error as _,
    ser::{SerializeStruct, Serializer},
    Deserialize, Deserializer, Serialize,
};
use serde_json::Value as Json;

use super::{Combinator, Condition, ConditionError, LeafOperator, Node, Predicate, Value};

/// Generic view of a node before we know whether it is a leaf or a group
#[derive(Debug, Deserialize)]
struct WireNode {
    #[serde(default)]
    o: Option<String>,
    #[serde(default)]
    f: Option<String>,
    #[serde(default)]
    v: Json,
    #[serde(default)]
    e: Option<Vec<Json>>,
}

impl Condition {
    /// Decode a condition from its JSON text
    ///
    /// # Example
    ///
    /// ```rust
    /// use book_service::condition::Condition;
    ///
    /// let condition = Condition::from_json(
    ///     r#"{"o":"AND","e":[{"o":"ILIKE","f":"title","v":"%tintin%"}]}"#,
    /// ).unwrap();
    /// assert_eq!(condition.compile().text, "title ILIKE ?");
    ///
    /// let err = Condition::from_json(r#"{"o":"AND","e":[{"o":"LIKE","f":"title","v":1000}]}"#)
    ///     .unwrap_err();
    /// assert!(err.to_string().contains("unsupported type value 1000"));
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConditionError> {
        let value: Json = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Decode a condition from an already parsed JSON value
    ///
    /// The root defaults to `AND` when `o` is absent and may be empty.
    pub fn from_value(value: Json) -> Result<Self, ConditionError> {
        let raw = value.to_string();
        let node: WireNode = serde_json::from_value(value)?;

        let operator = match node.o.as_deref() {
            None => Combinator::And,
            Some(op) => Combinator::parse(op).ok_or_else(|| {
                ConditionError::UnsupportedExpression {
                    operator: op.to_string(),
                    raw: raw.clone(),
                }
            })?,
        };
        let children = node.e.unwrap_or_default();
        if operator == Combinator::Not && children.len() != 1 {
            return Err(ConditionError::UnsupportedExpression {
                operator: operator.to_string(),
                raw,
            });
        }

        Ok(Self {
            operator,
            entries: decode_entries(children)?,
        })
    }
}

fn decode_entries(children: Vec<Json>) -> Result<Vec<Node>, ConditionError> {
    children.into_iter().map(decode_entry).collect()
}

fn decode_entry(value: Json) -> Result<Node, ConditionError> {
    let raw = value.to_string();
    let node: WireNode = serde_json::from_value(value)
        .map_err(|e| ConditionError::Malformed(format!("{e}: {raw}")))?;
    let op = node.o.unwrap_or_default();

    if let Some(children) = node.e {
        let accepted = match Combinator::parse(&op) {
            Some(c @ (Combinator::And | Combinator::Or)) if !children.is_empty() => Some(c),
            Some(Combinator::Not) if children.len() == 1 => Some(Combinator::Not),
            _ => None,
        };
        let Some(operator) = accepted else {
            return Err(ConditionError::UnsupportedExpression { operator: op, raw });
        };
        return Ok(Node::Group(Condition {
            operator,
            entries: decode_entries(children)?,
        }));
    }

    let Some(operator) = LeafOperator::parse(&op) else {
        return Err(ConditionError::UnsupportedExpression { operator: op, raw });
    };
    let value = match (operator, node.v) {
        (_, Json::String(s)) => Value::Text(s),
        (LeafOperator::Equal, Json::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Integer(i),
            (None, Some(f)) => Value::Float(f),
            (None, None) => {
                return Err(ConditionError::UnsupportedTypeValue {
                    value: n.to_string(),
                    raw,
                })
            }
        },
        (_, other) => {
            return Err(ConditionError::UnsupportedTypeValue {
                value: other.to_string(),
                raw,
            })
        }
    };
    let field = node.f.unwrap_or_default();
    if field.is_empty() {
        return Err(ConditionError::UnsupportedExpression { operator: op, raw });
    }

    Ok(Node::Leaf(Predicate {
        field,
        operator,
        value,
    }))
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Condition", 2)?;
        state.serialize_field("o", self.operator.as_str())?;
        state.serialize_field("e", &self.entries)?;
        state.end()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(predicate) => predicate.serialize(serializer),
            Self::Group(condition) => condition.serialize(serializer),
        }
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Predicate", 3)?;
        state.serialize_field("o", self.operator.as_str())?;
        state.serialize_field("f", &self.field)?;
        state.serialize_field("v", &self.value)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Json::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_trip(condition: &Condition) -> Condition {
        let text = serde_json::to_string_pretty(condition).unwrap();
        Condition::from_json(&text).unwrap()
    }

    #[test]
    fn test_serialize_shape() {
        let condition = Condition::new()
            .like("title", "harry potter")
            .not(Condition::new().equal("author", "Lord Voldermort"));
        assert_eq!(
            serde_json::to_value(&condition).unwrap(),
            json!({
                "o": "AND",
                "e": [
                    {"o": "LIKE", "f": "title", "v": "%harry potter%"},
                    {"o": "NOT", "e": [
                        {"o": "AND", "e": [{"o": "=", "f": "author", "v": "Lord Voldermort"}]}
                    ]}
                ]
            })
        );
    }

    #[test]
    fn test_round_trip_simple() {
        let condition = Condition::new().like("title", "harry potter");
        assert_eq!(round_trip(&condition), condition);
    }

    #[test]
    fn test_round_trip_not() {
        let condition = Condition::new()
            .like("title", "harry potter")
            .not(Condition::new().equal("author", "Lord Voldermort"));
        assert_eq!(round_trip(&condition), condition);
    }

    #[test]
    fn test_round_trip_or() {
        let condition = Condition::new().like("title", "harry potter").or(Condition::new()
            .equal("author", "Lord Voldermort")
            .equal("author", "Tom Malvolo Riddle"));
        assert_eq!(round_trip(&condition), condition);
    }

    #[test]
    fn test_round_trip_numbers_and_nesting() {
        let condition = Condition::new()
            .equal("id", 7)
            .equal("rating", 4.5)
            .ilike("summary", "boy")
            .or(Condition::new()
                .equal("author", "Herge")
                .not(Condition::new().like("title", "Tibet")));
        assert_eq!(round_trip(&condition), condition);
    }

    #[test]
    fn test_round_trip_with_empty_subtrees() {
        let condition = Condition::new()
            .equal("id", 1)
            .or(Condition::new())
            .not(Condition::new().or(Condition::new()));
        assert_eq!(
            serde_json::to_string(&condition).unwrap(),
            r#"{"o":"AND","e":[{"o":"=","f":"id","v":1}]}"#
        );
        assert_eq!(round_trip(&condition), condition);
    }

    #[test]
    fn test_round_trip_empty() {
        let condition = Condition::new();
        assert_eq!(serde_json::to_string(&condition).unwrap(), r#"{"o":"AND","e":[]}"#);
        assert_eq!(round_trip(&condition), condition);
    }

    #[test]
    fn test_decoded_like_is_verbatim() {
        let condition =
            Condition::from_json(r#"{"o":"AND","e":[{"o":"LIKE","f":"title","v":"Tintin"}]}"#)
                .unwrap();
        let compiled = condition.compile();
        assert_eq!(compiled.params, vec![Value::from("Tintin")]);
    }

    #[test]
    fn test_rejects_like_number() {
        let err = Condition::from_json(
            r#"{
                "o": "AND",
                "e": [
                    {"o": "LIKE", "f": "title", "v": 1000},
                    {"o": "OR", "e": [
                        {"o": "=", "f": "author", "v": "Lord Voldermort"},
                        {"o": "=", "f": "author", "v": "Tom Malvolo Riddle"}
                    ]}
                ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConditionError::UnsupportedTypeValue { .. }));
        assert!(err.to_string().contains("unsupported type value 1000"));
        assert!(err.to_string().contains(r#""f":"title""#));
    }

    #[test]
    fn test_rejects_equal_object() {
        let err = Condition::from_value(json!({
            "o": "AND",
            "e": [{"o": "=", "f": "title", "v": {"low": 1, "high": 100}}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("unsupported type value"));
        assert!(err.to_string().contains(r#"{"high":100,"low":1}"#));
    }

    #[test]
    fn test_rejects_equal_bool_and_missing_value() {
        for v in [json!(true), json!(null), json!(["a"])] {
            let err = Condition::from_value(json!({
                "o": "AND",
                "e": [{"o": "=", "f": "title", "v": v}]
            }))
            .unwrap_err();
            assert!(matches!(err, ConditionError::UnsupportedTypeValue { .. }), "{err}");
        }
    }

    #[test]
    fn test_rejects_not_with_two_children() {
        let err = Condition::from_value(json!({
            "o": "AND",
            "e": [{"o": "NOT", "e": [
                {"o": "=", "f": "author", "v": "Lord Voldermort"},
                {"o": "=", "f": "author", "v": "Tom Malvolo Riddle"}
            ]}]
        }))
        .unwrap_err();
        assert!(err.to_string().starts_with("unsupported expression NOT"));
    }

    #[test]
    fn test_rejects_empty_nested_groups() {
        for op in ["AND", "OR", "NOT"] {
            let err = Condition::from_value(json!({"o": "AND", "e": [{"o": op, "e": []}]}))
                .unwrap_err();
            assert!(
                err.to_string().starts_with(&format!("unsupported expression {op}")),
                "{err}"
            );
        }
    }

    #[test]
    fn test_rejects_unknown_operators() {
        let err = Condition::from_value(json!({
            "o": "AND",
            "e": [{"o": ">", "f": "id", "v": 3}]
        }))
        .unwrap_err();
        assert!(err.to_string().starts_with("unsupported expression >"));

        let err = Condition::from_value(json!({
            "o": "AND",
            "e": [{"o": "XOR", "e": [{"o": "=", "f": "id", "v": 3}]}]
        }))
        .unwrap_err();
        assert!(err.to_string().starts_with("unsupported expression XOR"));
    }

    #[test]
    fn test_rejects_empty_field() {
        let err = Condition::from_value(json!({"e": [{"o": "=", "f": "", "v": 3}]})).unwrap_err();
        assert!(matches!(err, ConditionError::UnsupportedExpression { .. }));
    }

    #[test]
    fn test_rejects_non_object_entry() {
        let err = Condition::from_value(json!({"o": "AND", "e": ["title"]})).unwrap_err();
        assert!(matches!(err, ConditionError::Malformed(_)));
    }

    #[test]
    fn test_root_defaults_and_validation() {
        let condition = Condition::from_value(json!({})).unwrap();
        assert_eq!(condition, Condition::new());

        let condition =
            Condition::from_value(json!({"o": "OR", "e": [{"o": "=", "f": "id", "v": 1}]})).unwrap();
        assert_eq!(condition.operator(), Combinator::Or);

        assert!(Condition::from_value(json!({"o": "NOT", "e": []})).is_err());
        assert!(Condition::from_value(json!({"o": "=", "e": []})).is_err());
    }

    #[test]
    fn test_deserialize_impl_surfaces_message() {
        let err = serde_json::from_str::<Condition>(
            r#"{"o":"AND","e":[{"o":"NOT","e":[{"o":"=","f":"a","v":1},{"o":"=","f":"b","v":2}]}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported expression NOT"));
    }

    #[test]
    fn test_not_with_leaf_child_is_accepted() {
        let condition = Condition::from_value(json!({
            "o": "AND",
            "e": [{"o": "NOT", "e": [{"o": "=", "f": "author", "v": "Herge"}]}]
        }))
        .unwrap();
        assert_eq!(condition.compile().text, "NOT (author = ?)");
    }
}
