//! # Display Data Model
//!
//! The normalized shapes handed to templates. `CardValue` is a closed union of
//! the scalars a card can show; anything else a template needs travels in the
//! free-form `fields` map.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// A merged, not yet normalized JSON object.
pub type RawRecord = Map<String, Value>;

/// Strings longer than this many characters are shortened.
pub const MAX_VALUE_CHARS: usize = 20;
/// Characters kept from a shortened string, before the ellipsis.
pub const TRUNCATED_CHARS: usize = 17;
/// Appended to shortened strings.
pub const ELLIPSIS: &str = "...";

/// # Card Value
///
/// The scalar shown on a card. Strings are shortened at construction time,
/// booleans display as `Yes`/`No` and a missing value displays as `N/A`.
#[derive(Debug, Clone, PartialEq)]
pub enum CardValue {
    Number(Number),
    Text(String),
    Bool(bool),
    Null,
}

impl CardValue {
    /// Converts an arbitrary JSON value, applying the display formatting rules.
    /// Arrays and objects are flattened to their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CardValue::Null,
            Value::Bool(b) => CardValue::Bool(*b),
            Value::Number(n) => CardValue::Number(n.clone()),
            Value::String(s) => CardValue::Text(truncate_display(s)),
            other => CardValue::Text(truncate_display(&other.to_string())),
        }
    }

    pub fn text(s: &str) -> Self {
        CardValue::Text(truncate_display(s))
    }

    /// Whether the raw JSON is a scalar that can become a synthesized card.
    pub fn is_scalar(value: &Value) -> bool {
        !matches!(value, Value::Array(_) | Value::Object(_))
    }
}

impl fmt::Display for CardValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardValue::Number(n) => write!(f, "{}", n),
            CardValue::Text(s) => f.write_str(s),
            CardValue::Bool(true) => f.write_str("Yes"),
            CardValue::Bool(false) => f.write_str("No"),
            CardValue::Null => f.write_str("N/A"),
        }
    }
}

// Numbers stay numeric for templates; every other variant is its display text.
impl Serialize for CardValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CardValue::Number(n) => n.serialize(serializer),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Shortens `s` to 17 characters plus `...` when it exceeds 20 characters.
pub fn truncate_display(s: &str) -> String {
    if s.chars().count() > MAX_VALUE_CHARS {
        let mut short: String = s.chars().take(TRUNCATED_CHARS).collect();
        short.push_str(ELLIPSIS);
        short
    } else {
        s.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Neutral,
}

impl Trend {
    /// Unknown or missing trend names fall back to `Neutral`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("up") => Trend::Up,
            Some("down") => Trend::Down,
            _ => Trend::Neutral,
        }
    }
}

/// # Card
///
/// One tile of a dashboard view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub label: String,
    pub value: CardValue,
    pub unit: String,
    pub trend: Trend,
}

impl Card {
    /// The filler card used to reach the minimum card count.
    pub fn placeholder() -> Self {
        Self {
            label: "Placeholder".to_string(),
            value: CardValue::Text("N/A".to_string()),
            unit: String::new(),
            trend: Trend::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub text: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// # Display Record
///
/// The normalized, bounded record a template is bound against. Rebuilt from
/// the sources on every render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRecord {
    pub title: String,
    pub timestamp: String,
    /// Always between 2 and 4 entries.
    pub cards: Vec<Card>,
    pub tasks: Vec<Task>,
    /// Extra keys passed through verbatim for templates.
    pub fields: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn long_strings_are_cut_to_twenty_chars() {
        let value = CardValue::from_json(&json!("abcdefghijklmnopqrstuvwxyz"));
        let shown = value.to_string();
        assert_eq!(shown, "abcdefghijklmnopq...");
        assert_eq!(shown.chars().count(), 20);
    }

    #[test]
    fn twenty_char_strings_are_untouched() {
        let s = "abcdefghijklmnopqrst";
        assert_eq!(CardValue::from_json(&json!(s)).to_string(), s);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let s = "°°°°°°°°°°°°°°°°°°°°°°°°";
        let shown = truncate_display(s);
        assert_eq!(shown.chars().count(), 20);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn booleans_and_null_have_display_text() {
        assert_eq!(CardValue::from_json(&json!(true)).to_string(), "Yes");
        assert_eq!(CardValue::from_json(&json!(false)).to_string(), "No");
        assert_eq!(CardValue::from_json(&Value::Null).to_string(), "N/A");
    }

    #[test]
    fn numbers_serialize_as_numbers() {
        let card = Card {
            label: "Temp".into(),
            value: CardValue::from_json(&json!(72.5)),
            unit: "°F".into(),
            trend: Trend::Up,
        };
        let v = serde_json::to_value(&card).unwrap();
        assert_eq!(v["value"], json!(72.5));
        assert_eq!(v["trend"], json!("up"));
    }

    #[test]
    fn booleans_serialize_as_yes_no() {
        let v = serde_json::to_value(CardValue::Bool(true)).unwrap();
        assert_eq!(v, json!("Yes"));
    }

    #[test]
    fn nested_values_are_flattened_to_text() {
        let value = CardValue::from_json(&json!({"a": 1}));
        assert_eq!(value, CardValue::Text("{\"a\":1}".to_string()));
    }

    #[test]
    fn unknown_trend_is_neutral() {
        assert_eq!(Trend::parse(Some("UP")), Trend::Up);
        assert_eq!(Trend::parse(Some("down")), Trend::Down);
        assert_eq!(Trend::parse(Some("sideways")), Trend::Neutral);
        assert_eq!(Trend::parse(None), Trend::Neutral);
    }
}
