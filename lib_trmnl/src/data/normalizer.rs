//! # Data Normalizer
//!
//! Turns one or more raw JSON objects into a [`DisplayRecord`].
//!
//! ## Rules
//!
//! - **Merge**: sources are applied in order, later keys overwrite earlier
//!   ones (shallow, per top-level key).
//! - **Cards**: taken from a `cards` array when it yields any card; otherwise
//!   synthesized from the remaining top-level scalars (up to 4) with a
//!   humanized label.
//! - **Bounds**: padded with placeholders to 2 cards, truncated to 4.
//! - **Fields**: the contents of a `fields` object when present, otherwise
//!   every top-level key that is not reserved.
//!
//! No I/O happens here; sources arrive already parsed.

use chrono::Local;
use serde_json::{Map, Value};

use super::model::{Card, CardValue, DisplayRecord, RawRecord, Task, Trend};

pub const DEFAULT_TITLE: &str = "TRMNL Dashboard";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const MIN_CARDS: usize = 2;
pub const MAX_CARDS: usize = 4;

/// Keys never copied into `fields`.
const RESERVED_KEYS: [&str; 5] = ["title", "timestamp", "tasks", "cards", "fields"];
/// Keys never turned into synthesized cards.
const NON_CARD_KEYS: [&str; 3] = ["title", "timestamp", "cards"];

/// Shallow merge, last write wins per top-level key.
pub fn merge_sources<I>(sources: I) -> RawRecord
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut merged = RawRecord::new();
    for source in sources {
        for (key, value) in source {
            merged.insert(key, value);
        }
    }
    merged
}

/// Merges `sources` in order and normalizes the result.
pub fn normalize(sources: Vec<RawRecord>) -> DisplayRecord {
    normalize_record(&merge_sources(sources))
}

/// Normalizes an already merged record.
pub fn normalize_record(raw: &RawRecord) -> DisplayRecord {
    let title = raw
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_TITLE)
        .to_string();
    let timestamp = raw
        .get("timestamp")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Local::now().format(TIMESTAMP_FORMAT).to_string());

    let mut cards = extract_cards(raw);
    if cards.is_empty() {
        cards = synthesize_cards(raw);
    }
    while cards.len() < MIN_CARDS {
        cards.push(Card::placeholder());
    }
    cards.truncate(MAX_CARDS);

    DisplayRecord {
        title,
        timestamp,
        cards,
        tasks: extract_tasks(raw),
        fields: extract_fields(raw),
    }
}

fn extract_cards(raw: &RawRecord) -> Vec<Card> {
    let Some(Value::Array(items)) = raw.get("cards") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|card| Card {
            label: string_or(card, "label", "N/A"),
            value: card
                .get("value")
                .map(CardValue::from_json)
                .unwrap_or(CardValue::Null),
            unit: string_or(card, "unit", ""),
            trend: Trend::parse(card.get("trend").and_then(Value::as_str)),
        })
        .collect()
}

fn synthesize_cards(raw: &RawRecord) -> Vec<Card> {
    raw.iter()
        .filter(|(key, value)| !NON_CARD_KEYS.contains(&key.as_str()) && CardValue::is_scalar(value))
        .take(MAX_CARDS)
        .map(|(key, value)| Card {
            label: humanize_label(key),
            value: CardValue::from_json(value),
            unit: String::new(),
            trend: Trend::Neutral,
        })
        .collect()
}

fn extract_tasks(raw: &RawRecord) -> Vec<Task> {
    let Some(Value::Array(items)) = raw.get("tasks") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|task| Task {
            text: string_or(task, "text", ""),
            completed: task.get("completed").and_then(Value::as_bool).unwrap_or(false),
            category: task
                .get("category")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        })
        .collect()
}

fn extract_fields(raw: &RawRecord) -> Map<String, Value> {
    if let Some(Value::Object(fields)) = raw.get("fields") {
        return fields.clone();
    }
    raw.iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn string_or(map: &Map<String, Value>, key: &str, default: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Turns `snake_case`, `camelCase` and `PascalCase` keys into `Title Case`
/// words: `cpu_temp` → `Cpu Temp`, `diskUsage` → `Disk Usage`,
/// `HTTPStatus` → `Http Status`.
pub fn humanize_label(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if !prev.is_uppercase() || next_is_lower {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    if words.is_empty() {
        return key.to_string();
    }
    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn later_source_wins_on_collision() {
        let merged = merge_sources(vec![
            record(json!({"k": 1, "a": "first"})),
            record(json!({"k": 2})),
        ]);
        assert_eq!(merged["k"], json!(2));
        assert_eq!(merged["a"], json!("first"));

        let reversed = merge_sources(vec![record(json!({"k": 2})), record(json!({"k": 1}))]);
        assert_eq!(reversed["k"], json!(1));
    }

    #[test]
    fn merge_is_shallow() {
        let merged = merge_sources(vec![
            record(json!({"fields": {"a": 1, "b": 2}})),
            record(json!({"fields": {"c": 3}})),
        ]);
        assert_eq!(merged["fields"], json!({"c": 3}));
    }

    #[test]
    fn empty_input_pads_to_two_placeholders() {
        let out = normalize(vec![]);
        assert_eq!(out.title, DEFAULT_TITLE);
        assert_eq!(out.cards.len(), 2);
        for card in &out.cards {
            assert_eq!(card.label, "Placeholder");
            assert_eq!(card.value.to_string(), "N/A");
            assert_eq!(card.unit, "");
            assert_eq!(card.trend, Trend::Neutral);
        }
    }

    #[test]
    fn default_timestamp_uses_local_format() {
        let out = normalize(vec![]);
        assert_eq!(out.timestamp.len(), 19);
        assert!(chrono::NaiveDateTime::parse_from_str(&out.timestamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn single_card_gets_one_placeholder() {
        let out = normalize(vec![record(json!({
            "cards": [{"label": "Temp", "value": 72.5, "unit": "°F", "trend": "up"}]
        }))]);
        assert_eq!(out.cards.len(), 2);
        assert_eq!(out.cards[0].label, "Temp");
        assert_eq!(out.cards[0].value.to_string(), "72.5");
        assert_eq!(out.cards[0].unit, "°F");
        assert_eq!(out.cards[0].trend, Trend::Up);
        assert_eq!(out.cards[1], Card::placeholder());
    }

    #[test]
    fn card_sub_fields_default() {
        let out = normalize(vec![record(json!({"cards": [{}, {"label": 5}]}))]);
        assert_eq!(out.cards[0].label, "N/A");
        assert_eq!(out.cards[0].value, CardValue::Null);
        assert_eq!(out.cards[0].unit, "");
        assert_eq!(out.cards[1].label, "N/A");
    }

    #[test]
    fn more_than_four_cards_are_truncated() {
        let cards: Vec<Value> = (0..7).map(|i| json!({"label": format!("c{i}"), "value": i})).collect();
        let out = normalize(vec![record(json!({ "cards": cards }))]);
        assert_eq!(out.cards.len(), 4);
        assert_eq!(out.cards[3].label, "c3");
    }

    #[test]
    fn scalars_become_cards_when_no_cards_array() {
        let out = normalize(vec![record(json!({
            "title": "Home",
            "cpu_temp": 51,
            "diskUsage": "42%",
            "online": true,
            "tasks": [{"text": "x"}]
        }))]);
        assert_eq!(out.title, "Home");
        let labels: Vec<_> = out.cards.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Cpu Temp", "Disk Usage", "Online"]);
        assert_eq!(out.cards[2].value.to_string(), "Yes");
    }

    #[test]
    fn synthesis_stops_at_four() {
        let out = normalize(vec![record(json!({
            "a": 1, "b": 2, "c": 3, "d": 4, "e": 5, "f": 6
        }))]);
        assert_eq!(out.cards.len(), 4);
        assert_eq!(out.cards[0].label, "A");
    }

    #[test]
    fn empty_cards_array_falls_back_to_synthesis() {
        let out = normalize(vec![record(json!({"cards": [], "uptime": "3d"}))]);
        assert_eq!(out.cards[0].label, "Uptime");
        assert_eq!(out.cards[1], Card::placeholder());
    }

    #[test]
    fn synthesized_strings_are_truncated() {
        let out = normalize(vec![record(json!({"motd": "a very long message of the day indeed"}))]);
        assert_eq!(out.cards[0].value.to_string(), "a very long messa...");
    }

    #[test]
    fn nested_fields_object_wins() {
        let out = normalize(vec![record(json!({
            "title": "T",
            "extra": 1,
            "fields": {"SampleField": 42}
        }))]);
        assert_eq!(out.fields.len(), 1);
        assert_eq!(out.fields["SampleField"], json!(42));
    }

    #[test]
    fn top_level_keys_fill_fields_without_reserved_ones() {
        let out = normalize(vec![record(json!({
            "title": "T",
            "timestamp": "now",
            "tasks": [],
            "cards": [],
            "weather": {"temp": 3},
            "city": "Oslo"
        }))]);
        assert_eq!(out.timestamp, "now");
        let keys: Vec<_> = out.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["weather", "city"]);
    }

    #[test]
    fn tasks_are_extracted_with_defaults() {
        let out = normalize(vec![record(json!({
            "tasks": [
                {"text": "Buy milk", "completed": true, "category": "home"},
                {"text": "Call Sam"},
                {"completed": true, "category": ""},
                "not a task"
            ]
        }))]);
        assert_eq!(out.tasks.len(), 3);
        assert_eq!(out.tasks[0].category.as_deref(), Some("home"));
        assert!(!out.tasks[1].completed);
        assert_eq!(out.tasks[2].text, "");
        assert_eq!(out.tasks[2].category, None);
    }

    #[test]
    fn card_count_is_always_bounded() {
        let inputs = vec![
            json!({}),
            json!({"cards": "not an array"}),
            json!({"cards": [1, 2, 3]}),
            json!({"x": [1], "y": {"z": 1}}),
            json!({"a": 1}),
            json!({"cards": [{}, {}, {}, {}, {}, {}]}),
        ];
        for input in inputs {
            let out = normalize(vec![record(input.clone())]);
            assert!(
                (MIN_CARDS..=MAX_CARDS).contains(&out.cards.len()),
                "{} produced {} cards",
                input,
                out.cards.len()
            );
        }
    }

    #[test]
    fn labels_are_humanized() {
        assert_eq!(humanize_label("cpu_temp"), "Cpu Temp");
        assert_eq!(humanize_label("diskUsage"), "Disk Usage");
        assert_eq!(humanize_label("HTTPStatus"), "Http Status");
        assert_eq!(humanize_label("Battery"), "Battery");
        assert_eq!(humanize_label("room_2_temp"), "Room 2 Temp");
        assert_eq!(humanize_label("__"), "__");
    }
}
