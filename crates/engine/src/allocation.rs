use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Portfolio weights of one rebalance. Magnitudes only — the weights are not
/// required to sum to 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Allocation {
    pub stocks: f64,
    pub bonds: f64,
    pub gold: f64,
    pub cash: f64,
}

/// Ordered decoder attempts for textual allocation values. Each attempt is
/// total; the first success wins. A third legacy format slots in here.
const TEXT_DECODERS: &[fn(&str) -> Option<Allocation>] =
    &[decode_strict_json, decode_single_quoted];

/// Decodes an allocation field of unknown shape: an already-structured
/// record passes through shape-checked, text goes through the textual
/// decoders, anything else is absent.
pub fn decode_allocation(value: &Value) -> Option<Allocation> {
    match value {
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        Value::String(text) => decode_allocation_text(text),
        _ => None,
    }
}

/// Decodes a textual allocation value. Tolerates the single-quoted
/// dict-literal form some upstream serializers emit alongside strict JSON.
/// Undecodable input is absent, never an error.
pub fn decode_allocation_text(text: &str) -> Option<Allocation> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    TEXT_DECODERS.iter().find_map(|decode| decode(trimmed))
}

fn decode_strict_json(text: &str) -> Option<Allocation> {
    decode_object(serde_json::from_str(text).ok()?)
}

fn decode_single_quoted(text: &str) -> Option<Allocation> {
    decode_object(serde_json::from_str(&text.replace('\'', "\"")).ok()?)
}

fn decode_object(value: Value) -> Option<Allocation> {
    match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{decode_allocation, decode_allocation_text, Allocation};

    #[test]
    fn structured_records_pass_through_with_absent_weights_defaulting_to_zero() {
        let decoded = decode_allocation(&json!({ "stocks": 55 })).unwrap();

        assert_eq!(
            decoded,
            Allocation {
                stocks: 55.0,
                ..Allocation::default()
            }
        );
    }

    #[test]
    fn structured_records_ignore_unknown_keys() {
        let decoded = decode_allocation(&json!({ "bonds": 20, "note": "ladder" })).unwrap();

        assert_eq!(decoded.bonds, 20.0);
    }

    #[test]
    fn strict_json_text_decodes() {
        let decoded = decode_allocation_text("{\"bonds\": 20}").unwrap();

        assert_eq!(decoded.bonds, 20.0);
    }

    #[test]
    fn single_quoted_dict_text_decodes_on_the_second_attempt() {
        let decoded = decode_allocation_text("{'cash': 10}").unwrap();

        assert_eq!(decoded.cash, 10.0);
    }

    #[test]
    fn full_single_quoted_dict_decodes_every_weight() {
        let decoded =
            decode_allocation_text("{'stocks': 55, 'bonds': 25, 'gold': 10, 'cash': 10}").unwrap();

        assert_eq!(
            decoded,
            Allocation {
                stocks: 55.0,
                bonds: 25.0,
                gold: 10.0,
                cash: 10.0,
            }
        );
    }

    #[test]
    fn undecodable_text_is_absent() {
        assert_eq!(decode_allocation_text("not json"), None);
        assert_eq!(decode_allocation_text("[1, 2]"), None);
        assert_eq!(decode_allocation_text("42"), None);
    }

    #[test]
    fn empty_and_whitespace_text_is_absent() {
        assert_eq!(decode_allocation_text(""), None);
        assert_eq!(decode_allocation_text("   "), None);
    }

    #[test]
    fn non_record_values_are_absent() {
        assert_eq!(decode_allocation(&json!(null)), None);
        assert_eq!(decode_allocation(&json!(7)), None);
        assert_eq!(decode_allocation(&json!([{ "stocks": 55 }])), None);
    }
}
