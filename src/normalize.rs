// =============================================================================
// NORMALIZE MODULE
// =============================================================================
// Turns one raw storage API record into the canonical `Item`.
//
// The storage API is not trusted to send every field, or to send fields with
// the right JSON type. Counters arrive as numbers or as strings, ids may be
// missing, text fields may be null. Nothing here returns an error: every
// absent or malformed field falls back to a default so that one bad record
// never breaks the whole batch.
// =============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::models::Item;

// -----------------------------------------------------------------------------
// RAW RECORD
// -----------------------------------------------------------------------------
/// Storage API record exactly as received.
///
/// Every field is an untyped `Value` so that deserialization itself can never
/// reject a record. Field names follow the upstream camelCase payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawItem {
    pub id: Option<Value>,
    pub name: Option<Value>,
    pub article: Option<Value>,
    pub shk: Option<Value>,
    /// Total item count in the cell
    pub place_qnt: Option<Value>,
    /// Items per nesting unit
    pub product_qnt: Option<Value>,
    pub wr_shk: Option<Value>,
    #[serde(rename = "name_wr_shk")]
    pub name_wr_shk: Option<Value>,
    /// Upstream spells the warehouse id this way
    pub id_scklad: Option<Value>,
    pub prunit_name: Option<Value>,
    pub condition_state: Option<Value>,
    pub reason: Option<Value>,
    pub expiration_date: Option<Value>,
    pub create_date: Option<Value>,
    pub update_date: Option<Value>,
    pub executor: Option<Value>,
}

impl RawItem {
    /// Parse any JSON value into a raw record.
    ///
    /// Non-object values (or objects whose shape serde still refuses) give an
    /// empty record, which normalizes to an all-default `Item`.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

// -----------------------------------------------------------------------------
// DERIVED QUANTITIES
// -----------------------------------------------------------------------------
/// The three quantity columns derived from the two raw counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantities {
    /// Number of nesting units
    pub quantity: i64,
    /// Items per nesting unit
    pub nested_quantity: i64,
    /// Total item count
    pub product_qnt: i64,
}

/// Derive the quantity columns from `placeQnt` and `productQnt`.
///
/// Only when both counters are positive is the number of nesting units
/// computed. Otherwise `quantity` stays 0 and the raw counters are passed
/// through as they are, zero or negative included.
pub fn derive_quantities(place_qnt: i64, product_qnt: i64) -> Quantities {
    if place_qnt > 0 && product_qnt > 0 {
        Quantities {
            // both operands positive: integer division is floor
            quantity: place_qnt / product_qnt,
            nested_quantity: product_qnt,
            product_qnt: place_qnt,
        }
    } else {
        Quantities {
            quantity: 0,
            nested_quantity: product_qnt,
            product_qnt: place_qnt,
        }
    }
}

// -----------------------------------------------------------------------------
// NORMALIZE
// -----------------------------------------------------------------------------
/// Build the canonical `Item` from a raw record.
///
/// # Example
/// ```ignore
/// let raw = RawItem::from_value(json!({"placeQnt": "120", "productQnt": 12}));
/// let item = normalize_item(raw);
/// assert_eq!(item.quantity, 10);
/// ```
pub fn normalize_item(raw: RawItem) -> Item {
    let Quantities {
        quantity,
        nested_quantity,
        product_qnt,
    } = derive_quantities(
        counter(raw.place_qnt.as_ref()),
        counter(raw.product_qnt.as_ref()),
    );

    Item {
        id: optional_integer(raw.id.as_ref()),
        name: text(raw.name.as_ref()),
        article: text(raw.article.as_ref()),
        shk: text(raw.shk.as_ref()),
        quantity,
        nested_quantity,
        product_qnt,
        wr_shk: text(raw.wr_shk.as_ref()),
        wr_name: text(raw.name_wr_shk.as_ref()),
        id_sklad: optional_integer(raw.id_scklad.as_ref()),
        prunit_name: text(raw.prunit_name.as_ref()),
        condition_state: text(raw.condition_state.as_ref()),
        reason: text(raw.reason.as_ref()),
        // kept verbatim, including the 2999-01-01 "no expiration" sentinel
        expiration_date: match raw.expiration_date {
            Some(Value::String(date)) => Some(date),
            _ => None,
        },
        create_date: text(raw.create_date.as_ref()),
        update_date: text(raw.update_date.as_ref()),
        executor: text(raw.executor.as_ref()),
    }
}

/// Normalize a whole upstream batch, preserving order.
pub fn normalize_batch(values: Vec<Value>) -> Vec<Item> {
    values
        .into_iter()
        .map(|value| normalize_item(RawItem::from_value(value)))
        .collect()
}

// =============================================================================
// FIELD COERCION HELPERS
// =============================================================================

/// String fields: strings as-is, numbers and booleans stringified, anything
/// else (null, missing, arrays, objects) becomes "".
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Raw counters: integer numbers, truncated floats, or the leading integer of
/// a string ("12 pcs" -> 12). Everything unparsable is 0.
fn counter(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => number_to_i64(n).unwrap_or(0),
        Some(Value::String(s)) => leading_integer(s).unwrap_or(0),
        _ => 0,
    }
}

/// Identity fields: integer numbers or numeric strings, otherwise absent.
fn optional_integer(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => number_to_i64(n),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_to_i64(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

/// Parses an optional sign followed by decimal digits after leading
/// whitespace, ignoring whatever follows the digits.
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Value) -> Item {
        normalize_item(RawItem::from_value(value))
    }

    #[test]
    fn test_both_counters_positive_derives_units() {
        for (place, product) in [(120, 12), (7, 2), (1, 1), (5, 10), (99_999, 7)] {
            let item = normalize(json!({ "placeQnt": place, "productQnt": product }));
            assert_eq!(item.quantity, place / product);
            assert_eq!(item.nested_quantity, product);
            assert_eq!(item.product_qnt, place);
        }
    }

    #[test]
    fn test_zero_or_absent_counter_gives_zero_quantity() {
        let cases = [
            json!({ "placeQnt": 0, "productQnt": 12 }),
            json!({ "placeQnt": 40, "productQnt": 0 }),
            json!({ "placeQnt": 40 }),
            json!({ "productQnt": 12 }),
            json!({}),
        ];
        for case in cases {
            assert_eq!(normalize(case).quantity, 0);
        }
    }

    #[test]
    fn test_else_branch_passes_raw_counters_through() {
        let item = normalize(json!({ "placeQnt": 40, "productQnt": 0 }));
        assert_eq!(item.product_qnt, 40);
        assert_eq!(item.nested_quantity, 0);

        let q = derive_quantities(-3, 5);
        assert_eq!(q, Quantities { quantity: 0, nested_quantity: 5, product_qnt: -3 });
    }

    #[test]
    fn test_empty_record_defaults_everything() {
        let item = normalize(json!({}));
        assert_eq!(item.id, None);
        assert_eq!(item.id_sklad, None);
        assert_eq!(item.expiration_date, None);
        assert_eq!(item.quantity, 0);
        assert_eq!(item.nested_quantity, 0);
        assert_eq!(item.product_qnt, 0);
        for field in [
            &item.name,
            &item.article,
            &item.shk,
            &item.wr_shk,
            &item.wr_name,
            &item.prunit_name,
            &item.condition_state,
            &item.reason,
            &item.create_date,
            &item.update_date,
            &item.executor,
        ] {
            assert_eq!(field, "");
        }
    }

    #[test]
    fn test_non_object_record_still_normalizes() {
        let item = normalize(json!("not a record"));
        assert_eq!(item.name, "");
        assert_eq!(item.quantity, 0);

        let item = normalize(Value::Null);
        assert_eq!(item.product_qnt, 0);
    }

    #[test]
    fn test_stringly_typed_counters() {
        let item = normalize(json!({ "placeQnt": "120", "productQnt": " 12" }));
        assert_eq!(item.quantity, 10);

        let item = normalize(json!({ "placeQnt": "48 шт", "productQnt": "6.5" }));
        assert_eq!(item.product_qnt, 48);
        assert_eq!(item.nested_quantity, 6);
        assert_eq!(item.quantity, 8);

        let item = normalize(json!({ "placeQnt": "abc", "productQnt": "12" }));
        assert_eq!(item.quantity, 0);
        assert_eq!(item.product_qnt, 0);
        assert_eq!(item.nested_quantity, 12);
    }

    #[test]
    fn test_field_mapping_from_upstream_names() {
        let item = normalize(json!({
            "id": 17,
            "name": "Болт М8",
            "article": "A-100",
            "shk": "4600000000017",
            "wrShk": "C-01-02",
            "name_wr_shk": "Стеллаж 1",
            "idScklad": "1383",
            "prunitName": "шт",
            "conditionState": "Некондиция",
            "reason": "R1",
            "createDate": "2024-03-01T10:00:00",
            "updateDate": "2024-03-02T11:30:00",
            "executor": "ivanov"
        }));
        assert_eq!(item.id, Some(17));
        assert_eq!(item.name, "Болт М8");
        assert_eq!(item.wr_shk, "C-01-02");
        assert_eq!(item.wr_name, "Стеллаж 1");
        assert_eq!(item.id_sklad, Some(1383));
        assert_eq!(item.prunit_name, "шт");
        assert_eq!(item.condition_state, "Некондиция");
        assert_eq!(item.create_date, "2024-03-01T10:00:00");
        assert_eq!(item.executor, "ivanov");
    }

    #[test]
    fn test_null_and_numeric_text_fields() {
        let item = normalize(json!({ "name": null, "shk": 4600000000017_i64, "id": "x" }));
        assert_eq!(item.name, "");
        assert_eq!(item.shk, "4600000000017");
        assert_eq!(item.id, None);
    }

    #[test]
    fn test_expiration_sentinel_kept_verbatim() {
        let item = normalize(json!({ "expirationDate": "2999-01-01" }));
        assert_eq!(item.expiration_date.as_deref(), Some("2999-01-01"));
    }

    #[test]
    fn test_batch_preserves_order() {
        let items = normalize_batch(vec![
            json!({ "name": "first" }),
            json!(42),
            json!({ "name": "third" }),
        ]);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["first", "", "third"]);
    }
}
