use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{Result, StoreError};

/// the textual format of [`Record::submitted_at`]
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The raw JSON object of one record, exactly as it is kept in the document.
pub(crate) type Fields = Map<String, Value>;

/// One line item in the document.
///
/// This is a typed view over the stored JSON object. The five known fields are typed, anything
/// else a caller has patched onto the record is kept in `extra`. `total_value` is derived from
/// `quantity * price`, it is only recomputed when one of those two fields changes.
///
/// Reading never fails: a known field holding something of the wrong type (legacy numeric text
/// such as `"10"`, `null`, a missing member) reads as the value it spells, or as `0` / `""`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// product name
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,

    /// quantity in stock
    #[serde(default, deserialize_with = "lenient::integer")]
    pub quantity: i64,

    /// price per item
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub price: f64,

    /// when the record was appended, formatted with [`TIMESTAMP_FORMAT`]
    #[serde(default, deserialize_with = "lenient::text")]
    pub submitted_at: String,

    /// `quantity * price`
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub total_value: f64,

    /// fields added by callers that have no typed counterpart
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// builds the record that gets appended for `item`, stamped with `now`
    ///
    /// # Errors
    /// returns [`StoreError::Overflow`] if `quantity * price` is not a finite number
    pub fn submitted(item: NewRecord, now: DateTime<Utc>) -> Result<Self> {
        let total_value = total(item.quantity, item.price)?;
        Ok(Record {
            name: item.name,
            quantity: item.quantity,
            price: item.price,
            submitted_at: now.format(TIMESTAMP_FORMAT).to_string(),
            total_value,
            extra: Map::new(),
        })
    }

    /// the JSON object this record is stored as
    pub(crate) fn to_fields(&self) -> Result<Fields> {
        let mut fields = self.extra.clone();
        fields.insert("name".into(), Value::String(self.name.clone()));
        fields.insert("quantity".into(), self.quantity.into());
        fields.insert("price".into(), number("price", self.price)?);
        fields.insert("submitted_at".into(), Value::String(self.submitted_at.clone()));
        fields.insert("total_value".into(), number("total_value", self.total_value)?);
        Ok(fields)
    }
}

impl From<&Fields> for Record {
    fn from(fields: &Fields) -> Self {
        let get = |key: &str| fields.get(key).unwrap_or(&Value::Null);
        Record {
            name: lenient::text_of(get("name")),
            quantity: lenient::integer_of(get("quantity")),
            price: lenient::decimal_of(get("price")),
            submitted_at: lenient::text_of(get("submitted_at")),
            total_value: lenient::decimal_of(get("total_value")),
            extra: fields
                .iter()
                .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

const KNOWN_FIELDS: [&str; 5] = ["name", "quantity", "price", "submitted_at", "total_value"];

/// sets `field` of the stored object `fields` to the text `value`.
///
/// `quantity` and `price` are parsed and stored as numbers, then `total_value` is recomputed.
/// `total_value` is parsed but left as given. Every other field, known or not, stores the text
/// as is. Members other than `field` (and `total_value` when it is recomputed) keep their raw
/// JSON value untouched.
///
/// # Errors
/// returns [`StoreError::NotNumeric`] if a numeric field was given non-numeric text and
/// [`StoreError::Overflow`] if the recomputed total is not finite. `fields` is left unchanged
/// in both cases.
pub(crate) fn set_field(fields: &mut Fields, field: &str, value: String) -> Result<()> {
    match field {
        "quantity" => {
            let quantity = coerce::quantity(&value)?;
            let price = fields.get("price").map_or(0.0, lenient::decimal_of);
            let total_value = total(quantity, price)?;
            fields.insert("quantity".into(), quantity.into());
            fields.insert("total_value".into(), number("total_value", total_value)?);
        }
        "price" => {
            let price = coerce::price(&value)?;
            let quantity = fields.get("quantity").map_or(0, lenient::integer_of);
            let total_value = total(quantity, price)?;
            fields.insert("price".into(), number("price", price)?);
            fields.insert("total_value".into(), number("total_value", total_value)?);
        }
        "total_value" => {
            let total_value = coerce::decimal(field, &value)?;
            fields.insert("total_value".into(), number(field, total_value)?);
        }
        _ => {
            fields.insert(field.to_string(), Value::String(value));
        }
    }
    Ok(())
}

fn total(quantity: i64, price: f64) -> Result<f64> {
    let total_value = quantity as f64 * price;
    if total_value.is_finite() {
        Ok(total_value)
    } else {
        Err(StoreError::Overflow { quantity, price })
    }
}

fn number(field: &str, value: f64) -> Result<Value> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| StoreError::NotNumeric {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// The fields a caller supplies when appending a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    /// product name
    pub name: String,
    /// quantity in stock
    pub quantity: i64,
    /// price per item
    pub price: f64,
}

impl NewRecord {
    /// builds a `NewRecord` from form style text input, see [`coerce`]
    pub fn parse(name: impl Into<String>, quantity: &str, price: &str) -> Result<Self> {
        Ok(NewRecord {
            name: name.into(),
            quantity: coerce::quantity(quantity)?,
            price: coerce::price(price)?,
        })
    }
}

/// Parse-or-reject conversions for text that must become a quantity or a price.
pub mod coerce {
    use crate::error::{Result, StoreError};

    /// parses a whole number of items, surrounding whitespace is ignored
    pub fn quantity(text: &str) -> Result<i64> {
        text.trim().parse::<i64>().map_err(|_| not_numeric("quantity", text))
    }

    /// parses a finite decimal price
    pub fn price(text: &str) -> Result<f64> {
        decimal("price", text)
    }

    pub(crate) fn decimal(field: &str, text: &str) -> Result<f64> {
        match text.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(not_numeric(field, text)),
        }
    }

    fn not_numeric(field: &str, text: &str) -> StoreError {
        StoreError::NotNumeric {
            field: field.to_string(),
            value: text.to_string(),
        }
    }
}

// Documents written by older versions of the app may hold numeric fields as text ("10"),
// null where a form field was left empty, or something that is not a number at all.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn integer_of(value: &Value) -> i64 {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                    .unwrap_or_default()
            }
            Value::Bool(b) => *b as i64,
            _ => 0,
        }
    }

    pub fn decimal_of(value: &Value) -> f64 {
        match value {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .unwrap_or_default(),
            Value::Bool(b) => *b as i64 as f64,
            _ => 0.0,
        }
    }

    pub fn text_of(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    pub fn integer<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
        Ok(integer_of(&Value::deserialize(de)?))
    }

    pub fn decimal<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
        Ok(decimal_of(&Value::deserialize(de)?))
    }

    pub fn text<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        Ok(text_of(&Value::deserialize(de)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Fields {
        match json!({
            "name": "A",
            "quantity": 2,
            "price": 3.5,
            "submitted_at": "2024-01-01 00:00:00",
            "total_value": 7
        }) {
            Value::Object(fields) => fields,
            _ => unreachable!(),
        }
    }

    #[test]
    fn submitted_record_has_derived_total_and_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let record = Record::submitted(
            NewRecord { name: "Bolt".into(), quantity: 4, price: 0.25 },
            now,
        )
        .unwrap();
        assert_eq!(record.total_value, 1.0);
        assert_eq!(record.submitted_at, "2024-03-09 14:05:07");
        assert!(record.extra.is_empty());
    }

    #[test]
    fn submitted_record_rejects_overflowing_total() {
        let result = Record::submitted(
            NewRecord { name: "Big".into(), quantity: 10, price: 1e308 },
            Utc::now(),
        );
        assert!(matches!(result, Err(StoreError::Overflow { quantity: 10, .. })));
    }

    #[test]
    fn wrongly_typed_fields_read_as_defaults() {
        let fields = match json!({
            "name": null,
            "quantity": "3",
            "price": "10",
            "submitted_at": 5,
            "total_value": "abc",
            "colour": "red"
        }) {
            Value::Object(fields) => fields,
            _ => unreachable!(),
        };
        let record = Record::from(&fields);
        assert_eq!(record.name, "");
        assert_eq!(record.quantity, 3);
        assert_eq!(record.price, 10.0);
        assert_eq!(record.submitted_at, "5");
        assert_eq!(record.total_value, 0.0);
        assert_eq!(record.extra.len(), 1);
        assert_eq!(record.extra.get("colour"), Some(&json!("red")));
    }

    #[test]
    fn typed_view_deserializes_the_same_as_from_fields() {
        let fields = sample();
        let record: Record = serde_json::from_value(Value::Object(fields.clone())).unwrap();
        assert_eq!(record, Record::from(&fields));

        let null_name: Record = serde_json::from_value(json!({ "name": null })).unwrap();
        assert_eq!(null_name.name, "");
    }

    #[test]
    fn setting_price_recomputes_total() {
        let mut fields = sample();
        set_field(&mut fields, "price", "10".into()).unwrap();
        assert_eq!(fields["price"], json!(10.0));
        assert_eq!(fields["total_value"], json!(20.0));
    }

    #[test]
    fn setting_name_keeps_other_members_untouched() {
        let mut fields = sample();
        set_field(&mut fields, "name", "Widget".into()).unwrap();
        assert_eq!(fields["name"], json!("Widget"));
        assert_eq!(fields["total_value"], json!(7));
        assert_eq!(fields["price"], json!(3.5));
    }

    #[test]
    fn non_numeric_quantity_is_rejected_and_fields_unchanged() {
        let mut fields = sample();
        let err = set_field(&mut fields, "quantity", "lots".into()).unwrap_err();
        assert!(matches!(err, StoreError::NotNumeric { ref field, .. } if field == "quantity"));
        assert_eq!(fields, sample());
    }

    #[test]
    fn overflowing_total_is_rejected_and_fields_unchanged() {
        let mut fields = sample();
        set_field(&mut fields, "quantity", "1000".into()).unwrap();
        let before = fields.clone();

        let err = set_field(&mut fields, "price", "1e306".into()).unwrap_err();
        assert!(matches!(err, StoreError::Overflow { quantity: 1000, .. }));
        assert_eq!(fields, before);
    }

    #[test]
    fn total_value_is_not_recomputed_when_set_directly() {
        let mut fields = sample();
        set_field(&mut fields, "total_value", "99.5".into()).unwrap();
        assert_eq!(fields["total_value"], json!(99.5));
        assert_eq!(fields["quantity"], json!(2));
    }

    #[test]
    fn unknown_field_is_kept_as_text() {
        let mut fields = sample();
        set_field(&mut fields, "sku", "X-1".into()).unwrap();
        assert_eq!(fields["sku"], json!("X-1"));
        assert_eq!(Record::from(&fields).extra.get("sku"), Some(&json!("X-1")));
    }

    #[test]
    fn coerce_rejects_empty_and_non_finite() {
        assert!(coerce::price("").is_err());
        assert!(coerce::price("inf").is_err());
        assert!(coerce::quantity("2.5").is_err());
        assert_eq!(coerce::quantity(" 12 ").unwrap(), 12);
        assert_eq!(coerce::price("9.99").unwrap(), 9.99);
    }
}
