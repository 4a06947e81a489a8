//! Partial quote records streamed by the push channel.
//!
//! A `QuotePatch` carries the instrument id plus whichever quote fields the
//! upstream event happened to populate. Field names follow the feed's compact
//! wire keys (`l`, `c`, `b`, ...). Decoding is permissive: unknown keys are
//! ignored and a value of the wrong type is treated as if it were absent.
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::instrument::InstrumentId;

/// Every quote field a patch may carry. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteFields {
    /// Last price.
    #[serde(rename = "l", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub last: Option<f64>,
    /// Absolute change against the previous close.
    #[serde(rename = "c", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    /// Previous close.
    #[serde(rename = "C", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,
    /// Best bid (buying).
    #[serde(rename = "b", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub bid: Option<f64>,
    /// Best ask (selling).
    #[serde(rename = "a", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub ask: Option<f64>,
    /// Day high.
    #[serde(rename = "h", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub day_high: Option<f64>,
    /// Day low.
    #[serde(rename = "L", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub day_low: Option<f64>,
    /// Weekly high.
    #[serde(rename = "Wh", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub week_high: Option<f64>,
    /// Weekly low.
    #[serde(rename = "Wl", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub week_low: Option<f64>,
    /// Weekly change in percent.
    #[serde(rename = "wp", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub week_percent: Option<f64>,
    /// Monthly high.
    #[serde(rename = "Mh", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub month_high: Option<f64>,
    /// Monthly low.
    #[serde(rename = "Ml", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub month_low: Option<f64>,
    /// Monthly change in percent.
    #[serde(rename = "mp", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub month_percent: Option<f64>,
    /// Yearly high.
    #[serde(rename = "Yh", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub year_high: Option<f64>,
    /// Yearly low.
    #[serde(rename = "Yl", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub year_low: Option<f64>,
    /// Yearly change in percent.
    #[serde(rename = "yp", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub year_percent: Option<f64>,
    /// Upstream sequence/status counter.
    #[serde(rename = "_s", default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub sequence: Option<f64>,
    /// Upstream event time, passed through verbatim.
    #[serde(rename = "E", default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,
}

impl QuoteFields {
    /// Shallow merge: every field present in `patch` overwrites the field here,
    /// every field absent in `patch` is left untouched.
    pub fn merge(&mut self, patch: &QuoteFields) {
        assign(&mut self.last, patch.last);
        assign(&mut self.change, patch.change);
        assign(&mut self.close, patch.close);
        assign(&mut self.bid, patch.bid);
        assign(&mut self.ask, patch.ask);
        assign(&mut self.day_high, patch.day_high);
        assign(&mut self.day_low, patch.day_low);
        assign(&mut self.week_high, patch.week_high);
        assign(&mut self.week_low, patch.week_low);
        assign(&mut self.week_percent, patch.week_percent);
        assign(&mut self.month_high, patch.month_high);
        assign(&mut self.month_low, patch.month_low);
        assign(&mut self.month_percent, patch.month_percent);
        assign(&mut self.year_high, patch.year_high);
        assign(&mut self.year_low, patch.year_low);
        assign(&mut self.year_percent, patch.year_percent);
        assign(&mut self.sequence, patch.sequence);
        if let Some(event_time) = &patch.event_time {
            self.event_time = Some(event_time.clone());
        }
    }
}

fn assign(slot: &mut Option<f64>, value: Option<f64>) {
    if let Some(v) = value {
        *slot = Some(v);
    }
}

/// Partial update for a single instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotePatch {
    /// Instrument the patch applies to.
    #[serde(rename = "_i")]
    pub id: InstrumentId,
    /// Fields populated by this event.
    #[serde(flatten)]
    pub fields: QuoteFields,
}

impl QuotePatch {
    /// Creates a patch with no fields set.
    pub fn new(id: impl Into<InstrumentId>) -> Self {
        QuotePatch {
            id: id.into(),
            fields: QuoteFields::default(),
        }
    }

    /// Builds a patch from one untyped element of a `currencyData` batch.
    ///
    /// Returns `None` when the element is not an object or has no usable `_i`.
    /// Numeric ids are accepted and converted to their decimal string.
    pub fn from_value(value: &Value) -> Option<QuotePatch> {
        let object = value.as_object()?;
        let id = match object.get("_i")? {
            Value::String(s) if !s.is_empty() => InstrumentId::new(s.as_str()),
            Value::Number(n) => InstrumentId::new(n.to_string()),
            _ => return None,
        };
        let fields = QuoteFields::deserialize(value).ok()?;
        Some(QuotePatch { id, fields })
    }
}

/// Result of decoding a raw batch: the usable patches in their original order,
/// and how many elements were dropped.
#[derive(Debug, Default)]
pub struct DecodedBatch {
    /// Patches in receipt order.
    pub patches: Vec<QuotePatch>,
    /// Elements that were not objects or lacked an id.
    pub rejected: usize,
}

/// Decodes a `currencyData` payload element by element.
pub fn decode_batch(values: &[Value]) -> DecodedBatch {
    let mut batch = DecodedBatch::default();
    for value in values {
        match QuotePatch::from_value(value) {
            Some(patch) => batch.patches.push(patch),
            None => batch.rejected += 1,
        }
    }
    batch
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_stay_none() {
        let patch = QuotePatch::from_value(&json!({"_i": "USD1", "l": 100.5})).unwrap();
        assert_eq!(patch.id.as_str(), "USD1");
        assert_eq!(patch.fields.last, Some(100.5));
        assert_eq!(patch.fields.change, None);
        assert_eq!(patch.fields.bid, None);
    }

    #[test]
    fn wrong_typed_field_is_ignored_not_fatal() {
        let patch = QuotePatch::from_value(&json!({
            "_i": "EUR1",
            "l": "not a number",
            "c": "0.25",
            "b": null,
            "a": {"nested": true},
            "brandNewField": 42
        }))
        .unwrap();
        assert_eq!(patch.fields.last, None);
        assert_eq!(patch.fields.change, Some(0.25));
        assert_eq!(patch.fields.bid, None);
        assert_eq!(patch.fields.ask, None);
    }

    #[test]
    fn elements_without_id_are_rejected() {
        let raw = vec![json!({"l": 1.0}), json!("garbage"), json!({"_i": 7, "c": 1}), json!({"_i": ""})];
        let batch = decode_batch(&raw);
        assert_eq!(batch.rejected, 3);
        assert_eq!(batch.patches.len(), 1);
        assert_eq!(batch.patches[0].id.as_str(), "7");
    }

    #[test]
    fn merge_overwrites_only_present_fields() {
        let mut current = QuoteFields {
            last: Some(100.0),
            change: Some(1.0),
            event_time: Some("t0".into()),
            ..Default::default()
        };
        let patch = QuoteFields {
            change: Some(2.0),
            ..Default::default()
        };
        current.merge(&patch);
        assert_eq!(current.last, Some(100.0));
        assert_eq!(current.change, Some(2.0));
        assert_eq!(current.event_time.as_deref(), Some("t0"));
    }

    #[test]
    fn serialization_omits_absent_fields() {
        let mut patch = QuotePatch::new("XAU1");
        patch.fields.bid = Some(2400.0);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, json!({"_i": "XAU1", "b": 2400.0}));
    }
}
