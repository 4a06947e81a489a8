//! Reference metadata for tradable instruments.
//!
//! Definitions and field descriptors arrive together as a `CatalogPayload`
//! once per session. Apart from the id every attribute is optional, so a
//! sparse or evolving upstream schema still decodes.
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{Display, EnumString};

use crate::instrument::InstrumentId;

/// Listing status of an instrument.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum DefinitionStatus {
    Active,
    Inactive,
}

/// Static description of one instrument.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentDefinition {
    #[serde(rename = "_id")]
    pub id: InstrumentId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable name shown in tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Number of decimals used when displaying prices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Code used by the history service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_code: Option<String>,
    #[serde(rename = "ISIN", default, skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_desc_en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_type: Option<String>,
    /// Listing status; a value this build does not know reads as absent.
    #[serde(default, deserialize_with = "lenient_status", skip_serializing_if = "Option::is_none")]
    pub status: Option<DefinitionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_security: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warrant_rate: Option<f64>,
}

impl InstrumentDefinition {
    /// Minimal definition carrying only an id and a title.
    pub fn titled(id: impl Into<InstrumentId>, title: &str) -> Self {
        InstrumentDefinition {
            id: id.into(),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }
}

/// Descriptor of one quote field as published by the catalog service.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fxplus_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_code: Option<String>,
}

/// Body returned by the catalog loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogPayload {
    /// Instrument definitions.
    #[serde(default)]
    pub definitions: Vec<InstrumentDefinition>,
    /// Field descriptors.
    #[serde(default)]
    pub fields: Vec<FieldMeta>,
    /// Expiry of this catalog snapshot in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire: Option<i64>,
}

impl CatalogPayload {
    /// Parses a catalog from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<DefinitionStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().and_then(|s| s.trim().parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_upstream_definition_keys() {
        let raw = br#"{
            "definitions": [{
                "_id": "USD1", "type": "definition", "code": "USD", "title": "US Dollar",
                "currency": "TRY", "precision": 4, "legacyCode": "USD/TRY", "ISIN": "X1",
                "securityDescEn": "US Dollar / Turkish Lira", "status": "ACTIVE",
                "somethingNew": [1, 2, 3]
            }],
            "fields": [{"_id": "l", "display": "Last", "fxplusId": 3, "shortCode": "l"}],
            "expire": 1700000000000
        }"#;
        let catalog = CatalogPayload::from_json_slice(raw).unwrap();
        let def = &catalog.definitions[0];
        assert_eq!(def.id.as_str(), "USD1");
        assert_eq!(def.title.as_deref(), Some("US Dollar"));
        assert_eq!(def.precision, Some(4));
        assert_eq!(def.legacy_code.as_deref(), Some("USD/TRY"));
        assert_eq!(def.isin.as_deref(), Some("X1"));
        assert_eq!(def.status, Some(DefinitionStatus::Active));
        assert_eq!(catalog.fields[0].fxplus_id, Some(3));
        assert_eq!(catalog.expire, Some(1_700_000_000_000));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let catalog = CatalogPayload::from_json_slice(b"{}").unwrap();
        assert!(catalog.definitions.is_empty());
        assert!(catalog.fields.is_empty());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("inactive".parse::<DefinitionStatus>().unwrap(), DefinitionStatus::Inactive);
        assert_eq!(DefinitionStatus::Active.to_string(), "ACTIVE");
    }

    #[test]
    fn unknown_status_and_numeric_id_keep_the_catalog() {
        let raw = br#"{"definitions": [
            {"_id": "USD1", "status": "SUSPENDED", "title": "US Dollar"},
            {"_id": 1001, "status": "inactive"},
            {"_id": "EUR1", "status": 7}
        ]}"#;
        let catalog = CatalogPayload::from_json_slice(raw).unwrap();
        assert_eq!(catalog.definitions.len(), 3);

        let usd = &catalog.definitions[0];
        assert_eq!(usd.status, None);
        assert_eq!(usd.title.as_deref(), Some("US Dollar"));
        assert_eq!(catalog.definitions[1].id.as_str(), "1001");
        assert_eq!(catalog.definitions[1].status, Some(DefinitionStatus::Inactive));
        assert_eq!(catalog.definitions[2].status, None);
    }
}
