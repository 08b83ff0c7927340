use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const RECEIVED_AT: &str = "received_at";

/// A single spot record. New spots only ever hold strings, but entries already in
/// the stored file are kept as whatever JSON they contain, in their original key order.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Spot(Map<String, Value>);

impl Spot {
    /**
     * decodes a url-encoded form body into a spot and stamps it with the receipt time
     * garbage in the body is decoded lossily rather than rejected
     **/
    pub fn from_form(body: &[u8], received_at: DateTime<Utc>) -> Spot {
        let mut fields = Map::new();
        for (key, value) in url::form_urlencoded::parse(body) {
            // first value wins on repeated keys
            fields
                .entry(key.into_owned())
                .or_insert_with(|| Value::String(value.into_owned()));
        }

        fields.insert(
            RECEIVED_AT.to_string(),
            Value::String(received_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );

        Spot(fields)
    }

    /// String fields only.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn commit_message(&self) -> String {
        format!(
            "Add spot: {} on {} MHz",
            self.get("callsign").unwrap_or("unknown"),
            self.get("frequency").unwrap_or("?")
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Spot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Spot(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }
}

/// Newest first.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpotList(Vec<Spot>);

impl SpotList {
    pub fn new(spots: Vec<Spot>) -> SpotList {
        SpotList(spots)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn spots(&self) -> &[Spot] {
        &self.0
    }

    /// Puts the spot at index 0 and drops whatever falls past `max` from the tail.
    pub fn push_front_bounded(&mut self, spot: Spot, max: usize) {
        self.0.insert(0, spot);
        self.0.truncate(max.max(1));
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize spot list")
    }

    pub fn encode_base64(&self) -> anyhow::Result<String> {
        Ok(STANDARD.encode(self.to_json_pretty()?))
    }

    pub fn decode_base64(encoded: &str) -> anyhow::Result<SpotList> {
        // the content api wraps its base64 payload every 60 chars
        let compact: String = encoded
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        let bytes = STANDARD
            .decode(compact)
            .context("Failed to decode base64 file content")?;
        let text = String::from_utf8(bytes).context("File content is not valid UTF-8")?;

        serde_json::from_str(&text).context("Failed to deserialize spot list JSON")
    }
}
