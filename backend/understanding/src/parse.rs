//! Tolerant parsing of the extraction reply.

use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use pricesnap_core::OcrResult;
use regex::Regex;
use serde_json::Value;

/// Matches a fenced block (```json ... ```) around the payload.
static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").unwrap());

/// Characters that may surround a price: currency symbols, codes, whitespace.
static PRICE_NOISE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\d.,\-]").unwrap());

const NAME_KEYS: &[&str] = &["productName", "product_name", "name", "product"];

/// Parse the service reply into an `OcrResult`.
///
/// Accepts bare JSON or JSON wrapped in a markdown code fence. The price may be
/// a number or a string such as `"€2,49"`.
pub fn parse_ocr_reply(text: &str) -> Result<OcrResult> {
    let payload = match CODE_FENCE_RE.captures(text) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => text.trim(),
    };
    if payload.is_empty() {
        bail!("empty response from extraction service");
    }

    let value: Value = serde_json::from_str(payload)
        .with_context(|| format!("response is not valid JSON: {}", truncate(payload, 120)))?;

    let name = NAME_KEYS
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| anyhow!("response has no product name"))?;

    let price = match value.get("price") {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| anyhow!("price is not representable"))?,
        Some(Value::String(s)) => parse_price(s)?,
        Some(other) => bail!("price has unexpected type: {other}"),
        None => bail!("response has no price"),
    };

    Ok(OcrResult {
        product_name: name.to_string(),
        price,
    })
}

/// Parse a price string, dropping currency markers and accepting `,` as decimal separator.
///
/// A comma followed by exactly three digits groups thousands ("$1,500"); any
/// other lone comma is a decimal separator ("2,49").
pub fn parse_price(raw: &str) -> Result<f64> {
    let cleaned = PRICE_NOISE_RE.replace_all(raw, "");
    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // "1.234,56" -> "1234.56"
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        // "1,234.56" -> "1234.56"
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // "1,500" -> "1500"
        (Some(_), None) if is_thousands_grouped(&cleaned) => cleaned.replace(',', ""),
        // "2,49" -> "2.49"
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned.into_owned(),
    };
    normalized
        .parse::<f64>()
        .with_context(|| format!("could not read a price from {raw:?}"))
}

/// "1,234" or "12,345,678": a non-zero lead of 1-3 digits, then groups of exactly three.
fn is_thousands_grouped(s: &str) -> bool {
    let mut groups = s.trim_start_matches('-').split(',');
    let lead = groups.next().unwrap_or_default();
    let lead_ok = (1..=3).contains(&lead.len())
        && lead.bytes().all(|b| b.is_ascii_digit())
        && !lead.starts_with('0');
    lead_ok && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
