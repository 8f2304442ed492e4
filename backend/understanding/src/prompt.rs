//! Prompt text sent to the inference service.

use chrono::NaiveDate;
use pricesnap_core::{GeoPosition, ProductRecord};
use serde::Serialize;

/// Instruction paired with the receipt image.
pub const EXTRACTION_PROMPT: &str = "\
You are reading a photo of a receipt or a price tag. Identify the main product \
and its price. Respond with JSON only, in the form \
{\"productName\": string, \"price\": number}. Use a plain number for the price \
without currency symbols. If there are several items, pick the most prominent one.";

/// System instruction for history questions.
pub const ANALYSIS_SYSTEM_PROMPT: &str = "\
You are a shopping assistant. You answer questions about the user's purchase \
history, which is given as a JSON array of records with id, name, price, date \
(ISO-8601, UTC) and an optional location. Base your answer only on that data. \
Be concise; when you compute totals or averages, show the figures.";

/// A record as sent to the analysis service. Embedded images are left out.
#[derive(Debug, Serialize)]
struct HistoryEntry<'a> {
    id: &'a str,
    name: &'a str,
    price: f64,
    date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<GeoPosition>,
}

impl<'a> From<&'a ProductRecord> for HistoryEntry<'a> {
    fn from(record: &'a ProductRecord) -> Self {
        Self {
            id: &record.id,
            name: &record.name,
            price: record.price,
            date: record.date.to_rfc3339(),
            location: record.location,
        }
    }
}

/// Serialize the history for the prompt.
pub fn history_json(history: &[ProductRecord]) -> String {
    let entries: Vec<HistoryEntry<'_>> = history.iter().map(HistoryEntry::from).collect();
    serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
}

/// User message for a history question.
pub fn analysis_prompt(query: &str, history: &[ProductRecord], today: NaiveDate) -> String {
    format!(
        "Today is {today}.\n\nPurchase history ({} records):\n{}\n\nQuestion: {query}",
        history.len(),
        history_json(history)
    )
}
