use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SnapError;

/// A single geolocation sample captured when a record is created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPosition {
    /// Build a position, rejecting coordinates outside the WGS84 ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, SnapError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(SnapError::Geolocation(format!("latitude {latitude} is out of range")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(SnapError::Geolocation(format!("longitude {longitude} is out of range")));
        }
        Ok(Self { latitude, longitude })
    }
}

/// One confirmed purchase entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    /// Embedded image as a `data:` URL. Empty for manually entered records.
    #[serde(default)]
    pub image_url: String,
    pub name: String,
    pub price: f64,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPosition>,
}

impl ProductRecord {
    /// Create a record with a fresh id and no image or location.
    pub fn new(name: impl Into<String>, price: f64, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            image_url: String::new(),
            name: name.into(),
            price,
            date,
            location: None,
        }
    }

    /// The UTC calendar day this record was created on.
    pub fn calendar_day(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

/// Name and price proposed by the extraction service, pending confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    pub product_name: String,
    pub price: f64,
}

/// Form state between extraction and confirmation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDraft {
    pub name: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub location: Option<GeoPosition>,
}

impl RecordDraft {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            ..Default::default()
        }
    }

    pub fn from_ocr(ocr: OcrResult) -> Self {
        Self::new(ocr.product_name, ocr.price)
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_location(mut self, location: Option<GeoPosition>) -> Self {
        self.location = location;
        self
    }

    /// Validate the draft and turn it into a record stamped with the current time.
    pub fn confirm(self) -> Result<ProductRecord, SnapError> {
        self.confirm_at(Utc::now())
    }

    pub fn confirm_at(self, date: DateTime<Utc>) -> Result<ProductRecord, SnapError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(SnapError::InvalidRecord("product name is empty".into()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(SnapError::InvalidRecord(format!(
                "price must be a non-negative number, got {}",
                self.price
            )));
        }
        Ok(ProductRecord {
            id: Uuid::new_v4().to_string(),
            image_url: self.image_url.unwrap_or_default(),
            name: name.to_string(),
            price: self.price,
            date,
            location: self.location,
        })
    }
}
