//! The session controller behind every command.
//!
//! Owns the record store and the inference provider, and runs the
//! add-record and ask flows with their controls held busy while in flight.

use std::sync::Arc;

use pricesnap_core::{
    InferenceProvider, LocationSource, ProductRecord, RecordDraft, SnapError,
};
use pricesnap_logging::{RecordEvent, RecordEventLogger};
use pricesnap_media::{ImagePayload, PreprocessOptions};
use pricesnap_store::{derive_view, HistoryFilter, RecordStore, SaveStatus, StorageSlot};
use pricesnap_understanding::{analyze_history, extract_product};
use tracing::info;

use crate::controls::BusyFlag;

/// A proposed record awaiting the user's confirmation.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub draft: RecordDraft,
    pub width: u32,
    pub height: u32,
}

/// Result of a confirmed add.
#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub record: ProductRecord,
    pub save_status: SaveStatus,
    /// Set when the location could not be captured; the record is stored without one.
    pub location_warning: Option<String>,
}

pub struct App<S: StorageSlot> {
    store: RecordStore<S>,
    provider: Option<Arc<dyn InferenceProvider>>,
    preprocess: PreprocessOptions,
    scan_control: BusyFlag,
    ask_control: BusyFlag,
}

impl<S: StorageSlot> App<S> {
    pub fn new(
        store: RecordStore<S>,
        provider: Option<Arc<dyn InferenceProvider>>,
        preprocess: PreprocessOptions,
    ) -> Self {
        Self {
            store,
            provider,
            preprocess,
            scan_control: BusyFlag::new("scan"),
            ask_control: BusyFlag::new("ask"),
        }
    }

    pub fn records(&self) -> &[ProductRecord] {
        self.store.records()
    }

    pub fn get(&self, id: &str) -> Option<&ProductRecord> {
        self.store.get(id)
    }

    #[cfg(test)]
    pub fn scan_control(&self) -> &BusyFlag {
        &self.scan_control
    }

    #[cfg(test)]
    pub fn ask_control(&self) -> &BusyFlag {
        &self.ask_control
    }

    fn provider(&self) -> Result<&dyn InferenceProvider, SnapError> {
        self.provider.as_deref().ok_or_else(|| {
            SnapError::Config(
                "no inference API key configured; set GEMINI_API_KEY or inference.apiKey".into(),
            )
        })
    }

    /// Preprocess the image and ask the service for a name and price.
    pub async fn propose_from_image(&self, payload: &ImagePayload) -> Result<Proposal, SnapError> {
        let _guard = self.scan_control.try_acquire()?;
        let provider = self.provider()?;

        let image = payload.preprocess(self.preprocess).await?;
        let ocr = extract_product(provider, &image.data, image.mime_type)
            .await
            .inspect_err(|e| {
                RecordEventLogger::log_event(RecordEvent::ExtractionFailed {
                    error_msg: e.to_string(),
                })
            })?;

        Ok(Proposal {
            draft: RecordDraft::from_ocr(ocr).with_image_url(image.to_data_url()),
            width: image.width,
            height: image.height,
        })
    }

    /// Validate the draft, attach a location if one can be had, and store it.
    pub fn confirm(
        &mut self,
        draft: RecordDraft,
        location: &dyn LocationSource,
    ) -> Result<AddOutcome, SnapError> {
        let (draft, location_warning) = if draft.location.is_some() {
            (draft, None)
        } else {
            match location.current_position() {
                Ok(position) => (draft.with_location(Some(position)), None),
                Err(e) => (draft, Some(e.to_string())),
            }
        };

        let record = draft.confirm()?;
        let save_status = self.store.add(record.clone())?;

        RecordEventLogger::log_event(RecordEvent::RecordAdded {
            id: record.id.clone(),
            name: record.name.clone(),
            price: record.price,
            has_location: record.location.is_some(),
        });
        if let Some(warning) = save_status.warning() {
            RecordEventLogger::log_event(RecordEvent::SaveFailed {
                warning: warning.to_string(),
            });
        }

        Ok(AddOutcome {
            record,
            save_status,
            location_warning,
        })
    }

    pub fn delete(&mut self, id: &str) -> Result<(ProductRecord, SaveStatus), SnapError> {
        let (removed, status) = self
            .store
            .remove(id)
            .ok_or_else(|| SnapError::NotFound(id.to_string()))?;
        RecordEventLogger::log_event(RecordEvent::RecordRemoved {
            id: removed.id.clone(),
            name: removed.name.clone(),
        });
        if let Some(warning) = status.warning() {
            RecordEventLogger::log_event(RecordEvent::SaveFailed {
                warning: warning.to_string(),
            });
        }
        Ok((removed, status))
    }

    /// The displayed history for `filter`.
    pub fn view(&self, filter: &HistoryFilter) -> Vec<&ProductRecord> {
        derive_view(self.store.records(), filter)
    }

    /// Ask a question about the full history. Blank queries are a no-op.
    pub async fn ask(&self, query: &str) -> Result<Option<String>, SnapError> {
        if query.trim().is_empty() {
            info!("Ignoring blank question");
            return Ok(None);
        }
        let _guard = self.ask_control.try_acquire()?;
        let provider = self.provider()?;

        analyze_history(provider, query, self.store.records())
            .await
            .inspect_err(|e| {
                RecordEventLogger::log_event(RecordEvent::AnalysisFailed {
                    error_msg: e.to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes_for_tests::png;
    use chrono::{TimeZone, Utc};
    use pricesnap_core::{FixedLocation, GeoPosition, NoLocation};
    use pricesnap_store::InMemorySlot;
    use pricesnap_understanding::MockProvider;

    mod bytes_for_tests {
        use image::{DynamicImage, ImageFormat, RgbImage};
        use std::io::Cursor;

        pub fn png(width: u32, height: u32) -> Vec<u8> {
            let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
            let mut out = Cursor::new(Vec::new());
            img.write_to(&mut out, ImageFormat::Png).unwrap();
            out.into_inner()
        }
    }

    fn payload(data: Vec<u8>) -> ImagePayload {
        ImagePayload {
            source: "test.png".into(),
            mime_type: "image/png".into(),
            data: data.into(),
        }
    }

    fn app_with(mock: &Arc<MockProvider>, slot: &InMemorySlot) -> App<InMemorySlot> {
        let provider: Arc<dyn InferenceProvider> = Arc::clone(mock) as Arc<dyn InferenceProvider>;
        App::new(RecordStore::load(slot.clone()), Some(provider), PreprocessOptions::default())
    }

    #[tokio::test]
    async fn scan_then_confirm_stores_record_with_image() {
        let mock = Arc::new(MockProvider::new("mock").with_ocr("Milk", 2.5));
        let slot = InMemorySlot::new();
        let mut app = app_with(&mock, &slot);

        let proposal = app.propose_from_image(&payload(png(1600, 1200))).await.unwrap();
        assert_eq!((proposal.width, proposal.height), (400, 300));
        assert_eq!(proposal.draft.name, "Milk");
        assert!(!app.scan_control().is_busy());

        let here = GeoPosition::new(40.0, -74.0).unwrap();
        let outcome = app.confirm(proposal.draft, &FixedLocation(here)).unwrap();
        assert!(outcome.save_status.is_saved());
        assert!(outcome.location_warning.is_none());
        assert_eq!(outcome.record.location, Some(here));
        assert!(outcome.record.image_url.starts_with("data:image/jpeg;base64,"));

        let reloaded = RecordStore::load(slot);
        assert_eq!(reloaded.records(), app.records());
    }

    #[tokio::test]
    async fn undecodable_image_aborts_without_calling_service() {
        let mock = Arc::new(MockProvider::new("mock").with_ocr("Milk", 2.5));
        let app = app_with(&mock, &InMemorySlot::new());

        let err = app.propose_from_image(&payload(b"garbage".to_vec())).await.unwrap_err();
        assert!(matches!(err, SnapError::ImageDecode(_)));
        assert_eq!(mock.extract_calls(), 0);
        assert!(app.records().is_empty());
        assert!(!app.scan_control().is_busy());
    }

    #[tokio::test]
    async fn extraction_failure_releases_control_for_retry() {
        let mock = Arc::new(MockProvider::new("mock").failing("timeout"));
        let app = app_with(&mock, &InMemorySlot::new());

        let err = app.propose_from_image(&payload(png(10, 10))).await.unwrap_err();
        assert!(matches!(err, SnapError::Inference { .. }));
        assert!(!app.scan_control().is_busy());
        assert!(app.propose_from_image(&payload(png(10, 10))).await.is_err());
        assert_eq!(mock.extract_calls(), 2);
    }

    #[tokio::test]
    async fn scan_is_rejected_while_in_flight() {
        let mock = Arc::new(MockProvider::new("mock").with_ocr("Milk", 2.5));
        let app = app_with(&mock, &InMemorySlot::new());

        let _held = app.scan_control().try_acquire().unwrap();
        let err = app.propose_from_image(&payload(png(10, 10))).await.unwrap_err();
        assert!(matches!(err, SnapError::Busy("scan")));
        assert_eq!(mock.extract_calls(), 0);
    }

    #[test]
    fn geolocation_failure_still_stores_record() {
        let mock = Arc::new(MockProvider::new("mock"));
        let mut app = app_with(&mock, &InMemorySlot::new());

        let outcome = app.confirm(RecordDraft::new("Bread", 3.0), &NoLocation).unwrap();
        assert!(outcome.location_warning.is_some());
        assert!(outcome.record.location.is_none());
        assert_eq!(app.records().len(), 1);
    }

    #[test]
    fn full_storage_surfaces_warning_but_keeps_record() {
        let mock = Arc::new(MockProvider::new("mock"));
        let slot = InMemorySlot::new();
        let mut app = app_with(&mock, &slot);
        slot.set_fail_writes(true);

        let outcome = app.confirm(RecordDraft::new("Bread", 3.0), &NoLocation).unwrap();
        assert!(outcome.save_status.warning().is_some());
        assert_eq!(app.records().len(), 1);
    }

    #[test]
    fn milk_and_bread_scenario() {
        let mock = Arc::new(MockProvider::new("mock"));
        let mut app = app_with(&mock, &InMemorySlot::new());
        let milk = RecordDraft::new("Milk", 2.5)
            .confirm_at(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
            .unwrap();
        let bread = RecordDraft::new("Bread", 3.0)
            .confirm_at(Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap())
            .unwrap();
        app.store.add(milk).unwrap();
        app.store.add(bread).unwrap();

        let all: Vec<&str> = app.view(&HistoryFilter::new()).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(all, ["Bread", "Milk"]);

        let searched: Vec<&str> = app
            .view(&HistoryFilter::new().with_search("mil"))
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(searched, ["Milk"]);
    }

    #[test]
    fn delete_unknown_id_is_not_found() {
        let mock = Arc::new(MockProvider::new("mock"));
        let mut app = app_with(&mock, &InMemorySlot::new());
        let outcome = app.confirm(RecordDraft::new("Bread", 3.0), &NoLocation).unwrap();

        assert!(matches!(app.delete("nope"), Err(SnapError::NotFound(_))));
        let (removed, status) = app.delete(&outcome.record.id).unwrap();
        assert_eq!(removed.name, "Bread");
        assert!(status.is_saved());
        assert!(app.get(&outcome.record.id).is_none());
    }

    #[tokio::test]
    async fn blank_question_changes_nothing() {
        let mock = Arc::new(MockProvider::new("mock").with_answer("unused"));
        let slot = InMemorySlot::new();
        let mut app = app_with(&mock, &slot);
        app.confirm(RecordDraft::new("Milk", 2.5), &NoLocation).unwrap();
        let before_records = app.records().to_vec();
        let before_slot = slot.contents();

        assert_eq!(app.ask("   ").await.unwrap(), None);
        assert_eq!(mock.analyze_calls(), 0);
        assert_eq!(app.records(), before_records.as_slice());
        assert_eq!(slot.contents(), before_slot);
        assert!(!app.ask_control().is_busy());
    }

    #[tokio::test]
    async fn question_sends_whole_history() {
        let mock = Arc::new(MockProvider::new("mock").with_answer("5.50 total"));
        let mut app = app_with(&mock, &InMemorySlot::new());
        app.confirm(RecordDraft::new("Milk", 2.5), &NoLocation).unwrap();
        app.confirm(RecordDraft::new("Bread", 3.0), &NoLocation).unwrap();

        let answer = app.ask("total spent?").await.unwrap();
        assert_eq!(answer.as_deref(), Some("5.50 total"));
        assert_eq!(mock.last_history_len(), 2);
    }

    #[test]
    fn records_survive_restart_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let mut app = App::new(
            RecordStore::load(pricesnap_store::JsonFileSlot::new(&path)),
            None,
            PreprocessOptions::default(),
        );
        let kept = app.confirm(RecordDraft::new("Milk", 2.5), &NoLocation).unwrap().record;
        let gone = app.confirm(RecordDraft::new("Bread", 3.0), &NoLocation).unwrap().record;
        app.delete(&gone.id).unwrap();

        let restarted = RecordStore::load(pricesnap_store::JsonFileSlot::new(&path));
        assert_eq!(restarted.records(), [kept].as_slice());
    }

    #[tokio::test]
    async fn missing_provider_is_a_config_error() {
        let mut app = App::new(RecordStore::load(InMemorySlot::new()), None, PreprocessOptions::default());
        assert!(matches!(app.ask("total?").await, Err(SnapError::Config(_))));
        // Manual entry works without a provider.
        assert!(app.confirm(RecordDraft::new("Tea", 1.2), &NoLocation).is_ok());
    }
}
