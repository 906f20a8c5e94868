//! Enquiry form controller.
//!
//! Holds the working draft as an immutable snapshot. Every edit produces a new
//! snapshot, so a view can detect changes with `Arc::ptr_eq`. Changes are
//! persisted after a quiet period; submission goes through an
//! [`EnquiryTransport`].
//!
//! Edits spawn the debounced save on the current Tokio runtime, so the
//! controller must be driven from inside one.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::estimator::{estimate, pickup_instant};
use crate::intake::store::{load_draft, save_draft, DraftStore, DRAFT_STORAGE_KEY};
use crate::intake::transport::{EnquiryTransport, TransportError};
use crate::models::{Attachment, Enquiry, EnquiryAccepted};
use crate::validation::{base_fields_complete, validate_draft, Field, FieldError};

use super::draft::ListField;

/// Quiet period before a changed draft is written to the store.
pub const SAVE_DEBOUNCE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub kind: ToastKind,
}

impl Toast {
    fn new(kind: ToastKind, title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            kind,
        }
    }
}

/// The rendering side of the form.
pub trait FormView: Send + Sync {
    /// Scroll to and focus the field at `path` (e.g. `serviceDetails.repair.location`).
    fn focus_field(&self, path: &str);
    fn toast(&self, toast: Toast);
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    InFlight,
    #[error("{0}")]
    Invalid(FieldError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub struct FormController {
    draft: Arc<Enquiry>,
    errors: BTreeMap<Field, String>,
    submitting: bool,
    estimated_delivery: Option<NaiveDate>,
    store: Arc<dyn DraftStore>,
    transport: Arc<dyn EnquiryTransport>,
    view: Arc<dyn FormView>,
    pending_save: Option<JoinHandle<()>>,
    /// Bumped whenever pending saves are cancelled. A save task writes only
    /// while holding this lock and only if the epoch it was scheduled under is
    /// still current, so a task that already woke up cannot resurrect a
    /// cleared draft.
    save_epoch: Arc<Mutex<u64>>,
}

/// Clears the busy flag when dropped, including when a submission future is
/// abandoned mid-flight.
struct BusyFlag<'a>(&'a mut bool);

impl<'a> BusyFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl FormController {
    /// Start from the saved draft, if a readable one exists.
    pub fn new(
        store: Arc<dyn DraftStore>,
        transport: Arc<dyn EnquiryTransport>,
        view: Arc<dyn FormView>,
    ) -> Self {
        let draft = match load_draft(store.as_ref()) {
            Ok(draft) => draft.unwrap_or_default(),
            Err(e) => {
                warn!("Could not read saved draft, starting empty: {}", e);
                Enquiry::default()
            }
        };

        let mut controller = Self {
            draft: Arc::new(draft),
            errors: BTreeMap::new(),
            submitting: false,
            estimated_delivery: None,
            store,
            transport,
            view,
            pending_save: None,
            save_epoch: Arc::new(Mutex::new(0)),
        };
        controller.refresh_estimate();
        controller
    }

    // ========================================================================
    // Read access
    // ========================================================================

    pub fn draft(&self) -> Arc<Enquiry> {
        Arc::clone(&self.draft)
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn estimated_delivery(&self) -> Option<NaiveDate> {
        self.estimated_delivery
    }

    /// Whether the submit button should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.submitting && base_fields_complete(&self.draft)
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Apply `edit` to a copy of the draft and clear the error on `field`.
    ///
    /// Returns whether the draft changed. An edit that leaves the draft equal
    /// to the current snapshot keeps that snapshot and schedules nothing.
    pub fn update<F>(&mut self, field: Field, edit: F) -> bool
    where
        F: FnOnce(&mut Enquiry),
    {
        self.errors.remove(&field);
        let mut next = Enquiry::clone(&self.draft);
        edit(&mut next);
        self.commit(next)
    }

    pub fn toggle(&mut self, list: ListField, item: &str, included: bool) -> bool {
        self.update(list.field(), |draft| draft.toggle_item(list, item, included))
    }

    /// Add photos; warns through the view when the batch would exceed the limit.
    pub fn add_attachments(&mut self, files: Vec<Attachment>) -> usize {
        let mut next = Enquiry::clone(&self.draft);
        match next.add_attachments(files) {
            Ok(added) => {
                self.errors.remove(&Field::ReferencePhotos);
                self.commit(next);
                added
            }
            Err(e) => {
                self.view.toast(Toast::new(ToastKind::Warning, "Too many files", e.to_string()));
                0
            }
        }
    }

    pub fn remove_attachment(&mut self, index: usize) -> bool {
        self.update(Field::ReferencePhotos, |draft| {
            draft.remove_attachment(index);
        })
    }

    fn commit(&mut self, next: Enquiry) -> bool {
        if next == *self.draft {
            return false;
        }
        self.draft = Arc::new(next);
        self.refresh_estimate();
        self.schedule_save();
        true
    }

    fn refresh_estimate(&mut self) {
        let draft = &self.draft;
        self.estimated_delivery = match (draft.service_type, draft.urgency, draft.preferred_window) {
            (Some(service), Some(urgency), Some(_)) => Some(estimate(
                Some(service),
                urgency,
                pickup_instant(draft.pickup_date, Utc::now()),
            )),
            _ => None,
        };
    }

    fn schedule_save(&mut self) {
        let scheduled = self.cancel_pending_save();
        let epoch = Arc::clone(&self.save_epoch);
        let store = Arc::clone(&self.store);
        let draft = Arc::clone(&self.draft);
        self.pending_save = Some(tokio::spawn(async move {
            tokio::time::sleep(SAVE_DEBOUNCE).await;
            let current = epoch.lock().unwrap_or_else(PoisonError::into_inner);
            if *current != scheduled {
                debug!("Skipping superseded draft save");
                return;
            }
            match save_draft(store.as_ref(), &draft) {
                Ok(()) => debug!("Saved enquiry draft"),
                Err(e) => warn!("Failed to save enquiry draft: {}", e),
            }
        }));
    }

    /// Abort any pending save and invalidate it in case it is already running.
    /// Returns the new epoch.
    fn cancel_pending_save(&mut self) -> u64 {
        if let Some(handle) = self.pending_save.take() {
            handle.abort();
        }
        let mut epoch = self.save_epoch.lock().unwrap_or_else(PoisonError::into_inner);
        *epoch += 1;
        *epoch
    }

    // ========================================================================
    // Validation & submission
    // ========================================================================

    /// Validate the draft. On failure the error is recorded against its field
    /// and the view is asked to focus it.
    pub fn validate(&mut self) -> Result<(), FieldError> {
        self.errors.clear();
        validate_draft(&self.draft).inspect_err(|e| {
            self.errors.insert(e.field, e.message.clone());
            self.view.focus_field(&e.field.path());
        })
    }

    /// Validate and send the draft.
    ///
    /// On success the draft, its errors and the stored copy are cleared. On
    /// failure everything is kept so the user can retry.
    pub async fn submit(&mut self) -> Result<EnquiryAccepted, SubmitError> {
        if self.submitting {
            return Err(SubmitError::InFlight);
        }
        self.validate().map_err(SubmitError::Invalid)?;

        let parts = self.draft.to_payload();
        let transport = Arc::clone(&self.transport);
        let result = {
            let _busy = BusyFlag::raise(&mut self.submitting);
            transport.send(parts).await
        };

        match result {
            Ok(accepted) => {
                info!("Enquiry {} submitted", accepted.enquiry_id);
                self.view.toast(Toast::new(
                    ToastKind::Success,
                    "Enquiry Submitted Successfully!",
                    format!(
                        "{}. Estimated delivery: {}",
                        accepted.estimated_response, accepted.estimated_delivery
                    ),
                ));
                self.reset();
                Ok(accepted)
            }
            Err(e) => {
                warn!("Enquiry submission failed: {}", e);
                self.view.toast(Toast::new(
                    ToastKind::Error,
                    "Submission Failed",
                    "Please try again or call us directly.",
                ));
                Err(e.into())
            }
        }
    }

    fn reset(&mut self) {
        self.cancel_pending_save();
        self.draft = Arc::new(Enquiry::default());
        self.errors.clear();
        self.estimated_delivery = None;
        if let Err(e) = self.store.remove(DRAFT_STORAGE_KEY) {
            warn!("Failed to clear saved draft: {}", e);
        }
    }
}

impl Drop for FormController {
    fn drop(&mut self) {
        self.cancel_pending_save();
    }
}
