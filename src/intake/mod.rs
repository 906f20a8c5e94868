//! Client side of the enquiry flow: the form controller, its draft storage
//! and the transport that submits finished enquiries.

pub mod controller;
pub mod draft;
pub mod store;
pub mod transport;

pub use controller::{FormController, FormView, SubmitError, Toast, ToastKind, SAVE_DEBOUNCE};
pub use draft::{AttachmentError, ListField};
pub use store::{DraftStore, FileDraftStore, MemoryDraftStore, StoreError, DRAFT_STORAGE_KEY};
pub use transport::{EnquiryTransport, HttpTransport, PayloadPart, TransportError};
