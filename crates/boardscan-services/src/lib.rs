//! Client-side logic for the external services around the scanner.
//!
//! The services themselves (image annotation, component datastore, chat
//! gateway) are consumed through traits; this crate owns what happens on
//! our side of them:
//! - [`ComponentRecognizer`]: label → component mapping and the grid
//!   fallback for label-only answers,
//! - [`ComponentCatalog`] with an [`InMemoryCatalog`] loadable from JSON,
//! - [`ChatTranscript`] and the [`SseDecoder`] for streamed replies.

mod catalog;
mod chat;
mod error;
mod labels;
mod recognition;

pub use catalog::{ComponentCatalog, ComponentRecord, InMemoryCatalog, SpecValue};
pub use chat::{
    ChatCompletionRequest, ChatMessage, ChatRole, ChatService, ChatTranscript, SseDecoder,
    ASSISTANT_SYSTEM_PROMPT, DEFAULT_CHAT_MODEL,
};
pub use error::{AnalysisError, CatalogError, ChatError, ServiceError};
pub use labels::{canonical_component, canonical_names};
pub use recognition::{
    components_from_annotations, strip_data_url, AnnotateImageRequest, AnnotateImageResponse,
    AnnotateRequest, AnnotateResponse, BoundingPoly, ComponentRecognizer, DetectedComponent,
    Feature, FeatureType, ImageContent, LabelAnnotation, LocalizedObject, NormalizedVertex,
    RecognitionService, RemoteStatus, DEFAULT_LABEL_CONFIDENCE, DEFAULT_OBJECT_CONFIDENCE,
    MAX_RESULTS,
};
