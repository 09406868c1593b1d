//! Component recognition on top of an image-annotation service.
//!
//! The service is asked for localized objects and labels in one call. Only
//! results whose text maps onto a known component survive. When no localized
//! object survives, up to six mapped labels are laid out on a fixed 3-column
//! grid instead: their positions are placeholders, not measurements.

use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::{AnalysisError, ServiceError};
use crate::labels::canonical_component;

pub const MAX_RESULTS: u32 = 20;
pub const DEFAULT_OBJECT_CONFIDENCE: f32 = 0.8;
pub const DEFAULT_LABEL_CONFIDENCE: f32 = 0.7;
const GRID_LABELS: usize = 6;
const GRID_COLUMNS: usize = 3;

/// A recognized component. `x`/`y` are the normalized center, `w`/`h` the
/// normalized size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedComponent {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub confidence: f32,
}

/// Body of an `images:annotate` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotateRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotateImageRequest {
    pub image: ImageContent,
    pub features: Vec<Feature>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Base64 payload without any `data:` prefix.
    pub content: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureType {
    ObjectLocalization,
    LabelDetection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    pub max_results: u32,
}

impl AnnotateRequest {
    pub fn for_image(image_base64: impl Into<String>) -> Self {
        Self {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: image_base64.into(),
                },
                features: vec![
                    Feature {
                        kind: FeatureType::ObjectLocalization,
                        max_results: MAX_RESULTS,
                    },
                    Feature {
                        kind: FeatureType::LabelDetection,
                        max_results: MAX_RESULTS,
                    },
                ],
            }],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub localized_object_annotations: Vec<LocalizedObject>,
    #[serde(default)]
    pub label_annotations: Vec<LabelAnnotation>,
    #[serde(default)]
    pub error: Option<RemoteStatus>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedObject {
    pub name: String,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub bounding_poly: Option<BoundingPoly>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingPoly {
    #[serde(default)]
    pub normalized_vertices: Vec<NormalizedVertex>,
}

/// Zero coordinates are omitted on the wire, hence the options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVertex {
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelAnnotation {
    pub description: String,
    #[serde(default)]
    pub score: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Remote image-annotation endpoint.
pub trait RecognitionService {
    fn annotate(&mut self, request: &AnnotateRequest) -> Result<AnnotateResponse, ServiceError>;
}

impl<F> RecognitionService for F
where
    F: FnMut(&AnnotateRequest) -> Result<AnnotateResponse, ServiceError>,
{
    fn annotate(&mut self, request: &AnnotateRequest) -> Result<AnnotateResponse, ServiceError> {
        self(request)
    }
}

// Zero scores are indistinguishable from omitted ones on the wire.
fn score_or(score: Option<f32>, default: f32) -> f32 {
    score.filter(|s| *s > 0.0).unwrap_or(default)
}

fn object_component(obj: &LocalizedObject) -> Option<DetectedComponent> {
    let name = canonical_component(&obj.name)?;
    let vertices = &obj.bounding_poly.as_ref()?.normalized_vertices;
    if vertices.len() < 4 {
        return None;
    }
    let (x0, y0) = (vertices[0].x.unwrap_or(0.0), vertices[0].y.unwrap_or(0.0));
    let w = vertices[2].x.unwrap_or(0.0) - x0;
    let h = vertices[2].y.unwrap_or(0.0) - y0;
    Some(DetectedComponent {
        name: name.to_string(),
        x: x0 + w / 2.0,
        y: y0 + h / 2.0,
        w,
        h,
        confidence: score_or(obj.score, DEFAULT_OBJECT_CONFIDENCE),
    })
}

fn grid_components(labels: &[LabelAnnotation]) -> Vec<DetectedComponent> {
    labels
        .iter()
        .filter_map(|l| canonical_component(&l.description).map(|name| (name, l.score)))
        .take(GRID_LABELS)
        .enumerate()
        .map(|(i, (name, score))| {
            let row = (i / GRID_COLUMNS) as f32;
            let col = (i % GRID_COLUMNS) as f32;
            DetectedComponent {
                name: name.to_string(),
                x: 0.2 + col * 0.3,
                y: 0.25 + row * 0.4,
                w: 0.1,
                h: 0.1,
                confidence: score_or(score, DEFAULT_LABEL_CONFIDENCE),
            }
        })
        .collect()
}

/// Map one annotation result onto components.
pub fn components_from_annotations(response: &AnnotateImageResponse) -> Vec<DetectedComponent> {
    let objects: Vec<_> = response
        .localized_object_annotations
        .iter()
        .filter_map(object_component)
        .collect();
    if !objects.is_empty() {
        return objects;
    }
    let fallback = grid_components(&response.label_annotations);
    if !fallback.is_empty() {
        log::info!(
            "no localized components, placing {} label(s) on the fallback grid",
            fallback.len()
        );
    }
    fallback
}

/// Turns stills into component lists through a [`RecognitionService`].
pub struct ComponentRecognizer<S> {
    service: S,
}

impl<S: RecognitionService> ComponentRecognizer<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// All-or-nothing: any failure yields an [`AnalysisError`] and no
    /// components.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(payload_len = image_base64.len()))
    )]
    pub fn analyze(
        &mut self,
        image_base64: &str,
    ) -> Result<Vec<DetectedComponent>, AnalysisError> {
        let payload = strip_data_url(image_base64);
        if payload.is_empty() {
            return Err(AnalysisError::NoImage);
        }
        let response = self
            .service
            .annotate(&AnnotateRequest::for_image(payload))
            .map_err(|err| {
                log::error!("recognition request failed: {err}");
                AnalysisError::Service(err)
            })?;
        let first = response.responses.into_iter().next().unwrap_or_default();
        if let Some(status) = first.error {
            log::error!("recognition service error {}: {}", status.code, status.message);
            return Err(AnalysisError::Remote {
                code: status.code,
                message: status.message,
            });
        }
        let components = components_from_annotations(&first);
        log::info!("detected {} electronic component(s)", components.len());
        Ok(components)
    }
}

/// Accept either a bare base64 payload or a full `data:` URL.
pub fn strip_data_url(image: &str) -> &str {
    let payload = match image.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or("", |(_, payload)| payload),
        None => image,
    };
    payload.trim()
}
