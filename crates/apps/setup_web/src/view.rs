//! JSON shapes handed to the page.

use std::collections::BTreeMap;

use foundation::{BoundingBox, Centroid};
use layers::{BoundaryOverlay, BoxOverlay, FitBounds, NumericFields};
use serde::Serialize;
use serde_json::Value;
use storage::KeyValueBackend;
use submit::{AppSetupForm, SetupApiError, SubmitMode, UserSetupForm};
use wizard::{Organization, Outcome, UploadSummary, WizardError, WizardMachine, WizardStep};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxView {
    pub bbox: BoundingBox,
    pub fields: NumericFields,
    pub editable: bool,
    pub visible: bool,
    pub overlay: Option<BoxOverlay>,
    pub fit: FitBounds,
}

/// Everything the page needs to redraw the wizard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardView {
    pub route: &'static str,
    pub furthest_route: &'static str,
    pub uuid: Option<String>,
    pub submitting: bool,
    pub boundary_loaded: bool,
    /// Outline layer for the loaded boundary; the page already holds its geometry.
    pub boundary: Option<BoundaryOverlay>,
    pub centroid: Option<Centroid>,
    pub property_names: Vec<String>,
    pub admin_name_key: Option<String>,
    pub bounding_box: Option<BoxView>,
}

impl WizardView {
    pub fn of<B: KeyValueBackend>(machine: &WizardMachine<B>) -> Self {
        let state = machine.state();
        let uuid = match machine.mode() {
            SubmitMode::Update { uuid } => Some(uuid.clone()),
            SubmitMode::Create => None,
        };
        Self {
            route: state.current_step.route(),
            furthest_route: state.furthest_step.route(),
            uuid,
            submitting: machine.is_submitting(),
            boundary_loaded: state.geo_data.is_some(),
            boundary: state.geo_data.as_ref().map(|_| BoundaryOverlay::default()),
            centroid: state.centroid,
            property_names: state
                .sample_properties
                .iter()
                .map(|p| p.name.clone())
                .collect(),
            admin_name_key: state.admin_name_key.clone(),
            bounding_box: state.editor.as_ref().map(|ed| BoxView {
                bbox: ed.bbox(),
                fields: *ed.fields(),
                editable: ed.is_editable(),
                visible: ed.is_visible(),
                overlay: ed.overlay(),
                fit: ed.fit_bounds(),
            }),
        }
    }
}

/// Prefill for whichever step is showing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PrefillView<'a> {
    AppSetup {
        form: AppSetupForm,
    },
    BoundingBox {
        form: Option<submit::BoundingBoxForm>,
    },
    Users {
        form: UserSetupForm,
        organizations: Vec<&'a Organization>,
    },
    Complete,
}

impl<'a> PrefillView<'a> {
    pub fn of<B: KeyValueBackend>(machine: &'a WizardMachine<B>) -> Self {
        match machine.current_step() {
            WizardStep::One => PrefillView::AppSetup {
                form: machine.prefill_app_setup(),
            },
            WizardStep::Two => PrefillView::BoundingBox {
                form: machine.prefill_bounding_box(),
            },
            WizardStep::Three => PrefillView::Users {
                form: machine.prefill_users(),
                organizations: machine.reviewer_organizations(),
            },
            WizardStep::Complete => PrefillView::Complete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeView<T> {
    Applied { result: T },
    Superseded,
}

impl<T> From<Outcome<T>> for OutcomeView<T> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Applied(result) => OutcomeView::Applied { result },
            Outcome::Superseded => OutcomeView::Superseded,
        }
    }
}

pub fn step_outcome(outcome: Outcome<WizardStep>) -> OutcomeView<&'static str> {
    match outcome {
        Outcome::Applied(step) => OutcomeView::Applied {
            result: step.route(),
        },
        Outcome::Superseded => OutcomeView::Superseded,
    }
}

pub fn upload_outcome(outcome: Outcome<UploadSummary>) -> OutcomeView<UploadSummary> {
    outcome.into()
}

/// Error shape thrown into JS. Server rejections keep their body; when it is
/// JSON it is passed through parsed so field errors can be shown inline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorView {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ErrorView {
    fn plain(kind: &'static str, message: String) -> Self {
        Self {
            kind,
            message,
            fields: BTreeMap::new(),
            status: None,
            body: None,
        }
    }
}

impl From<&WizardError> for ErrorView {
    fn from(err: &WizardError) -> Self {
        let message = err.to_string();
        match err {
            WizardError::MalformedUpload(_) => Self::plain("malformed_upload", message),
            WizardError::Read(_) => Self::plain("read", message),
            WizardError::Validation(errors) => Self {
                fields: errors.fields.clone(),
                ..Self::plain("validation", message)
            },
            WizardError::Submission(SetupApiError::Rejected { status, body }) => Self {
                status: Some(*status),
                body: Some(
                    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.clone())),
                ),
                ..Self::plain("rejected", message)
            },
            WizardError::Submission(_) => Self::plain("submission", message),
            WizardError::SubmissionInFlight => Self::plain("in_flight", message),
            WizardError::NoGeometry => Self::plain("no_geometry", message),
            WizardError::UnknownProperty(_) => Self::plain("unknown_property", message),
            WizardError::InvalidStep { .. } => Self::plain("invalid_step", message),
        }
    }
}
