//! Errors surfaced by the wizard to its host.

use formats::GeoJsonError;
use submit::{FormErrors, SetupApiError};
use thiserror::Error;

use crate::state::WizardStep;

#[derive(Error, Debug)]
pub enum WizardError {
    /// The uploaded file is not usable GeoJSON; nothing was changed.
    #[error("boundary file rejected: {0}")]
    MalformedUpload(#[from] GeoJsonError),

    /// The file could not be read by the host.
    #[error("failed to read file: {0}")]
    Read(String),

    /// The step's form failed validation before anything was sent.
    #[error(transparent)]
    Validation(#[from] FormErrors),

    /// The server refused the step or could not be reached.
    #[error("submission failed: {0}")]
    Submission(SetupApiError),

    /// A submission for this wizard is still waiting on the server.
    #[error("a setup step is already being submitted")]
    SubmissionInFlight,

    /// The operation needs a boundary and none is loaded.
    #[error("no boundary geometry loaded")]
    NoGeometry,

    #[error("'{0}' is not a property of the uploaded boundary")]
    UnknownProperty(String),

    #[error("cannot move to {requested:?} while on {current:?}")]
    InvalidStep {
        current: WizardStep,
        requested: WizardStep,
    },
}

impl From<SetupApiError> for WizardError {
    fn from(err: SetupApiError) -> Self {
        match err {
            SetupApiError::Invalid(errors) => WizardError::Validation(errors),
            other => WizardError::Submission(other),
        }
    }
}
