use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::form::MultipartForm;
use crate::steps::{AppSetupForm, BoundingBoxForm, FormErrors, UserSetupForm};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

/// Whether step 1 creates the server record or updates an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Update { uuid: String },
}

impl SubmitMode {
    pub fn from_uuid(uuid: Option<&str>) -> Self {
        match uuid.map(str::trim).filter(|u| !u.is_empty()) {
            Some(uuid) => SubmitMode::Update {
                uuid: uuid.to_string(),
            },
            None => SubmitMode::Create,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, SubmitMode::Create)
    }
}

/// One call against the setup API, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupRequest {
    pub method: Method,
    pub path: String,
    pub form: MultipartForm,
}

impl SetupRequest {
    pub fn app_setup(form: &AppSetupForm, mode: &SubmitMode) -> Self {
        let (method, path) = match mode {
            SubmitMode::Create => (Method::Post, "/setup".to_string()),
            SubmitMode::Update { uuid } => (Method::Put, format!("/manage-setup/{uuid}")),
        };
        Self {
            method,
            path,
            form: form.to_multipart(),
        }
    }

    pub fn bounding_box(form: &BoundingBoxForm) -> Self {
        Self {
            method: Method::Post,
            path: "/bbox-setup".to_string(),
            form: form.to_multipart(),
        }
    }

    pub fn user_setup(form: &UserSetupForm) -> Self {
        Self {
            method: Method::Post,
            path: "/user-setup".to_string(),
            form: form.to_multipart(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SetupApiError {
    /// Non-2xx answer; `body` is the raw response text.
    #[error("setup API rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("setup API unreachable: {0}")]
    Transport(String),
    #[error("unexpected setup API response: {0}")]
    Decode(String),
    #[error(transparent)]
    Invalid(#[from] FormErrors),
}

/// Transport for the setup endpoints. Implementations attach the shared
/// secret header and resolve paths against the API base URL.
#[async_trait(?Send)]
pub trait SetupApi {
    async fn send(&self, request: SetupRequest) -> Result<Value, SetupApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxRecord {
    pub n_lat: f64,
    pub s_lat: f64,
    pub w_lon: f64,
    pub e_lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxResponse {
    pub bounding_box: BoundingBoxRecord,
    #[serde(default)]
    pub message: String,
}

/// Validates each step's form and hands it to the [`SetupApi`].
#[derive(Debug, Clone)]
pub struct StepSubmitter<A> {
    api: A,
}

impl<A: SetupApi> StepSubmitter<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn send(&self, request: SetupRequest) -> Result<Value, SetupApiError> {
        let method = request.method.as_str();
        let path = request.path.clone();
        tracing::info!(method, %path, parts = request.form.len(), "submitting setup step");
        match self.api.send(request).await {
            Ok(v) => Ok(v),
            Err(err) => {
                tracing::warn!(method, %path, %err, "setup step submission failed");
                Err(err)
            }
        }
    }

    pub async fn submit_app_setup(
        &self,
        form: &AppSetupForm,
        mode: &SubmitMode,
    ) -> Result<Value, SetupApiError> {
        form.validate(mode.is_create())?;
        self.send(SetupRequest::app_setup(form, mode)).await
    }

    pub async fn submit_bounding_box(
        &self,
        form: &BoundingBoxForm,
    ) -> Result<BoundingBoxResponse, SetupApiError> {
        form.validate()?;
        let value = self.send(SetupRequest::bounding_box(form)).await?;
        serde_json::from_value(value).map_err(|e| SetupApiError::Decode(e.to_string()))
    }

    pub async fn submit_users(&self, form: &UserSetupForm) -> Result<Map<String, Value>, SetupApiError> {
        form.validate()?;
        match self.send(SetupRequest::user_setup(form)).await? {
            Value::Object(obj) => Ok(obj),
            other => Err(SetupApiError::Decode(format!(
                "expected an object, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::OrganizationForm;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<SetupRequest>>,
        reply: RefCell<Option<Result<Value, SetupApiError>>>,
    }

    #[async_trait(?Send)]
    impl SetupApi for Recorder {
        async fn send(&self, request: SetupRequest) -> Result<Value, SetupApiError> {
            self.seen.borrow_mut().push(request);
            self.reply
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Ok(json!({"message": "ok"})))
        }
    }

    fn step1() -> AppSetupForm {
        AppSetupForm {
            name: "Drought Watch".into(),
            country: "Kenya".into(),
            organizations: vec![OrganizationForm {
                name: "Met".into(),
                website: "https://met.example".into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn existing_uuid_routes_to_manage_setup() {
        let req = SetupRequest::app_setup(&step1(), &SubmitMode::from_uuid(Some("abc")));
        assert_eq!(req.method, Method::Put);
        assert_eq!(req.path, "/manage-setup/abc");

        let req = SetupRequest::app_setup(&step1(), &SubmitMode::from_uuid(Some("  ")));
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, "/setup");
    }

    #[test]
    fn invalid_form_never_reaches_the_api() {
        let submitter = StepSubmitter::new(Recorder::default());
        let err = pollster::block_on(submitter.submit_app_setup(&step1(), &SubmitMode::Create))
            .unwrap_err();
        assert!(matches!(err, SetupApiError::Invalid(_)));
        assert!(submitter.api().seen.borrow().is_empty());
    }

    #[test]
    fn bbox_response_is_decoded() {
        let api = Recorder::default();
        *api.reply.borrow_mut() = Some(Ok(json!({
            "bounding_box": {"n_lat": 40.0, "s_lat": 20.0, "w_lon": 10.0, "e_lon": 30.0},
            "message": "Bounding box updated successfully"
        })));
        let submitter = StepSubmitter::new(api);
        let form = BoundingBoxForm::from(foundation::BoundingBox::new(10.0, 20.0, 30.0, 40.0));
        let resp = pollster::block_on(submitter.submit_bounding_box(&form)).unwrap();
        assert_eq!(resp.bounding_box.n_lat, 40.0);
        assert_eq!(submitter.api().seen.borrow()[0].path, "/bbox-setup");
    }

    #[test]
    fn rejection_is_passed_through() {
        let api = Recorder::default();
        *api.reply.borrow_mut() = Some(Err(SetupApiError::Rejected {
            status: 400,
            body: "{\"n_lat\":[\"bad\"]}".into(),
        }));
        let submitter = StepSubmitter::new(api);
        let form = BoundingBoxForm::from(foundation::BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        let err = pollster::block_on(submitter.submit_bounding_box(&form)).unwrap_err();
        assert!(matches!(err, SetupApiError::Rejected { status: 400, .. }));
    }
}
