use std::rc::Rc;

use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder};
use serde_json::Value;
use submit::{ConfigGate, FormValue, Method, MultipartForm, SetupApi, SetupApiError, SetupRequest};
use wasm_bindgen::JsValue;
use web_sys::{Blob, BlobPropertyBag, FormData};
use wizard::WizardConfig;

fn js_message(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// Setup API over `fetch`, with the pre-shared secret on every call.
#[derive(Debug, Clone)]
pub struct HttpSetupApi {
    config: Rc<WizardConfig>,
}

impl HttpSetupApi {
    pub fn new(config: Rc<WizardConfig>) -> Self {
        Self { config }
    }

    fn builder(&self, method: Method, path: &str) -> RequestBuilder {
        secret_request(&self.config, method, path)
    }
}

fn secret_request(config: &WizardConfig, method: Method, path: &str) -> RequestBuilder {
    let url = config.endpoint(path);
    let builder = match method {
        Method::Get => Request::get(&url),
        Method::Post => Request::post(&url),
        Method::Put => Request::put(&url),
    };
    if config.setup_secret.is_empty() {
        builder
    } else {
        builder.header(&config.setup_secret_header, &config.setup_secret)
    }
}

fn to_form_data(form: &MultipartForm) -> Result<FormData, JsValue> {
    let data = FormData::new()?;
    for (name, value) in form.parts() {
        match value {
            FormValue::Text(text) => data.append_with_str(name, text)?,
            FormValue::File(file) => {
                let bytes = js_sys::Uint8Array::from(file.bytes.as_slice());
                let parts = js_sys::Array::of1(&bytes);
                let options = BlobPropertyBag::new();
                options.set_type(&file.mime);
                let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
                data.append_with_blob_and_filename(name, &blob, &file.file_name)?;
            }
        }
    }
    Ok(data)
}

/// Maps a finished response to the API result. Empty 2xx bodies read as `null`.
pub fn decode_response(status: u16, body: String) -> Result<Value, SetupApiError> {
    if !(200..300).contains(&status) {
        return Err(SetupApiError::Rejected { status, body });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| SetupApiError::Decode(e.to_string()))
}

#[async_trait(?Send)]
impl SetupApi for HttpSetupApi {
    async fn send(&self, request: SetupRequest) -> Result<Value, SetupApiError> {
        let builder = self.builder(request.method, &request.path);
        let built = if request.form.is_empty() {
            builder.build()
        } else {
            let data =
                to_form_data(&request.form).map_err(|e| SetupApiError::Transport(js_message(e)))?;
            builder.body(data)
        };
        let pending = built.map_err(|e| SetupApiError::Transport(e.to_string()))?;

        let response = pending
            .send()
            .await
            .map_err(|e| SetupApiError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SetupApiError::Decode(e.to_string()))?;
        decode_response(status, body)
    }
}

/// `GET {api}/setup/?format=json`; 200 means the instance is configured.
#[derive(Debug, Clone)]
pub struct HttpConfigGate {
    config: Rc<WizardConfig>,
}

impl HttpConfigGate {
    pub fn new(config: Rc<WizardConfig>) -> Self {
        Self { config }
    }
}

#[async_trait(?Send)]
impl ConfigGate for HttpConfigGate {
    async fn is_configured(&self) -> Result<bool, SetupApiError> {
        let response = secret_request(&self.config, Method::Get, "/setup/?format=json")
            .send()
            .await
            .map_err(|e| SetupApiError::Transport(e.to_string()))?;
        Ok(response.status() == 200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn success_bodies_decode() {
        assert_eq!(
            decode_response(201, r#"{"uuid":"abc"}"#.into()).unwrap(),
            json!({"uuid": "abc"})
        );
        assert_eq!(decode_response(204, String::new()).unwrap(), Value::Null);
    }

    #[test]
    fn failures_keep_status_and_body() {
        match decode_response(400, r#"{"name":["required"]}"#.into()) {
            Err(SetupApiError::Rejected { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, r#"{"name":["required"]}"#);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            decode_response(200, "<html>".into()),
            Err(SetupApiError::Decode(_))
        ));
    }
}
