use console_error_panic_hook::set_once;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use foundation::{Corner, LatLng};
use layers::BoxField;
use storage::KeyValueTier;
use submit::{AppSetupForm, FileAttachment, RouteDecision, UserSetupForm, resolve_route};
use wizard::{WizardConfig, WizardError, WizardMachine, WizardSession, WizardStep};

pub mod http;
pub mod logging;
pub mod stores;
pub mod view;

use http::{HttpConfigGate, HttpSetupApi};
use stores::{HostBackend, HostObjectStore};
use view::{ErrorView, OutcomeView, PrefillView, WizardView, step_outcome, upload_outcome};

type HostSession = WizardSession<HostBackend, HostObjectStore, HttpSetupApi>;

struct SetupApp {
    session: HostSession,
    gate: HttpConfigGate,
}

thread_local! {
    static APP: RefCell<Option<Rc<SetupApp>>> = const { RefCell::new(None) };
}

fn app() -> Result<Rc<SetupApp>, JsValue> {
    APP.with(|slot| slot.borrow().clone())
        .ok_or_else(|| JsValue::from_str("setup wizard not initialised; call init() first"))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    js_sys::JSON::parse(&text)
}

fn wizard_err(err: WizardError) -> JsValue {
    to_js(&ErrorView::from(&err)).unwrap_or_else(|_| JsValue::from_str(&err.to_string()))
}

fn parse_json<T: serde::de::DeserializeOwned>(what: &str, raw: &str) -> Result<T, JsValue> {
    serde_json::from_str(raw).map_err(|e| JsValue::from_str(&format!("invalid {what}: {e}")))
}

fn parse_step(route: &str) -> Result<WizardStep, JsValue> {
    WizardStep::from_route(route)
        .ok_or_else(|| JsValue::from_str(&format!("unknown wizard route '{route}'")))
}

async fn read_text(file: web_sys::File) -> Result<String, String> {
    let text = JsFuture::from(file.text())
        .await
        .map_err(|e| format!("{e:?}"))?;
    text.as_string()
        .ok_or_else(|| "file did not decode as text".to_string())
}

async fn read_attachment(file: web_sys::File) -> Result<FileAttachment, WizardError> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| WizardError::Read(format!("{e:?}")))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Ok(FileAttachment::new(file.name(), file.type_(), bytes))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Reads the host configuration, installs logging and mounts the wizard
/// from whatever the browser tiers hold.
#[wasm_bindgen]
pub fn init(config_json: &str) -> Result<JsValue, JsValue> {
    let config = WizardConfig::from_json(config_json)
        .map_err(|e| JsValue::from_str(&format!("invalid wizard config: {e}")))?;
    logging::init(&config.log_filter);

    let config = Rc::new(config);
    let kv = KeyValueTier::new(HostBackend::new());
    let machine = WizardMachine::mount(kv, config.storage.clone());
    let objects = HostObjectStore::new(&config.storage);
    let session = WizardSession::new(machine, objects, HttpSetupApi::new(Rc::clone(&config)));
    let app = Rc::new(SetupApp {
        session,
        gate: HttpConfigGate::new(Rc::clone(&config)),
    });

    let view = to_js(&WizardView::of(&*app.session.machine()))?;
    APP.with(|slot| *slot.borrow_mut() = Some(app));
    tracing::info!(api = %config.api_base_url, "setup wizard ready");
    Ok(view)
}

/// Redirect target for `path`, or `null` to stay.
#[wasm_bindgen]
pub async fn route_gate(path: String) -> Result<JsValue, JsValue> {
    let app = app()?;
    Ok(match resolve_route(&app.gate, &path).await {
        RouteDecision::Proceed => JsValue::NULL,
        RouteDecision::Redirect(to) => JsValue::from_str(&to),
    })
}

#[wasm_bindgen]
pub fn snapshot() -> Result<JsValue, JsValue> {
    let app = app()?;
    let machine = app.session.machine();
    to_js(&WizardView::of(&*machine))
}

#[wasm_bindgen]
pub fn prefill() -> Result<JsValue, JsValue> {
    let app = app()?;
    let machine = app.session.machine();
    to_js(&PrefillView::of(&*machine))
}

#[wasm_bindgen]
pub async fn enter_step(route: String) -> Result<JsValue, JsValue> {
    let app = app()?;
    let step = parse_step(&route)?;
    app.session.enter_step(step).await.map_err(wizard_err)?;
    to_js(&WizardView::of(&*app.session.machine()))
}

#[wasm_bindgen]
pub async fn upload_boundary(file: web_sys::File) -> Result<JsValue, JsValue> {
    let app = app()?;
    let media_type = file.type_();
    tracing::debug!(name = %file.name(), size = file.size(), %media_type, "reading boundary file");
    let outcome = app
        .session
        .upload_file(&media_type, read_text(file))
        .await
        .map_err(wizard_err)?;
    to_js(&upload_outcome(outcome))
}

#[wasm_bindgen]
pub fn select_admin_name(key: &str) -> Result<(), JsValue> {
    let app = app()?;
    let handle = app.session.handle();
    let result = handle.borrow_mut().select_admin_name(key);
    result.map_err(wizard_err)
}

fn box_update(
    edit: impl FnOnce(&mut WizardMachine<HostBackend>) -> Result<(), WizardError>,
) -> Result<JsValue, JsValue> {
    let app = app()?;
    let handle = app.session.handle();
    let result = edit(&mut handle.borrow_mut());
    result.map_err(wizard_err)?;
    to_js(&WizardView::of(&*handle.borrow()).bounding_box)
}

/// Corner is one of `nw`, `ne`, `sw`, `se`.
#[wasm_bindgen]
pub fn drag_corner(corner: &str, lat: f64, lng: f64) -> Result<JsValue, JsValue> {
    let corner: Corner = corner
        .parse()
        .map_err(|e: String| JsValue::from_str(&e))?;
    box_update(|m| m.drag_corner(corner, LatLng::new(lat, lng)).map(drop))
}

/// `field` is a form name (`s_lat`, `w_lon`, `n_lat`, `e_lon`); `None` blanks it.
#[wasm_bindgen]
pub fn edit_bbox_field(field: &str, value: Option<f64>) -> Result<JsValue, JsValue> {
    let field: BoxField = field.parse().map_err(|e: String| JsValue::from_str(&e))?;
    box_update(|m| m.set_bbox_field(field, value).map(drop))
}

#[wasm_bindgen]
pub fn set_bbox_editable(editable: bool) -> Result<JsValue, JsValue> {
    box_update(|m| m.set_bbox_editable(editable))
}

#[wasm_bindgen]
pub fn set_bbox_visible(visible: bool) -> Result<JsValue, JsValue> {
    box_update(|m| m.set_bbox_visible(visible))
}

/// Step 1. `logos` lines up with `form.organizations`; holes may be `null`.
#[wasm_bindgen]
pub async fn submit_app_setup(
    form_json: String,
    boundary: Option<web_sys::File>,
    logos: js_sys::Array,
) -> Result<JsValue, JsValue> {
    let app = app()?;
    let mut form: AppSetupForm = parse_json("step 1 form", &form_json)?;
    if let Some(file) = boundary {
        form.geojson_file = Some(read_attachment(file).await.map_err(wizard_err)?);
    }
    for (i, org) in form.organizations.iter_mut().enumerate() {
        let Ok(file) = logos.get(i as u32).dyn_into::<web_sys::File>() else {
            continue;
        };
        org.logo = Some(read_attachment(file).await.map_err(wizard_err)?);
    }
    let outcome = app
        .session
        .submit_app_setup(form)
        .await
        .map_err(wizard_err)?;
    to_js(&step_outcome(outcome))
}

#[wasm_bindgen]
pub async fn submit_bounding_box() -> Result<JsValue, JsValue> {
    let app = app()?;
    let outcome = app.session.submit_bounding_box().await.map_err(wizard_err)?;
    to_js(&step_outcome(outcome))
}

#[wasm_bindgen]
pub async fn submit_users(form_json: String) -> Result<JsValue, JsValue> {
    let app = app()?;
    let form: UserSetupForm = parse_json("step 3 form", &form_json)?;
    let outcome = app.session.submit_users(form).await.map_err(wizard_err)?;
    let view: OutcomeView<&'static str> = step_outcome(outcome);
    to_js(&view)
}
