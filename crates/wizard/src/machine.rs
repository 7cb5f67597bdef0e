use std::sync::Arc;

use compute::{bounding_box, centroid, sample_properties};
use formats::{GeoJson, GeoJsonError};
use foundation::{BoundingBox, Centroid, Corner, LatLng, SequenceFence, Ticket};
use layers::{BoundingBoxEditor, BoxField};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storage::{KeyValueBackend, KeyValueTier, StorageKeys};
use submit::{
    AppSetupForm, BoundingBoxForm, OrganizationForm, ReviewerForm, SetupApiError, SetupRequest,
    SubmitMode, UserSetupForm,
};

use crate::error::WizardError;
use crate::state::{AppConfig, Organization, WizardState, WizardStep};

/// Result of an asynchronous completion.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Applied(T),
    /// A newer request was started; this result was dropped.
    Superseded,
}

impl<T> Outcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(v) => Some(v),
            Outcome::Superseded => None,
        }
    }
}

/// What a successful upload derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSummary {
    pub centroid: Option<Centroid>,
    pub bounding_box: Option<BoundingBox>,
    pub property_names: Vec<String>,
}

/// A request built and fenced by the machine, ready to be sent.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub ticket: Ticket,
    pub step: WizardStep,
    pub request: SetupRequest,
}

/// Synchronous core of the wizard. Every state change goes through here;
/// the async session only ferries results in.
#[derive(Debug)]
pub struct WizardMachine<B> {
    state: WizardState,
    kv: KeyValueTier<B>,
    keys: StorageKeys,
    mode: SubmitMode,
    uploads: SequenceFence,
    submissions: SequenceFence,
}

impl<B: KeyValueBackend> WizardMachine<B> {
    /// Starts at step 1, adopting whatever `AppConfig` the key-value tier holds.
    pub fn mount(kv: KeyValueTier<B>, keys: StorageKeys) -> Self {
        let mut machine = Self {
            state: WizardState::default(),
            kv,
            keys,
            mode: SubmitMode::Create,
            uploads: SequenceFence::new(),
            submissions: SequenceFence::new(),
        };
        machine.refresh_app_config();
        match &machine.mode {
            SubmitMode::Update { uuid } => tracing::info!(%uuid, "resuming setup for existing record"),
            SubmitMode::Create => tracing::info!("starting new setup"),
        }
        machine
    }

    /// Re-reads the stored `AppConfig`. Returns whether one was found; when
    /// the tier is empty the in-memory record is kept.
    pub fn refresh_app_config(&mut self) -> bool {
        let Some(cfg) = self.kv.get::<AppConfig>(&self.keys.app_config) else {
            return false;
        };
        self.adopt_record(cfg);
        true
    }

    /// A record with a uuid means step 1 is on the server, so every step opens.
    /// Map centre and name key only seed state when no boundary is loaded.
    fn adopt_record(&mut self, cfg: AppConfig) {
        if let Some(uuid) = cfg.uuid() {
            self.mode = SubmitMode::Update {
                uuid: uuid.to_string(),
            };
            self.state.furthest_step = self.state.furthest_step.max(WizardStep::Three);
        }
        if self.state.geo_data.is_none() {
            if let Some(center) = cfg.map_center() {
                self.state.centroid = Some(center);
            }
            if cfg.map_name_key.is_some() {
                self.state.admin_name_key = cfg.map_name_key.clone();
            }
        }
        self.state.app_config = Some(cfg);
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> WizardStep {
        self.state.current_step
    }

    pub fn mode(&self) -> &SubmitMode {
        &self.mode
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn kv(&self) -> &KeyValueTier<B> {
        &self.kv
    }

    pub fn is_submitting(&self) -> bool {
        self.submissions.is_pending()
    }

    pub fn needs_geometry(&self) -> bool {
        self.state.geo_data.is_none()
    }

    // ---- navigation --------------------------------------------------------

    /// Moves to an already reached step. Cancels any in-flight submission.
    pub fn go_to(&mut self, step: WizardStep) -> Result<(), WizardError> {
        let current = self.state.current_step;
        if current == WizardStep::Complete || step > self.state.furthest_step {
            return Err(WizardError::InvalidStep {
                current,
                requested: step,
            });
        }
        if step != current {
            if self.submissions.is_pending() {
                tracing::debug!(?current, "navigation cancels pending submission");
                self.submissions.cancel();
            }
            tracing::info!(from = ?current, to = ?step, "wizard navigation");
            self.state.current_step = step;
        }
        if step == WizardStep::Two {
            self.ensure_editor();
        }
        Ok(())
    }

    /// Rebuilds the bbox editor from the loaded boundary if it was dropped.
    /// Returns whether an editor exists afterwards.
    pub fn ensure_editor(&mut self) -> bool {
        if self.state.editor.is_none() {
            if let Some(doc) = &self.state.geo_data {
                self.state.editor = bounding_box(doc).map(BoundingBoxEditor::new);
                tracing::debug!(rebuilt = self.state.editor.is_some(), "bbox editor derived from boundary");
            }
        }
        self.state.editor.is_some()
    }

    // ---- prefill -----------------------------------------------------------

    /// Step-1 form seeded from the stored record. File fields stay empty.
    pub fn prefill_app_setup(&self) -> AppSetupForm {
        let organizations = match &self.state.app_config {
            Some(cfg) if !cfg.organizations.is_empty() => cfg
                .organizations
                .iter()
                .map(|o| OrganizationForm {
                    name: o.name.clone(),
                    website: o.website.clone().unwrap_or_default(),
                    is_twg: o.is_twg,
                    is_collaborator: o.is_collaborator,
                    logo: None,
                })
                .collect(),
            _ => vec![OrganizationForm::default()],
        };
        AppSetupForm {
            name: self
                .state
                .app_config
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            organizations,
            map_name_key: self.state.admin_name_key.clone(),
            map_center: self.state.centroid,
            ..Default::default()
        }
    }

    /// Current numeric fields of the bbox editor.
    pub fn prefill_bounding_box(&self) -> Option<BoundingBoxForm> {
        self.state.editor.as_ref().map(|ed| {
            let f = ed.fields();
            BoundingBoxForm {
                s_lat: f.south,
                w_lon: f.west,
                n_lat: f.north,
                e_lon: f.east,
            }
        })
    }

    pub fn prefill_users(&self) -> UserSetupForm {
        UserSetupForm {
            reviewers: vec![ReviewerForm::default()],
            ..Default::default()
        }
    }

    /// Organizations offered in the reviewer picker.
    pub fn reviewer_organizations(&self) -> Vec<&Organization> {
        self.state
            .app_config
            .as_ref()
            .map(|c| c.twg_organizations().collect())
            .unwrap_or_default()
    }

    // ---- geometry ----------------------------------------------------------

    pub fn begin_upload(&mut self) -> Ticket {
        self.uploads.issue()
    }

    pub fn is_latest_upload(&self, ticket: Ticket) -> bool {
        self.uploads.latest() == Some(ticket)
    }

    /// Lands the text of an upload started with [`Self::begin_upload`].
    ///
    /// On success the parsed JSON is returned alongside the summary so the
    /// caller can cache it. Malformed input leaves the state untouched.
    pub fn complete_upload(
        &mut self,
        ticket: Ticket,
        text: &str,
    ) -> Result<Outcome<(UploadSummary, Value)>, WizardError> {
        if !self.uploads.settle(ticket) {
            tracing::debug!(ticket = ticket.0, "stale upload dropped");
            return Ok(Outcome::Superseded);
        }
        let value: Value = serde_json::from_str(text).map_err(GeoJsonError::from)?;
        let doc = GeoJson::from_value(&value)?;
        let summary = self.install_geometry(doc, true);
        tracing::info!(
            properties = summary.property_names.len(),
            has_bbox = summary.bounding_box.is_some(),
            "boundary uploaded"
        );
        Ok(Outcome::Applied((summary, value)))
    }

    /// Adopts geometry found in the object-store tier, unless one is
    /// already in memory. Returns whether it was adopted.
    pub fn adopt_cached_geometry(&mut self, cached: &Value) -> Result<bool, WizardError> {
        if !self.needs_geometry() {
            return Ok(false);
        }
        let doc = GeoJson::from_value(cached)?;
        self.install_geometry(doc, false);
        tracing::info!("restored cached boundary");
        Ok(true)
    }

    fn install_geometry(&mut self, doc: GeoJson, fresh_upload: bool) -> UploadSummary {
        let c = centroid(&doc);
        let bbox = bounding_box(&doc);
        let props = sample_properties(&doc);

        if fresh_upload {
            self.state.admin_name_key = None;
        } else if let Some(key) = &self.state.admin_name_key {
            if !props.iter().any(|p| &p.name == key) {
                self.state.admin_name_key = None;
            }
        }
        if c.is_some() || fresh_upload {
            self.state.centroid = c;
        }
        self.state.editor = bbox.map(BoundingBoxEditor::new);
        let property_names = props.iter().map(|p| p.name.clone()).collect();
        self.state.sample_properties = props;
        self.state.geo_data = Some(Arc::new(doc));

        UploadSummary {
            centroid: self.state.centroid,
            bounding_box: bbox,
            property_names,
        }
    }

    /// Marks which sample property holds the administrative-unit name.
    pub fn select_admin_name(&mut self, key: &str) -> Result<(), WizardError> {
        if !self.state.sample_properties.iter().any(|p| p.name == key) {
            return Err(WizardError::UnknownProperty(key.to_string()));
        }
        self.state.admin_name_key = Some(key.to_string());
        Ok(())
    }

    // ---- bounding box ------------------------------------------------------

    fn editor_mut(&mut self) -> Result<&mut BoundingBoxEditor, WizardError> {
        self.state.editor.as_mut().ok_or(WizardError::NoGeometry)
    }

    pub fn set_bbox_editable(&mut self, editable: bool) -> Result<(), WizardError> {
        self.editor_mut()?.set_editable(editable);
        Ok(())
    }

    pub fn set_bbox_visible(&mut self, visible: bool) -> Result<(), WizardError> {
        self.editor_mut()?.set_visible(visible);
        Ok(())
    }

    pub fn drag_corner(
        &mut self,
        corner: Corner,
        to: LatLng,
    ) -> Result<Option<BoundingBox>, WizardError> {
        Ok(self.editor_mut()?.drag_corner(corner, to))
    }

    pub fn set_bbox_field(
        &mut self,
        field: BoxField,
        value: Option<f64>,
    ) -> Result<Option<BoundingBox>, WizardError> {
        Ok(self.editor_mut()?.set_field(field, value))
    }

    // ---- submissions -------------------------------------------------------

    fn expect_step(&self, step: WizardStep) -> Result<(), WizardError> {
        if self.submissions.is_pending() {
            return Err(WizardError::SubmissionInFlight);
        }
        if self.state.current_step != step {
            return Err(WizardError::InvalidStep {
                current: self.state.current_step,
                requested: step,
            });
        }
        Ok(())
    }

    fn fence(&mut self, step: WizardStep, request: SetupRequest) -> PendingSubmission {
        let ticket = self.submissions.issue();
        tracing::debug!(ticket = ticket.0, ?step, path = %request.path, "submission started");
        PendingSubmission {
            ticket,
            step,
            request,
        }
    }

    /// Validates step 1 and builds its request. Map name key and centre
    /// default to what the upload derived.
    pub fn prepare_app_setup(
        &mut self,
        mut form: AppSetupForm,
    ) -> Result<PendingSubmission, WizardError> {
        self.expect_step(WizardStep::One)?;
        if form.map_name_key.is_none() {
            form.map_name_key = self.state.admin_name_key.clone();
        }
        if form.map_center.is_none() {
            form.map_center = self.state.centroid;
        }
        form.validate(self.mode.is_create())?;
        let request = SetupRequest::app_setup(&form, &self.mode);
        Ok(self.fence(WizardStep::One, request))
    }

    pub fn prepare_bounding_box(&mut self) -> Result<PendingSubmission, WizardError> {
        self.expect_step(WizardStep::Two)?;
        let form = self.prefill_bounding_box().ok_or(WizardError::NoGeometry)?;
        form.validate()?;
        let request = SetupRequest::bounding_box(&form);
        Ok(self.fence(WizardStep::Two, request))
    }

    pub fn prepare_users(&mut self, form: UserSetupForm) -> Result<PendingSubmission, WizardError> {
        self.expect_step(WizardStep::Three)?;
        form.validate()?;
        let request = SetupRequest::user_setup(&form);
        Ok(self.fence(WizardStep::Three, request))
    }

    /// Lands a submission result. Success advances exactly one step;
    /// failure leaves everything as it was.
    pub fn complete_submission(
        &mut self,
        pending: &PendingSubmission,
        result: Result<Value, SetupApiError>,
    ) -> Result<Outcome<WizardStep>, WizardError> {
        let current = self.submissions.settle(pending.ticket);
        // Step-1 records land even when superseded; the server already holds them.
        if let (WizardStep::One, Ok(response)) = (pending.step, &result) {
            self.adopt_server_record(response);
        }
        if !current {
            tracing::debug!(ticket = pending.ticket.0, "stale submission result dropped");
            return Ok(Outcome::Superseded);
        }
        result?;

        if pending.step == WizardStep::Two {
            self.state.editor = None;
        }

        let next = pending.step.next();
        self.state.current_step = next;
        self.state.furthest_step = self.state.furthest_step.max(next);
        tracing::info!(?next, "setup step accepted");
        Ok(Outcome::Applied(next))
    }

    fn adopt_server_record(&mut self, response: &Value) {
        let Ok(cfg) = AppConfig::deserialize(response) else {
            tracing::warn!("step 1 response is not a setup record; keeping local state");
            return;
        };
        if cfg.uuid().is_none() {
            tracing::warn!("step 1 response carries no uuid; keeping local state");
            return;
        }
        if let Err(err) = self.kv.set(&self.keys.app_config, &cfg) {
            tracing::warn!(%err, "could not persist setup record");
        }
        self.adopt_record(cfg);
    }
}
