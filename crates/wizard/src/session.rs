use std::cell::{Ref, RefCell};
use std::future::Future;
use std::rc::Rc;

use formats::check_media_type;
use serde_json::Value;
use storage::{KeyValueBackend, ObjectStore};
use submit::{AppSetupForm, SetupApi, StepSubmitter, UserSetupForm};

use crate::error::WizardError;
use crate::machine::{Outcome, PendingSubmission, UploadSummary, WizardMachine};
use crate::state::WizardStep;

/// Async driver around a [`WizardMachine`].
///
/// Owns the object-store tier and the setup API. Machine borrows are taken
/// only between suspension points, so callbacks fired while a request is in
/// flight (drags, field edits, a second upload) still reach the machine.
pub struct WizardSession<B, O, A> {
    machine: Rc<RefCell<WizardMachine<B>>>,
    objects: O,
    submitter: StepSubmitter<A>,
}

impl<B, O, A> WizardSession<B, O, A>
where
    B: KeyValueBackend,
    O: ObjectStore,
    A: SetupApi,
{
    pub fn new(machine: WizardMachine<B>, objects: O, api: A) -> Self {
        if !objects.is_supported() {
            tracing::warn!("object store unsupported; boundary will not survive reloads");
        }
        Self {
            machine: Rc::new(RefCell::new(machine)),
            objects,
            submitter: StepSubmitter::new(api),
        }
    }

    pub fn machine(&self) -> Ref<'_, WizardMachine<B>> {
        self.machine.borrow()
    }

    /// Shared handle for synchronous UI callbacks.
    pub fn handle(&self) -> Rc<RefCell<WizardMachine<B>>> {
        Rc::clone(&self.machine)
    }

    pub fn objects(&self) -> &O {
        &self.objects
    }

    pub fn submitter(&self) -> &StepSubmitter<A> {
        &self.submitter
    }

    /// Re-reads the stored record, navigates to `step` and, if no boundary
    /// is in memory, restores the cached one from the object store.
    pub async fn enter_step(&self, step: WizardStep) -> Result<(), WizardError> {
        {
            let mut machine = self.machine.borrow_mut();
            machine.refresh_app_config();
            machine.go_to(step)?;
        }
        if step != WizardStep::Complete && self.machine.borrow().needs_geometry() {
            self.restore_geometry().await;
        }
        Ok(())
    }

    async fn restore_geometry(&self) {
        let key = self.machine.borrow().keys().app_geojson.clone();
        let cached = match self.objects.get(&key).await {
            Ok(Some(value)) => value,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(%err, "could not read cached boundary");
                return;
            }
        };
        if let Err(err) = self.machine.borrow_mut().adopt_cached_geometry(&cached) {
            tracing::warn!(%err, "cached boundary unusable; ignoring");
        }
    }

    /// Uploads already-read file text.
    pub async fn upload(&self, text: &str) -> Result<Outcome<UploadSummary>, WizardError> {
        let ticket = self.machine.borrow_mut().begin_upload();
        self.land_upload(ticket, Ok(text.to_string())).await
    }

    /// Uploads a file whose contents arrive through `read`. A later upload
    /// started while this one is reading wins.
    pub async fn upload_with<F>(&self, read: F) -> Result<Outcome<UploadSummary>, WizardError>
    where
        F: Future<Output = Result<String, String>>,
    {
        let ticket = self.machine.borrow_mut().begin_upload();
        let text = read.await;
        self.land_upload(ticket, text).await
    }

    /// Like [`Self::upload_with`], but first rejects files that do not
    /// declare a GeoJSON media type. A rejected file leaves any upload in
    /// flight alone.
    pub async fn upload_file<F>(
        &self,
        media_type: &str,
        read: F,
    ) -> Result<Outcome<UploadSummary>, WizardError>
    where
        F: Future<Output = Result<String, String>>,
    {
        check_media_type(media_type)?;
        self.upload_with(read).await
    }

    async fn land_upload(
        &self,
        ticket: foundation::Ticket,
        text: Result<String, String>,
    ) -> Result<Outcome<UploadSummary>, WizardError> {
        let text = match text {
            Ok(text) => text,
            Err(reason) if self.machine.borrow().is_latest_upload(ticket) => {
                return Err(WizardError::Read(reason));
            }
            Err(_) => return Ok(Outcome::Superseded),
        };
        let outcome = self.machine.borrow_mut().complete_upload(ticket, &text)?;
        let (summary, value) = match outcome {
            Outcome::Applied(applied) => applied,
            Outcome::Superseded => return Ok(Outcome::Superseded),
        };
        self.cache_geometry(ticket, value).await;
        Ok(Outcome::Applied(summary))
    }

    async fn cache_geometry(&self, ticket: foundation::Ticket, value: Value) {
        let key = {
            let machine = self.machine.borrow();
            if !machine.is_latest_upload(ticket) {
                tracing::debug!(ticket = ticket.0, "boundary superseded before caching");
                return;
            }
            machine.keys().app_geojson.clone()
        };
        match self.objects.set(&key, value).await {
            Ok(Some(_)) => tracing::debug!(ticket = ticket.0, "boundary cached"),
            Ok(None) => {}
            Err(err) => tracing::warn!(%err, "could not cache boundary"),
        }
    }

    async fn dispatch(
        &self,
        pending: PendingSubmission,
    ) -> Result<Outcome<WizardStep>, WizardError> {
        let result = self.submitter.send(pending.request.clone()).await;
        self.machine
            .borrow_mut()
            .complete_submission(&pending, result)
    }

    pub async fn submit_app_setup(
        &self,
        form: AppSetupForm,
    ) -> Result<Outcome<WizardStep>, WizardError> {
        let pending = self.machine.borrow_mut().prepare_app_setup(form)?;
        self.dispatch(pending).await
    }

    pub async fn submit_bounding_box(&self) -> Result<Outcome<WizardStep>, WizardError> {
        let pending = self.machine.borrow_mut().prepare_bounding_box()?;
        self.dispatch(pending).await
    }

    pub async fn submit_users(
        &self,
        form: UserSetupForm,
    ) -> Result<Outcome<WizardStep>, WizardError> {
        let pending = self.machine.borrow_mut().prepare_users(form)?;
        self.dispatch(pending).await
    }
}
