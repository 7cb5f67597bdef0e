//! Onboarding wizard state machine.
//!
//! [`WizardMachine`] holds every piece of wizard state and applies uploads,
//! box edits and submission results synchronously. [`WizardSession`] drives
//! it across the asynchronous edges: object-store reads and writes, and the
//! setup API.

pub mod config;
pub mod error;
pub mod machine;
pub mod session;
pub mod state;

pub use config::WizardConfig;
pub use error::WizardError;
pub use machine::{Outcome, PendingSubmission, UploadSummary, WizardMachine};
pub use session::WizardSession;
pub use state::{AppConfig, Organization, WizardState, WizardStep};
