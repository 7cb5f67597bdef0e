use std::sync::Arc;

use compute::SampleProperty;
use formats::GeoJson;
use foundation::{Centroid, LatLng};
use layers::BoundingBoxEditor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use submit::SubmitMode;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    One,
    Two,
    Three,
    Complete,
}

impl WizardStep {
    pub fn next(self) -> Self {
        match self {
            WizardStep::One => WizardStep::Two,
            WizardStep::Two => WizardStep::Three,
            WizardStep::Three | WizardStep::Complete => WizardStep::Complete,
        }
    }

    pub fn route(self) -> &'static str {
        match self {
            WizardStep::One => "/setup/step-1",
            WizardStep::Two => "/setup/step-2",
            WizardStep::Three => "/setup/step-3",
            WizardStep::Complete => "/setup/complete",
        }
    }

    pub fn from_route(path: &str) -> Option<Self> {
        [
            WizardStep::One,
            WizardStep::Two,
            WizardStep::Three,
            WizardStep::Complete,
        ]
        .into_iter()
        .find(|s| s.route() == path.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub is_twg: bool,
    #[serde(default)]
    pub is_collaborator: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Server-issued setup record. Fields the wizard does not know about are
/// carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_center: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_name_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppConfig {
    /// Non-blank uuid, if the server assigned one.
    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn submit_mode(&self) -> SubmitMode {
        SubmitMode::from_uuid(self.uuid())
    }

    /// Organizations that may host reviewers.
    pub fn twg_organizations(&self) -> impl Iterator<Item = &Organization> {
        self.organizations.iter().filter(|o| o.is_twg)
    }

    /// `map_center` as stored by the server: an object or its JSON text.
    pub fn map_center(&self) -> Option<LatLng> {
        match self.map_center.as_ref()? {
            Value::String(text) => serde_json::from_str(text).ok(),
            other => serde_json::from_value(other.clone()).ok(),
        }
    }
}

/// Everything the wizard knows right now.
#[derive(Debug, Clone)]
pub struct WizardState {
    pub current_step: WizardStep,
    /// Highest step the operator has reached; forward navigation stops here.
    pub furthest_step: WizardStep,
    pub app_config: Option<AppConfig>,
    pub geo_data: Option<Arc<GeoJson>>,
    pub centroid: Option<Centroid>,
    pub sample_properties: Vec<SampleProperty>,
    pub admin_name_key: Option<String>,
    pub editor: Option<BoundingBoxEditor>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: WizardStep::One,
            furthest_step: WizardStep::One,
            app_config: None,
            geo_data: None,
            centroid: None,
            sample_properties: Vec::new(),
            admin_name_key: None,
            editor: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn unknown_fields_round_trip() {
        let raw = json!({
            "uuid": "abc",
            "name": "Drought Watch",
            "topojson_file": "/storage/topojson/country.json",
            "organizations": [
                {"id": 3, "name": "Met", "website": "https://met.example", "logo": null,
                 "is_twg": true, "is_collaborator": false, "created_at": "2025-01-01"}
            ],
            "message": "Setup completed successfully"
        });
        let cfg: AppConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(cfg.uuid(), Some("abc"));
        assert_eq!(cfg.extra["topojson_file"], json!("/storage/topojson/country.json"));
        assert_eq!(cfg.organizations[0].extra["created_at"], json!("2025-01-01"));
        assert_eq!(serde_json::to_value(&cfg).unwrap(), raw);
    }

    #[test]
    fn blank_uuid_means_create() {
        let cfg = AppConfig {
            uuid: Some(" ".into()),
            ..Default::default()
        };
        assert_eq!(cfg.submit_mode(), SubmitMode::Create);
    }

    #[test]
    fn map_center_accepts_object_or_text() {
        let mut cfg = AppConfig {
            map_center: Some(json!({"lat": 1.5, "lng": 2.5})),
            ..Default::default()
        };
        assert_eq!(cfg.map_center(), Some(LatLng::new(1.5, 2.5)));
        cfg.map_center = Some(json!("{\"lat\":3,\"lng\":4}"));
        assert_eq!(cfg.map_center(), Some(LatLng::new(3.0, 4.0)));
    }

    #[test]
    fn routes_map_to_steps() {
        assert_eq!(WizardStep::from_route("/setup/step-2/"), Some(WizardStep::Two));
        assert_eq!(WizardStep::from_route("/setup"), None);
        assert_eq!(WizardStep::Three.next(), WizardStep::Complete);
        assert!(WizardStep::One < WizardStep::Complete);
    }
}
