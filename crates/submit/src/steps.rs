use std::collections::BTreeMap;

use foundation::{BoundingBox, LatLng, is_valid_lat, is_valid_lng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::{FileAttachment, MultipartForm};

/// Field-keyed validation messages, e.g. `organizations[0][website]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid form: {}", summarize(.fields))]
pub struct FormErrors {
    pub fields: BTreeMap<String, String>,
}

fn summarize(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl FormErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_insert(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub fn is_http_url(s: &str) -> bool {
    let s = s.trim();
    ["http://", "https://"]
        .iter()
        .any(|scheme| {
            s.len() > scheme.len()
                && s.get(..scheme.len())
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
        })
}

pub fn is_email(s: &str) -> bool {
    match s.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}

// ---- step 1 ----------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationForm {
    pub name: String,
    pub website: String,
    pub is_twg: bool,
    pub is_collaborator: bool,
    #[serde(skip)]
    pub logo: Option<FileAttachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSetupForm {
    pub name: String,
    pub country: String,
    #[serde(skip)]
    pub geojson_file: Option<FileAttachment>,
    pub organizations: Vec<OrganizationForm>,
    pub map_name_key: Option<String>,
    pub map_center: Option<LatLng>,
}

impl AppSetupForm {
    /// Files are only mandatory when the server has no record yet.
    pub fn validate(&self, creating: bool) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if blank(&self.name) {
            errors.add("name", "Please input the application name");
        }
        if blank(&self.country) {
            errors.add("country", "Please input the country");
        }
        if creating && self.geojson_file.is_none() {
            errors.add("geojson_file", "Please upload the country boundary");
        }
        if self.organizations.is_empty() {
            errors.add("organizations", "At least one organization is required.");
        }
        for (i, org) in self.organizations.iter().enumerate() {
            if blank(&org.name) {
                errors.add(
                    format!("organizations[{i}][name]"),
                    "Please input the organization name",
                );
            }
            if blank(&org.website) {
                errors.add(
                    format!("organizations[{i}][website]"),
                    "Please input the organization website",
                );
            } else if !is_http_url(&org.website) {
                errors.add(
                    format!("organizations[{i}][website]"),
                    "Please enter a valid URL",
                );
            }
            if creating && org.logo.is_none() {
                errors.add(format!("organizations[{i}][logo]"), "Please upload a logo");
            }
        }
        errors.into_result()
    }

    pub fn to_multipart(&self) -> MultipartForm {
        let mut form = MultipartForm::new();
        if !self.name.is_empty() {
            form.push_text("name", &self.name);
        }
        if !self.country.is_empty() {
            form.push_text("country", &self.country);
        }
        if let Some(file) = &self.geojson_file {
            form.push_file("geojson_file", file.clone());
        }
        for (i, org) in self.organizations.iter().enumerate() {
            if !org.name.is_empty() {
                form.push_text(format!("organizations[{i}][name]"), &org.name);
            }
            if !org.website.is_empty() {
                form.push_text(format!("organizations[{i}][website]"), &org.website);
            }
            if org.is_twg {
                form.push_text(format!("organizations[{i}][is_twg]"), "true");
            }
            if org.is_collaborator {
                form.push_text(format!("organizations[{i}][is_collaborator]"), "true");
            }
            if let Some(logo) = &org.logo {
                form.push_file(format!("organizations[{i}][logo]"), logo.clone());
            }
        }
        if let Some(key) = self.map_name_key.as_deref().filter(|k| !k.is_empty()) {
            form.push_text("map_name_key", key);
        }
        if let Some(center) = self.map_center {
            let json = serde_json::to_string(&center).unwrap_or_default();
            form.push_text("map_center", json);
        }
        form
    }
}

// ---- step 2 ----------------------------------------------------------------

#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxForm {
    pub s_lat: Option<f64>,
    pub w_lon: Option<f64>,
    pub n_lat: Option<f64>,
    pub e_lon: Option<f64>,
}

impl From<BoundingBox> for BoundingBoxForm {
    fn from(b: BoundingBox) -> Self {
        Self {
            s_lat: Some(b.south),
            w_lon: Some(b.west),
            n_lat: Some(b.north),
            e_lon: Some(b.east),
        }
    }
}

impl BoundingBoxForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        let checks = [
            ("s_lat", self.s_lat, "South latitude is required", true),
            ("w_lon", self.w_lon, "West longitude is required", false),
            ("n_lat", self.n_lat, "North latitude is required", true),
            ("e_lon", self.e_lon, "East longitude is required", false),
        ];
        for (field, value, missing, is_lat) in checks {
            match value {
                None => errors.add(field, missing),
                Some(v) if is_lat && !is_valid_lat(v) => {
                    errors.add(field, "Must be between -90 and 90")
                }
                Some(v) if !is_lat && !is_valid_lng(v) => {
                    errors.add(field, "Must be between -180 and 180")
                }
                Some(_) => {}
            }
        }
        errors.into_result()
    }

    pub fn to_multipart(&self) -> MultipartForm {
        let mut form = MultipartForm::new();
        for (name, value) in [
            ("s_lat", self.s_lat),
            ("w_lon", self.w_lon),
            ("n_lat", self.n_lat),
            ("e_lon", self.e_lon),
        ] {
            if let Some(v) = value {
                form.push_text(name, v.to_string());
            }
        }
        form
    }
}

// ---- step 3 ----------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewerForm {
    pub name: String,
    pub email: String,
    pub organization_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSetupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub reviewers: Vec<ReviewerForm>,
}

impl UserSetupForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if blank(&self.name) {
            errors.add("name", "Please input the admin full name");
        }
        if blank(&self.email) {
            errors.add("email", "Please input the admin e-mail");
        } else if !is_email(&self.email) {
            errors.add("email", "Please enter a valid e-mail address");
        }
        if self.password.is_empty() {
            errors.add("password", "Please input the admin password");
        }
        if self.confirm_password.is_empty() {
            errors.add("confirm_password", "Please confirm the password");
        } else if self.confirm_password != self.password {
            errors.add("confirm_password", "The two passwords do not match!");
        }
        for (i, r) in self.reviewers.iter().enumerate() {
            if blank(&r.name) {
                errors.add(format!("reviewers[{i}][name]"), "Missing reviewer name");
            }
            if blank(&r.email) {
                errors.add(format!("reviewers[{i}][email]"), "Missing reviewer email");
            } else if !is_email(&r.email) {
                errors.add(format!("reviewers[{i}][email]"), "Invalid email");
            }
            if r.organization_id.is_none() {
                errors.add(
                    format!("reviewers[{i}][organization_id]"),
                    "Select organization",
                );
            }
        }
        errors.into_result()
    }

    /// Reviewers go out as one `reviewers` part each, JSON with every `"`
    /// swapped for `'`; the backend parses them as Python literals.
    pub fn to_multipart(&self) -> MultipartForm {
        let mut form = MultipartForm::new();
        form.push_text("name", &self.name);
        form.push_text("email", &self.email);
        form.push_text("password", &self.password);
        form.push_text("confirm_password", &self.confirm_password);
        for reviewer in &self.reviewers {
            let json = serde_json::to_string(reviewer).unwrap_or_default();
            form.push_text("reviewers", json.replace('"', "'"));
        }
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn logo() -> FileAttachment {
        FileAttachment::new("logo.png", "image/png", vec![0x89, 0x50])
    }

    fn org(name: &str, website: &str) -> OrganizationForm {
        OrganizationForm {
            name: name.into(),
            website: website.into(),
            ..Default::default()
        }
    }

    #[test]
    fn step1_multipart_layout() {
        let form = AppSetupForm {
            name: "Drought Watch".into(),
            country: "Kenya".into(),
            geojson_file: Some(FileAttachment::new(
                "kenya.geojson",
                "application/geo+json",
                b"{}".to_vec(),
            )),
            organizations: vec![
                OrganizationForm {
                    is_twg: true,
                    logo: Some(logo()),
                    ..org("Met Office", "https://met.example")
                },
                OrganizationForm {
                    is_collaborator: true,
                    ..org("Ag Board", "http://ag.example")
                },
            ],
            map_name_key: Some("ADM1_EN".into()),
            map_center: Some(LatLng::new(0.5, 37.25)),
        };
        let mp = form.to_multipart();
        assert_eq!(
            mp.names(),
            vec![
                "name",
                "country",
                "geojson_file",
                "organizations[0][name]",
                "organizations[0][website]",
                "organizations[0][is_twg]",
                "organizations[0][logo]",
                "organizations[1][name]",
                "organizations[1][website]",
                "organizations[1][is_collaborator]",
                "map_name_key",
                "map_center",
            ]
        );
        assert_eq!(mp.text("organizations[0][is_twg]"), Some("true"));
        assert_eq!(mp.text("map_center"), Some(r#"{"lat":0.5,"lng":37.25}"#));
    }

    #[test]
    fn step1_validation_depends_on_mode() {
        let form = AppSetupForm {
            name: "  ".into(),
            country: "Kenya".into(),
            organizations: vec![org("Met", "ftp://nope")],
            ..Default::default()
        };
        let errs = form.validate(true).unwrap_err();
        assert_eq!(errs.get("name"), Some("Please input the application name"));
        assert_eq!(errs.get("geojson_file"), Some("Please upload the country boundary"));
        assert_eq!(errs.get("organizations[0][website]"), Some("Please enter a valid URL"));
        assert!(errs.get("organizations[0][logo]").is_some());

        let editing = AppSetupForm {
            name: "Drought Watch".into(),
            organizations: vec![org("Met", "https://met.example")],
            ..form
        };
        assert_eq!(editing.validate(false), Ok(()));
    }

    #[test]
    fn step1_requires_an_organization() {
        let form = AppSetupForm {
            name: "x".into(),
            country: "y".into(),
            ..Default::default()
        };
        let errs = form.validate(false).unwrap_err();
        assert!(errs.get("organizations").is_some());
        assert!(errs.to_string().starts_with("invalid form: organizations:"));
    }

    #[test]
    fn step2_fields_and_ranges() {
        let form = BoundingBoxForm::from(BoundingBox::new(10.0, -20.5, 30.0, 40.0));
        let mp = form.to_multipart();
        assert_eq!(mp.names(), vec!["s_lat", "w_lon", "n_lat", "e_lon"]);
        assert_eq!(mp.text("s_lat"), Some("-20.5"));
        assert_eq!(mp.text("w_lon"), Some("10"));
        assert_eq!(form.validate(), Ok(()));

        let bad = BoundingBoxForm {
            n_lat: Some(95.0),
            e_lon: None,
            ..form
        };
        let errs = bad.validate().unwrap_err();
        assert_eq!(errs.get("n_lat"), Some("Must be between -90 and 90"));
        assert_eq!(errs.get("e_lon"), Some("East longitude is required"));
    }

    #[test]
    fn step3_reviewers_use_single_quotes() {
        let form = UserSetupForm {
            name: "Admin".into(),
            email: "admin@example.org".into(),
            password: "s3cret".into(),
            confirm_password: "s3cret".into(),
            reviewers: vec![ReviewerForm {
                name: "Rev".into(),
                email: "rev@example.org".into(),
                organization_id: Some(3),
            }],
        };
        assert_eq!(form.validate(), Ok(()));
        let mp = form.to_multipart();
        assert_eq!(
            mp.texts("reviewers"),
            vec!["{'name':'Rev','email':'rev@example.org','organization_id':3}"]
        );
        assert_eq!(mp.text("confirm_password"), Some("s3cret"));
    }

    #[test]
    fn step3_validation_messages() {
        let form = UserSetupForm {
            name: "Admin".into(),
            email: "admin.example.org".into(),
            password: "a".into(),
            confirm_password: "b".into(),
            reviewers: vec![ReviewerForm::default()],
        };
        let errs = form.validate().unwrap_err();
        assert_eq!(errs.get("email"), Some("Please enter a valid e-mail address"));
        assert_eq!(errs.get("confirm_password"), Some("The two passwords do not match!"));
        assert_eq!(errs.get("reviewers[0][organization_id]"), Some("Select organization"));
    }

    #[test]
    fn url_and_email_checks() {
        assert!(is_http_url("HTTPS://x.org"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("www.x.org"));
        assert!(is_email("a@b"));
        assert!(!is_email("@b"));
        assert!(!is_email("a@"));
        assert!(!is_email("a@b@c"));
    }
}
