//! Editable portfolio content.
//!
//! [`OnboardingData`] is the single aggregate persisted per storage location.
//! Every field is fully populated after a load; sections that were never
//! edited are empty records or empty lists, never absent.

use serde::{Deserialize, Serialize};

use crate::normalize::{StoredCertificate, StoredOnboardingData, infer_mime_type, null_as_default};

/// Site title used when none has been set or the stored one is blank.
pub const DEFAULT_SITE_TITLE: &str = "Ash-Resume";

/// Media type assumed when a data URL carries no readable prefix.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredOnboardingData")]
pub struct OnboardingData {
    pub completed: bool,
    pub skipped: bool,
    pub welcome_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo_data_url: Option<String>,
    pub site_title: String,
    pub certificates: Vec<Certificate>,
    pub personal_details: PersonalDetails,
    pub projects: Vec<Project>,
    pub home_content: HomeContent,
    pub about_content: AboutContent,
    pub experiences: Vec<ExperienceEntry>,
    pub projects_page_content: ProjectsPageContent,
    pub certificates_page_content: CertificatesPageContent,
    pub contact_content: ContactContent,
}

impl Default for OnboardingData {
    fn default() -> Self {
        Self {
            completed: false,
            skipped: false,
            welcome_completed: false,
            profile_photo_data_url: None,
            site_title: DEFAULT_SITE_TITLE.to_owned(),
            certificates: Vec::new(),
            personal_details: PersonalDetails::default(),
            projects: Vec::new(),
            home_content: HomeContent::default(),
            about_content: AboutContent::default(),
            experiences: Vec::new(),
            projects_page_content: ProjectsPageContent::default(),
            certificates_page_content: CertificatesPageContent::default(),
            contact_content: ContactContent::default(),
        }
    }
}

/// Resolved certificate file: the data URL to render and its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFile {
    pub data_url: String,
    pub mime_type: String,
}

impl CertificateFile {
    pub fn new(data_url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Builds a file whose media type is read from the data URL prefix.
    pub fn from_data_url(data_url: impl Into<String>) -> Self {
        let data_url = data_url.into();
        let mime_type = infer_mime_type(&data_url).to_owned();
        Self {
            data_url,
            mime_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCertificate", into = "StoredCertificate")]
pub struct Certificate {
    pub id: String,
    pub title: String,
    pub issuer: String,
    /// Display string, never parsed.
    pub date: String,
    pub file: Option<CertificateFile>,
    legacy_image_data_url: Option<String>,
}

impl Certificate {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        issuer: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            issuer: issuer.into(),
            date: date.into(),
            file: None,
            legacy_image_data_url: None,
        }
    }

    #[must_use]
    pub fn with_file(mut self, file: CertificateFile) -> Self {
        self.file = Some(file);
        self
    }

    pub(crate) fn from_parts(
        id: String,
        title: String,
        issuer: String,
        date: String,
        file: Option<CertificateFile>,
        legacy_image_data_url: Option<String>,
    ) -> Self {
        Self {
            id,
            title,
            issuer,
            date,
            file,
            legacy_image_data_url,
        }
    }

    /// Legacy image field kept verbatim when it differs from the current file.
    pub fn legacy_image_data_url(&self) -> Option<&str> {
        self.legacy_image_data_url.as_deref()
    }

    pub fn file_url(&self) -> Option<&str> {
        self.file
            .as_ref()
            .map(|file| file.data_url.as_str())
            .or(self.legacy_image_data_url.as_deref())
    }

    pub fn mime_type(&self) -> &str {
        match (&self.file, &self.legacy_image_data_url) {
            (Some(file), _) => file.mime_type.as_str(),
            (None, Some(legacy)) => infer_mime_type(legacy),
            (None, None) => DEFAULT_MIME_TYPE,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type() == PDF_MIME_TYPE
    }

    /// A file representation resolves, whatever the text fields hold.
    pub fn is_displayable(&self) -> bool {
        self.file_url().is_some_and(|url| !url.is_empty())
    }

    /// Title, issuer and date are filled in and a file resolves.
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty()
            && !self.issuer.is_empty()
            && !self.date.is_empty()
            && self.is_displayable()
    }
}

pub fn displayable_certificates(certificates: &[Certificate]) -> Vec<&Certificate> {
    certificates.iter().filter(|c| c.is_displayable()).collect()
}

pub fn complete_certificates(certificates: &[Certificate]) -> Vec<&Certificate> {
    certificates.iter().filter(|c| c.is_complete()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

pub fn valid_projects(projects: &[Project]) -> Vec<&Project> {
    projects.iter().filter(|p| p.is_valid()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(deserialize_with = "null_as_default")]
    pub period: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AboutContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectsPageContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_subtitle: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CertificatesPageContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_subtitle: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_description: Option<String>,
}
