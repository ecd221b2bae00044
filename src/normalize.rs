//! Persisted shapes and the defaulting pass applied on every load.
//!
//! The stored blob carries no schema version. Older blobs may lack whole
//! sections, hold `null` where a value is expected, or keep certificate files
//! only in the legacy `imageDataUrl` field. Everything is resolved here so
//! the rest of the crate only sees [`OnboardingData`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::content::{
    AboutContent, Certificate, CertificateFile, CertificatesPageContent, ContactContent,
    DEFAULT_MIME_TYPE, DEFAULT_SITE_TITLE, ExperienceEntry, HomeContent, OnboardingData,
    PersonalDetails, Project, ProjectsPageContent,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredOnboardingData {
    pub completed: Option<bool>,
    pub skipped: Option<bool>,
    pub welcome_completed: Option<bool>,
    pub profile_photo_data_url: Option<String>,
    pub site_title: Option<String>,
    pub certificates: Option<Vec<StoredCertificate>>,
    pub personal_details: Option<PersonalDetails>,
    pub projects: Option<Vec<Project>>,
    pub home_content: Option<HomeContent>,
    pub about_content: Option<AboutContent>,
    pub experiences: Option<Vec<ExperienceEntry>>,
    pub projects_page_content: Option<ProjectsPageContent>,
    pub certificates_page_content: Option<CertificatesPageContent>,
    pub contact_content: Option<ContactContent>,
}

impl From<StoredOnboardingData> for OnboardingData {
    fn from(stored: StoredOnboardingData) -> Self {
        Self {
            completed: stored.completed.unwrap_or(false),
            skipped: stored.skipped.unwrap_or(false),
            welcome_completed: stored.welcome_completed.unwrap_or(false),
            profile_photo_data_url: stored.profile_photo_data_url,
            site_title: stored
                .site_title
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| DEFAULT_SITE_TITLE.to_owned()),
            certificates: stored
                .certificates
                .unwrap_or_default()
                .into_iter()
                .map(normalize_certificate)
                .collect(),
            personal_details: stored.personal_details.unwrap_or_default(),
            projects: stored.projects.unwrap_or_default(),
            home_content: stored.home_content.unwrap_or_default(),
            about_content: stored.about_content.unwrap_or_default(),
            experiences: stored.experiences.unwrap_or_default(),
            projects_page_content: stored.projects_page_content.unwrap_or_default(),
            certificates_page_content: stored.certificates_page_content.unwrap_or_default(),
            contact_content: stored.contact_content.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredCertificate {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub issuer: String,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl From<StoredCertificate> for Certificate {
    fn from(stored: StoredCertificate) -> Self {
        normalize_certificate(stored)
    }
}

impl From<Certificate> for StoredCertificate {
    fn from(cert: Certificate) -> Self {
        // Older readers only know `imageDataUrl`, so the current file is
        // mirrored there unless a distinct legacy value must survive.
        let image_data_url = cert
            .legacy_image_data_url()
            .map(str::to_owned)
            .or_else(|| cert.file.as_ref().map(|file| file.data_url.clone()));
        let (file_data_url, mime_type) = match cert.file {
            Some(file) => (Some(file.data_url), Some(file.mime_type)),
            None => (None, None),
        };
        Self {
            id: cert.id,
            title: cert.title,
            issuer: cert.issuer,
            date: cert.date,
            image_data_url,
            file_data_url,
            mime_type,
        }
    }
}

/// How a stored certificate carries its file.
#[derive(Debug, PartialEq, Eq)]
enum FileRepresentation {
    /// `fileDataUrl` + `mimeType`; `legacy` holds a differing `imageDataUrl`.
    Current {
        file: CertificateFile,
        legacy: Option<String>,
    },
    /// Only `imageDataUrl` (or a bare `fileDataUrl`) is present.
    Legacy { data_url: String },
    Missing,
}

impl FileRepresentation {
    fn classify(stored: &mut StoredCertificate) -> Self {
        let file_data_url = take_non_empty(&mut stored.file_data_url);
        let mime_type = take_non_empty(&mut stored.mime_type);
        let image_data_url = take_non_empty(&mut stored.image_data_url);

        match (file_data_url, mime_type, image_data_url) {
            (Some(data_url), Some(mime_type), image) => {
                let legacy = image.filter(|image| *image != data_url);
                Self::Current {
                    file: CertificateFile::new(data_url, mime_type),
                    legacy,
                }
            }
            (_, _, Some(image)) => Self::Legacy { data_url: image },
            (Some(data_url), None, None) => Self::Legacy { data_url },
            (None, _, None) => Self::Missing,
        }
    }
}

/// Reads `null` as the field's default instead of failing the whole blob.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn take_non_empty(field: &mut Option<String>) -> Option<String> {
    field.take().filter(|value| !value.is_empty())
}

/// Resolves a stored certificate into its canonical file representation.
///
/// Records already in the current format keep their file and media type.
/// Legacy records get `fileDataUrl := imageDataUrl` with the media type read
/// from the data URL. Records with no file stay incomplete.
pub fn normalize_certificate(mut stored: StoredCertificate) -> Certificate {
    let (file, legacy) = match FileRepresentation::classify(&mut stored) {
        FileRepresentation::Current { file, legacy } => (Some(file), legacy),
        FileRepresentation::Legacy { data_url } => {
            (Some(CertificateFile::from_data_url(data_url)), None)
        }
        FileRepresentation::Missing => (None, None),
    };

    Certificate::from_parts(
        stored.id,
        stored.title,
        stored.issuer,
        stored.date,
        file,
        legacy,
    )
}

/// Reads the media type out of a `data:<type>;...` prefix, falling back to
/// `image/jpeg`.
pub fn infer_mime_type(data_url: &str) -> &str {
    data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(';'))
        .map(|(mime, _)| mime)
        .filter(|mime| !mime.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// Runs a certificate through the same resolution a load applies, so what is
/// kept in memory is exactly what a reload produces.
pub fn canonicalize_certificate(cert: Certificate) -> Certificate {
    normalize_certificate(StoredCertificate::from(cert))
}

/// Parses a persisted blob into a fully populated aggregate.
pub fn parse_onboarding_data(raw: &str) -> serde_json::Result<OnboardingData> {
    serde_json::from_str(raw)
}
