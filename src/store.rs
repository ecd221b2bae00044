use anyhow::Context as _;

use crate::content::{
    AboutContent, Certificate, CertificatesPageContent, ContactContent, DEFAULT_SITE_TITLE,
    ExperienceEntry, HomeContent, OnboardingData, PersonalDetails, Project, ProjectsPageContent,
};
use crate::normalize::{canonicalize_certificate, parse_onboarding_data};
use crate::storage::Storage;

pub const STORAGE_KEY: &str = "portfolio_onboarding_data";

/// Reads and normalizes the persisted aggregate. Never fails: a missing,
/// unreadable or corrupt blob yields the default aggregate.
pub fn load_onboarding_data(storage: &impl Storage) -> OnboardingData {
    let raw = match storage.get(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!("no stored content; using defaults");
            return OnboardingData::default();
        }
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "failed to read stored content");
            return OnboardingData::default();
        }
    };

    match parse_onboarding_data(&raw) {
        Ok(data) => {
            tracing::debug!(
                certificates = data.certificates.len(),
                projects = data.projects.len(),
                experiences = data.experiences.len(),
                "loaded stored content"
            );
            data
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to parse stored content; using defaults");
            OnboardingData::default()
        }
    }
}

pub fn save_onboarding_data(storage: &impl Storage, data: &OnboardingData) -> anyhow::Result<()> {
    let raw = serde_json::to_string(data).context("serialize onboarding data")?;
    storage
        .set(STORAGE_KEY, &raw)
        .context("save onboarding data")?;
    tracing::debug!(bytes = raw.len(), "saved content");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStage {
    Welcome,
    Onboarding,
    Site,
}

/// Owns the aggregate and is its only writer.
///
/// Mutations build the next aggregate from a copy of the current one,
/// persist it, and only then make it visible. When the save fails the store
/// keeps the previous aggregate and returns the error.
#[derive(Debug)]
pub struct ContentStore<S> {
    storage: S,
    data: OnboardingData,
}

impl<S: Storage> ContentStore<S> {
    pub fn load(storage: S) -> Self {
        let data = load_onboarding_data(&storage);
        Self { storage, data }
    }

    pub fn data(&self) -> &OnboardingData {
        &self.data
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn profile_photo(&self) -> Option<&str> {
        self.data.profile_photo_data_url.as_deref()
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.data.certificates
    }

    pub fn personal_details(&self) -> &PersonalDetails {
        &self.data.personal_details
    }

    pub fn projects(&self) -> &[Project] {
        &self.data.projects
    }

    pub fn home_content(&self) -> &HomeContent {
        &self.data.home_content
    }

    pub fn about_content(&self) -> &AboutContent {
        &self.data.about_content
    }

    pub fn experiences(&self) -> &[ExperienceEntry] {
        &self.data.experiences
    }

    pub fn projects_page_content(&self) -> &ProjectsPageContent {
        &self.data.projects_page_content
    }

    pub fn certificates_page_content(&self) -> &CertificatesPageContent {
        &self.data.certificates_page_content
    }

    pub fn contact_content(&self) -> &ContactContent {
        &self.data.contact_content
    }

    pub fn site_title(&self) -> &str {
        if self.data.site_title.is_empty() {
            DEFAULT_SITE_TITLE
        } else {
            &self.data.site_title
        }
    }

    pub fn is_onboarding_complete(&self) -> bool {
        self.data.completed
    }

    pub fn is_onboarding_skipped(&self) -> bool {
        self.data.skipped
    }

    pub fn is_welcome_complete(&self) -> bool {
        self.data.welcome_completed
    }

    /// Which flow a visitor lands on. Only the main user is ever routed into
    /// the welcome or onboarding flows.
    pub fn onboarding_stage(&self, is_main_user: bool) -> OnboardingStage {
        if !is_main_user {
            return OnboardingStage::Site;
        }
        if !self.data.welcome_completed {
            return OnboardingStage::Welcome;
        }
        if !self.data.completed && !self.data.skipped {
            return OnboardingStage::Onboarding;
        }
        OnboardingStage::Site
    }

    fn apply(
        &mut self,
        section: &'static str,
        update: impl FnOnce(&mut OnboardingData),
    ) -> anyhow::Result<&OnboardingData> {
        let mut next = self.data.clone();
        update(&mut next);
        save_onboarding_data(&self.storage, &next)
            .with_context(|| format!("update {section}"))?;
        self.data = next;
        tracing::debug!(section, "content updated");
        Ok(&self.data)
    }

    /// Finishes onboarding with the chosen photo and certificates.
    pub fn save_uploads(
        &mut self,
        profile_photo: Option<String>,
        certificates: Vec<Certificate>,
    ) -> anyhow::Result<&OnboardingData> {
        let certificates = certificates
            .into_iter()
            .map(canonicalize_certificate)
            .collect();
        self.apply("uploads", |data| {
            data.completed = true;
            data.skipped = false;
            data.profile_photo_data_url = profile_photo;
            data.certificates = certificates;
        })
    }

    pub fn skip_onboarding(&mut self) -> anyhow::Result<&OnboardingData> {
        self.apply("onboarding", |data| {
            data.completed = false;
            data.skipped = true;
        })
    }

    pub fn reopen_onboarding(&mut self) -> anyhow::Result<&OnboardingData> {
        self.apply("onboarding", |data| {
            data.completed = false;
            data.skipped = false;
        })
    }

    pub fn complete_welcome(&mut self) -> anyhow::Result<&OnboardingData> {
        self.apply("welcome", |data| data.welcome_completed = true)
    }

    pub fn update_personal_details(
        &mut self,
        details: PersonalDetails,
    ) -> anyhow::Result<&OnboardingData> {
        self.apply("personal details", |data| data.personal_details = details)
    }

    pub fn update_projects(&mut self, projects: Vec<Project>) -> anyhow::Result<&OnboardingData> {
        self.apply("projects", |data| data.projects = projects)
    }

    pub fn update_home_content(
        &mut self,
        content: HomeContent,
    ) -> anyhow::Result<&OnboardingData> {
        self.apply("home content", |data| data.home_content = content)
    }

    pub fn update_about_content(
        &mut self,
        content: AboutContent,
    ) -> anyhow::Result<&OnboardingData> {
        self.apply("about content", |data| data.about_content = content)
    }

    pub fn update_experiences(
        &mut self,
        experiences: Vec<ExperienceEntry>,
    ) -> anyhow::Result<&OnboardingData> {
        self.apply("experiences", |data| data.experiences = experiences)
    }

    pub fn update_projects_page_content(
        &mut self,
        content: ProjectsPageContent,
    ) -> anyhow::Result<&OnboardingData> {
        self.apply("projects page content", |data| {
            data.projects_page_content = content
        })
    }

    pub fn update_certificates_page_content(
        &mut self,
        content: CertificatesPageContent,
    ) -> anyhow::Result<&OnboardingData> {
        self.apply("certificates page content", |data| {
            data.certificates_page_content = content
        })
    }

    pub fn update_contact_content(
        &mut self,
        content: ContactContent,
    ) -> anyhow::Result<&OnboardingData> {
        self.apply("contact content", |data| data.contact_content = content)
    }

    /// Stored as given; an empty title is stored as the fallback so a reload
    /// reads it back unchanged.
    pub fn update_site_title(&mut self, title: &str) -> anyhow::Result<&OnboardingData> {
        let title = if title.is_empty() {
            DEFAULT_SITE_TITLE
        } else {
            title
        };
        self.apply("site title", |data| data.site_title = title.to_owned())
    }

    /// Appends to the end of the list. The caller supplies the id.
    pub fn add_certificate(&mut self, certificate: Certificate) -> anyhow::Result<&OnboardingData> {
        let certificate = canonicalize_certificate(certificate);
        self.apply("certificates", |data| data.certificates.push(certificate))
    }

    /// Replaces the certificate with the same id. An unknown id is a no-op.
    pub fn update_certificate(
        &mut self,
        certificate: Certificate,
    ) -> anyhow::Result<&OnboardingData> {
        let certificate = canonicalize_certificate(certificate);
        let Some(index) = self
            .data
            .certificates
            .iter()
            .position(|cert| cert.id == certificate.id)
        else {
            tracing::debug!(id = %certificate.id, "no certificate to update");
            return Ok(&self.data);
        };
        self.apply("certificates", |data| data.certificates[index] = certificate)
    }

    /// Removing an unknown id is a no-op.
    pub fn remove_certificate(&mut self, id: &str) -> anyhow::Result<&OnboardingData> {
        if !self.data.certificates.iter().any(|cert| cert.id == id) {
            tracing::debug!(id, "no certificate to remove");
            return Ok(&self.data);
        }
        self.apply("certificates", |data| {
            data.certificates.retain(|cert| cert.id != id)
        })
    }

    /// Drops all stored content and returns to defaults.
    pub fn clear(&mut self) {
        if let Err(err) = self.storage.remove(STORAGE_KEY) {
            tracing::warn!(error = %format!("{err:#}"), "failed to clear stored content");
        }
        self.data = OnboardingData::default();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::content::CertificateFile;
    use crate::storage::{MemoryStorage, StorageError};

    fn cert(id: &str) -> Certificate {
        Certificate::new(id, format!("Cert {id}"), "Issuer", "March 2023")
            .with_file(CertificateFile::from_data_url("data:image/png;base64,AAAA"))
    }

    fn store() -> ContentStore<MemoryStorage> {
        ContentStore::load(MemoryStorage::new())
    }

    #[test]
    fn empty_storage_loads_defaults() {
        let store = store();
        assert_eq!(store.site_title(), "Ash-Resume");
        assert!(store.certificates().is_empty());
        assert!(!store.is_onboarding_complete());
        assert!(!store.is_onboarding_skipped());
        assert!(!store.is_welcome_complete());
        assert_eq!(store.data(), &OnboardingData::default());
    }

    #[test]
    fn corrupt_blob_loads_defaults() {
        let storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, "{not json").unwrap();
        let store = ContentStore::load(storage);
        assert_eq!(store.data(), &OnboardingData::default());
    }

    #[test]
    fn blob_without_experiences_loads_empty_list() {
        let storage = MemoryStorage::new();
        storage
            .set(STORAGE_KEY, r#"{"completed":true,"skipped":false,"certificates":[]}"#)
            .unwrap();
        let store = ContentStore::load(storage);
        assert!(store.is_onboarding_complete());
        assert!(store.experiences().is_empty());
    }

    #[test]
    fn mutations_round_trip_through_storage() -> anyhow::Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = ContentStore::load(Arc::clone(&storage));

        store.complete_welcome()?;
        store.save_uploads(
            Some("data:image/jpeg;base64,/9j/".to_owned()),
            vec![cert("1"), cert("2")],
        )?;
        store.update_personal_details(PersonalDetails {
            name: Some("Ash".to_owned()),
            email: Some("ash@example.com".to_owned()),
            ..PersonalDetails::default()
        })?;
        store.update_projects(vec![Project {
            tags: Some(vec!["rust".to_owned(), "rust".to_owned()]),
            ..Project::new("p1", "folio")
        }])?;
        store.update_experiences(vec![ExperienceEntry {
            id: "e1".to_owned(),
            title: "Engineer".to_owned(),
            achievements: vec!["Shipped".to_owned()],
            ..ExperienceEntry::default()
        }])?;
        store.update_home_content(HomeContent {
            headline: Some(String::new()),
            ..HomeContent::default()
        })?;
        store.update_contact_content(ContactContent {
            cta_title: Some("Say hi".to_owned()),
            ..ContactContent::default()
        })?;
        store.update_site_title("  My Portfolio ")?;
        store.add_certificate(
            Certificate::new("3", "PDF", "Issuer", "2022")
                .with_file(CertificateFile::new("data:application/pdf;base64,JVBE", "application/pdf")),
        )?;
        store.update_site_title("")?;

        let reloaded = load_onboarding_data(&storage);
        assert_eq!(&reloaded, store.data());
        assert_eq!(reloaded.site_title, "Ash-Resume");
        assert!(reloaded.certificates[2].is_pdf());
        Ok(())
    }

    #[test]
    fn certificates_with_blank_file_fields_reload_unchanged() -> anyhow::Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = ContentStore::load(Arc::clone(&storage));

        store.add_certificate(
            Certificate::new("no-mime", "Rust", "Ferris U", "2024")
                .with_file(CertificateFile::new("data:image/png;base64,AAAA", "")),
        )?;
        store.add_certificate(
            Certificate::new("no-url", "Rust", "Ferris U", "2024")
                .with_file(CertificateFile::from_data_url("")),
        )?;
        let certificates = store.certificates().to_vec();
        store.save_uploads(None, certificates)?;
        let mut edited = store.certificates()[1].clone();
        edited.file = Some(CertificateFile::new("", "application/pdf"));
        store.update_certificate(edited)?;

        assert_eq!(store.certificates()[0].mime_type(), "image/png");
        assert_eq!(store.certificates()[1].file, None);
        assert_eq!(&load_onboarding_data(&storage), store.data());
        Ok(())
    }

    #[test]
    fn site_title_is_stored_as_given() -> anyhow::Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = ContentStore::load(Arc::clone(&storage));

        store.update_site_title("  My Portfolio ")?;
        assert_eq!(store.site_title(), "  My Portfolio ");
        assert_eq!(load_onboarding_data(&storage).site_title, "  My Portfolio ");

        store.update_site_title("")?;
        assert_eq!(store.site_title(), "Ash-Resume");
        Ok(())
    }

    #[test]
    fn update_with_unknown_id_leaves_certificates_unchanged() -> anyhow::Result<()> {
        let mut store = store();
        store.add_certificate(cert("1"))?;
        let before = store.certificates().to_vec();

        store.update_certificate(cert("missing"))?;
        assert_eq!(store.certificates(), before.as_slice());
        Ok(())
    }

    #[test]
    fn update_replaces_matching_certificate_in_place() -> anyhow::Result<()> {
        let mut store = store();
        store.add_certificate(cert("1"))?;
        store.add_certificate(cert("2"))?;

        let mut edited = cert("1");
        edited.title = "Renamed".to_owned();
        store.update_certificate(edited)?;

        let titles: Vec<_> = store.certificates().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Renamed", "Cert 2"]);
        Ok(())
    }

    #[test]
    fn remove_drops_exactly_one_certificate() -> anyhow::Result<()> {
        let mut store = store();
        for id in ["1", "2", "3"] {
            store.add_certificate(cert(id))?;
        }

        store.remove_certificate("2")?;
        assert_eq!(store.certificates().len(), 2);
        assert!(store.certificates().iter().all(|c| c.id != "2"));

        store.remove_certificate("2")?;
        assert_eq!(store.certificates().len(), 2);
        Ok(())
    }

    #[test]
    fn mutation_touches_only_its_section() -> anyhow::Result<()> {
        let mut store = store();
        store.add_certificate(cert("1"))?;
        let before = store.data().clone();

        store.update_about_content(AboutContent {
            bio: Some("Hello".to_owned()),
            ..AboutContent::default()
        })?;

        let after = store.data();
        assert_eq!(after.about_content.bio.as_deref(), Some("Hello"));
        assert_eq!(
            OnboardingData {
                about_content: before.about_content.clone(),
                ..after.clone()
            },
            before
        );
        Ok(())
    }

    #[test]
    fn failed_save_keeps_previous_aggregate() -> anyhow::Result<()> {
        let mut store = ContentStore::load(MemoryStorage::with_quota(1024));
        store.update_site_title("Small")?;

        let big = "data:image/png;base64,".to_owned() + &"A".repeat(4096);
        let err = store
            .add_certificate(
                Certificate::new("big", "Big", "Issuer", "2024")
                    .with_file(CertificateFile::from_data_url(big)),
            )
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::QuotaExceeded { .. })
        ));
        assert!(store.certificates().is_empty());
        assert_eq!(store.site_title(), "Small");
        Ok(())
    }

    #[test]
    fn skip_and_reopen_toggle_flags() -> anyhow::Result<()> {
        let mut store = store();
        store.save_uploads(None, Vec::new())?;
        assert!(store.is_onboarding_complete());

        store.skip_onboarding()?;
        assert!(!store.is_onboarding_complete());
        assert!(store.is_onboarding_skipped());

        store.reopen_onboarding()?;
        assert!(!store.is_onboarding_complete());
        assert!(!store.is_onboarding_skipped());
        Ok(())
    }

    #[test]
    fn onboarding_stage_follows_flags() -> anyhow::Result<()> {
        let mut store = store();
        assert_eq!(store.onboarding_stage(false), OnboardingStage::Site);
        assert_eq!(store.onboarding_stage(true), OnboardingStage::Welcome);

        store.complete_welcome()?;
        assert_eq!(store.onboarding_stage(true), OnboardingStage::Onboarding);

        store.skip_onboarding()?;
        assert_eq!(store.onboarding_stage(true), OnboardingStage::Site);
        Ok(())
    }

    #[test]
    fn clear_resets_storage_and_memory() -> anyhow::Result<()> {
        let mut store = store();
        store.update_site_title("Mine")?;
        store.clear();
        assert_eq!(store.data(), &OnboardingData::default());
        assert_eq!(store.storage().get(STORAGE_KEY)?, None);
        Ok(())
    }
}
