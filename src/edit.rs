//! Command handlers: the edit surfaces of the command-line front-end.
//!
//! Every handler that changes content checks the main-user gate first and
//! then goes through a single [`ContentStore`] mutation.

use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::cli::{
    CertificateAddArgs, CertificateCommand, CertificateUpdateArgs, DetailsArgs,
    ExperienceAddArgs, ExperienceCommand, MainUserCommand, OnboardArgs, PageCommand,
    PageTitleArgs, ProjectAddArgs, ProjectCommand,
};
use crate::content::{
    Certificate, CertificateFile, CertificatesPageContent, ExperienceEntry, Project,
    ProjectsPageContent, complete_certificates,
};
use crate::identity::{EnvIdentityProvider, Identity, IdentityProvider, MainUserGate};
use crate::ingest::read_validated_file;
use crate::storage::LocalFsStorage;
use crate::store::{ContentStore, OnboardingStage};

pub struct Session {
    store: ContentStore<Arc<LocalFsStorage>>,
    gate: MainUserGate<Arc<LocalFsStorage>>,
    identity: Arc<dyn IdentityProvider>,
}

impl Session {
    pub fn open(data_dir: &Path, principal: Option<String>) -> Self {
        let storage = Arc::new(LocalFsStorage::new(data_dir));
        Self {
            store: ContentStore::load(Arc::clone(&storage)),
            gate: MainUserGate::load(storage),
            identity: Arc::new(EnvIdentityProvider::new(principal)),
        }
    }

    pub fn store(&self) -> &ContentStore<Arc<LocalFsStorage>> {
        &self.store
    }

    fn is_main_user(&self) -> bool {
        self.gate.is_main_user(&self.identity.current_identity())
    }

    fn require_main_user(&self) -> anyhow::Result<()> {
        if self.is_main_user() {
            return Ok(());
        }
        let identity = self.identity.current_identity();
        anyhow::bail!(
            "only the main user may edit content (current identity: {})",
            identity.principal()
        );
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Keeps `current` unless a replacement was given.
fn merge(current: &mut Option<String>, replacement: Option<String>) {
    if replacement.is_some() {
        *current = replacement;
    }
}

fn merge_page_title(title: &mut Option<String>, subtitle: &mut Option<String>, args: PageTitleArgs) {
    merge(title, args.page_title);
    merge(subtitle, args.page_subtitle);
}

pub fn show(session: &Session) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, session.store().data()).context("write content")?;
    writeln!(out).context("write newline")?;
    Ok(())
}

pub fn stage(session: &Session) -> anyhow::Result<()> {
    let stage = session.store().onboarding_stage(session.is_main_user());
    let label = match stage {
        OnboardingStage::Welcome => "welcome",
        OnboardingStage::Onboarding => "onboarding",
        OnboardingStage::Site => "site",
    };
    println!("{label}");
    Ok(())
}

pub async fn onboard(session: &mut Session, args: OnboardArgs) -> anyhow::Result<()> {
    session.require_main_user()?;
    let photo = match args.photo {
        Some(path) => Some(read_validated_file(&path).await.context("profile photo")?),
        None => session.store.profile_photo().map(str::to_owned),
    };
    let certificates: Vec<Certificate> = complete_certificates(session.store.certificates())
        .into_iter()
        .cloned()
        .collect();
    session.store.save_uploads(photo, certificates)?;
    println!("onboarding complete");
    Ok(())
}

pub fn skip(session: &mut Session) -> anyhow::Result<()> {
    session.require_main_user()?;
    session.store.skip_onboarding()?;
    Ok(())
}

pub fn reopen(session: &mut Session) -> anyhow::Result<()> {
    session.require_main_user()?;
    session.store.reopen_onboarding()?;
    Ok(())
}

pub fn welcome(session: &mut Session) -> anyhow::Result<()> {
    session.require_main_user()?;
    session.store.complete_welcome()?;
    Ok(())
}

pub fn set_title(session: &mut Session, title: &str) -> anyhow::Result<()> {
    session.require_main_user()?;
    let data = session.store.update_site_title(title)?;
    println!("{}", data.site_title);
    Ok(())
}

pub fn details(session: &mut Session, args: DetailsArgs) -> anyhow::Result<()> {
    session.require_main_user()?;
    let mut details = session.store.personal_details().clone();
    merge(&mut details.name, args.name.map(|name| name.trim().to_owned()));
    merge(&mut details.headline, args.headline);
    merge(&mut details.bio, args.bio);
    merge(&mut details.email, args.email);
    merge(&mut details.phone, args.phone);
    merge(&mut details.location, args.location);
    session.store.update_personal_details(details)?;
    Ok(())
}

pub fn page(session: &mut Session, command: PageCommand) -> anyhow::Result<()> {
    session.require_main_user()?;
    let store = &mut session.store;
    match command {
        PageCommand::Home(args) => {
            let mut content = store.home_content().clone();
            merge(&mut content.headline, args.headline);
            merge(&mut content.tagline, args.tagline);
            merge(&mut content.description, args.description);
            store.update_home_content(content)?;
        }
        PageCommand::About(args) => {
            let mut content = store.about_content().clone();
            merge_page_title(&mut content.page_title, &mut content.page_subtitle, args.page);
            merge(&mut content.bio, args.bio);
            merge(&mut content.additional_info, args.additional_info);
            store.update_about_content(content)?;
        }
        PageCommand::Projects(args) => {
            let ProjectsPageContent {
                mut page_title,
                mut page_subtitle,
            } = store.projects_page_content().clone();
            merge_page_title(&mut page_title, &mut page_subtitle, args);
            store.update_projects_page_content(ProjectsPageContent {
                page_title,
                page_subtitle,
            })?;
        }
        PageCommand::Certificates(args) => {
            let CertificatesPageContent {
                mut page_title,
                mut page_subtitle,
            } = store.certificates_page_content().clone();
            merge_page_title(&mut page_title, &mut page_subtitle, args);
            store.update_certificates_page_content(CertificatesPageContent {
                page_title,
                page_subtitle,
            })?;
        }
        PageCommand::Contact(args) => {
            let mut content = store.contact_content().clone();
            merge_page_title(&mut content.page_title, &mut content.page_subtitle, args.page);
            merge(&mut content.cta_title, args.cta_title);
            merge(&mut content.cta_description, args.cta_description);
            store.update_contact_content(content)?;
        }
    }
    Ok(())
}

pub fn project(session: &mut Session, command: ProjectCommand) -> anyhow::Result<()> {
    match command {
        ProjectCommand::List => {
            for project in session.store.projects() {
                println!("{}\t{}", project.id, project.name);
            }
            Ok(())
        }
        ProjectCommand::Add(args) => add_project(session, args),
        ProjectCommand::Remove(args) => {
            session.require_main_user()?;
            let mut projects = session.store.projects().to_vec();
            projects.retain(|project| project.id != args.id);
            session.store.update_projects(projects)?;
            Ok(())
        }
    }
}

fn add_project(session: &mut Session, args: ProjectAddArgs) -> anyhow::Result<()> {
    session.require_main_user()?;
    let tags: Vec<String> = args
        .tags
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect();
    let project = Project {
        description: args.description,
        tags: (!tags.is_empty()).then_some(tags),
        link: args.link,
        github: args.github,
        ..Project::new(new_id(), args.name)
    };
    if !project.is_valid() {
        anyhow::bail!("project name must not be blank");
    }

    let id = project.id.clone();
    let mut projects = session.store.projects().to_vec();
    projects.push(project);
    session.store.update_projects(projects)?;
    println!("{id}");
    Ok(())
}

pub fn experience(session: &mut Session, command: ExperienceCommand) -> anyhow::Result<()> {
    session.require_main_user()?;
    match command {
        ExperienceCommand::Add(args) => add_experience(session, args),
        ExperienceCommand::Remove(args) => {
            let mut experiences = session.store.experiences().to_vec();
            experiences.retain(|entry| entry.id != args.id);
            session.store.update_experiences(experiences)?;
            Ok(())
        }
    }
}

fn add_experience(session: &mut Session, args: ExperienceAddArgs) -> anyhow::Result<()> {
    let entry = ExperienceEntry {
        id: new_id(),
        title: args.title,
        company: args.company,
        period: args.period,
        description: args.description,
        achievements: args.achievements,
    };
    let id = entry.id.clone();
    let mut experiences = session.store.experiences().to_vec();
    experiences.push(entry);
    session.store.update_experiences(experiences)?;
    println!("{id}");
    Ok(())
}

pub async fn certificate(session: &mut Session, command: CertificateCommand) -> anyhow::Result<()> {
    match command {
        CertificateCommand::List => {
            for cert in session.store.certificates() {
                let status = if cert.is_complete() {
                    "complete"
                } else if cert.is_displayable() {
                    "displayable"
                } else {
                    "incomplete"
                };
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    cert.id,
                    cert.title,
                    cert.issuer,
                    cert.mime_type(),
                    status
                );
            }
            Ok(())
        }
        CertificateCommand::Add(args) => add_certificate(session, args).await,
        CertificateCommand::Update(args) => update_certificate(session, args).await,
        CertificateCommand::Remove(args) => {
            session.require_main_user()?;
            session.store.remove_certificate(&args.id)?;
            Ok(())
        }
    }
}

async fn add_certificate(session: &mut Session, args: CertificateAddArgs) -> anyhow::Result<()> {
    session.require_main_user()?;
    let data_url = read_validated_file(&args.file)
        .await
        .context("certificate file")?;
    let cert = Certificate::new(new_id(), args.title, args.issuer, args.date)
        .with_file(CertificateFile::from_data_url(data_url));
    if !cert.is_complete() {
        anyhow::bail!("certificate needs a title, issuer, date and file");
    }

    let id = cert.id.clone();
    session.store.add_certificate(cert)?;
    println!("{id}");
    Ok(())
}

async fn update_certificate(
    session: &mut Session,
    args: CertificateUpdateArgs,
) -> anyhow::Result<()> {
    session.require_main_user()?;
    let mut cert = session
        .store
        .certificates()
        .iter()
        .find(|cert| cert.id == args.id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no certificate with id {}", args.id))?;

    if let Some(title) = args.title {
        cert.title = title;
    }
    if let Some(issuer) = args.issuer {
        cert.issuer = issuer;
    }
    if let Some(date) = args.date {
        cert.date = date;
    }
    if let Some(path) = args.file {
        let data_url = read_validated_file(&path)
            .await
            .context("certificate file")?;
        cert.file = Some(CertificateFile::from_data_url(data_url));
    }
    if !cert.is_complete() {
        anyhow::bail!("certificate needs a title, issuer, date and file");
    }

    session.store.update_certificate(cert)?;
    Ok(())
}

pub async fn main_user(session: &mut Session, command: MainUserCommand) -> anyhow::Result<()> {
    match command {
        MainUserCommand::Status => {
            println!(
                "main user: {}",
                session.gate.main_user().unwrap_or("(none)")
            );
            println!("current identity: {}", session.identity.current_identity().principal());
            println!("is main user: {}", session.is_main_user());
        }
        MainUserCommand::Set => {
            if session.gate.main_user().is_some() && !session.is_main_user() {
                anyhow::bail!("a different main user is already designated");
            }
            let identity = match session.identity.login().await {
                Ok(identity) => identity,
                Err(err) => {
                    tracing::debug!(error = %format!("{err:#}"), "login failed");
                    Identity::Anonymous
                }
            };
            if session.gate.set_main_user(&identity)? {
                println!("main user: {}", identity.principal());
            } else {
                println!("not authenticated; main user unchanged");
            }
        }
        MainUserCommand::Clear => {
            session.require_main_user()?;
            session.gate.clear()?;
            session.identity.logout().await?;
            println!("main user cleared");
        }
    }
    Ok(())
}

pub fn reset(session: &mut Session) -> anyhow::Result<()> {
    session.require_main_user()?;
    session.store.clear();
    Ok(())
}
