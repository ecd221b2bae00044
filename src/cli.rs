use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding the stored content (one file per storage key).
    #[arg(long, global = true, default_value = "portfolio-data")]
    pub data_dir: PathBuf,

    /// Authenticated principal. Falls back to `FOLIO_PRINCIPAL`.
    #[arg(long, global = true)]
    pub principal: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the stored content as JSON.
    Show,
    /// Print which flow the current identity lands on.
    Stage,
    /// Finish onboarding, keeping complete certificates.
    Onboard(OnboardArgs),
    Skip,
    Reopen,
    /// Mark the welcome flow as done.
    Welcome,
    SetTitle(SetTitleArgs),
    Details(DetailsArgs),
    Page {
        #[command(subcommand)]
        command: PageCommand,
    },
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    Experience {
        #[command(subcommand)]
        command: ExperienceCommand,
    },
    Certificate {
        #[command(subcommand)]
        command: CertificateCommand,
    },
    MainUser {
        #[command(subcommand)]
        command: MainUserCommand,
    },
    /// Delete all stored content.
    Reset,
}

#[derive(Debug, Args)]
pub struct OnboardArgs {
    /// Profile photo file (kept as is when omitted).
    #[arg(long)]
    pub photo: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SetTitleArgs {
    /// New site title; blank restores the default.
    pub title: String,
}

#[derive(Debug, Args)]
pub struct DetailsArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub headline: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum PageCommand {
    Home(HomeArgs),
    About(AboutArgs),
    Projects(PageTitleArgs),
    Certificates(PageTitleArgs),
    Contact(ContactArgs),
}

#[derive(Debug, Args)]
pub struct HomeArgs {
    #[arg(long)]
    pub headline: Option<String>,
    #[arg(long)]
    pub tagline: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Debug, Args)]
pub struct AboutArgs {
    #[command(flatten)]
    pub page: PageTitleArgs,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub additional_info: Option<String>,
}

#[derive(Debug, Args)]
pub struct PageTitleArgs {
    #[arg(long)]
    pub page_title: Option<String>,
    #[arg(long)]
    pub page_subtitle: Option<String>,
}

#[derive(Debug, Args)]
pub struct ContactArgs {
    #[command(flatten)]
    pub page: PageTitleArgs,
    #[arg(long)]
    pub cta_title: Option<String>,
    #[arg(long)]
    pub cta_description: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    Add(ProjectAddArgs),
    Remove(IdArgs),
    List,
}

#[derive(Debug, Args)]
pub struct ProjectAddArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Comma-separated tags.
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,
    #[arg(long)]
    pub link: Option<String>,
    #[arg(long)]
    pub github: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ExperienceCommand {
    Add(ExperienceAddArgs),
    Remove(IdArgs),
}

#[derive(Debug, Args)]
pub struct ExperienceAddArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub company: String,
    /// Free text, e.g. "2021 - Present".
    #[arg(long, default_value = "")]
    pub period: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Repeat for several achievements.
    #[arg(long = "achievement")]
    pub achievements: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum CertificateCommand {
    Add(CertificateAddArgs),
    Update(CertificateUpdateArgs),
    Remove(IdArgs),
    List,
}

#[derive(Debug, Args)]
pub struct CertificateAddArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub issuer: String,
    #[arg(long)]
    pub date: String,
    /// Image or PDF file.
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct CertificateUpdateArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub issuer: Option<String>,
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(long)]
    pub id: String,
}

#[derive(Debug, Subcommand)]
pub enum MainUserCommand {
    /// Designate the current principal as the main user.
    Set,
    Clear,
    Status,
}
