use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use folio::cli::{Cli, Command};
use folio::edit::{self, Session};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    folio::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let mut session = Session::open(&cli.data_dir, cli.principal);

    match cli.command {
        Command::Show => edit::show(&session).context("show")?,
        Command::Stage => edit::stage(&session).context("stage")?,
        Command::Onboard(args) => edit::onboard(&mut session, args).await.context("onboard")?,
        Command::Skip => edit::skip(&mut session).context("skip")?,
        Command::Reopen => edit::reopen(&mut session).context("reopen")?,
        Command::Welcome => edit::welcome(&mut session).context("welcome")?,
        Command::SetTitle(args) => edit::set_title(&mut session, &args.title).context("set title")?,
        Command::Details(args) => edit::details(&mut session, args).context("details")?,
        Command::Page { command } => edit::page(&mut session, command).context("page")?,
        Command::Project { command } => edit::project(&mut session, command).context("project")?,
        Command::Experience { command } => {
            edit::experience(&mut session, command).context("experience")?;
        }
        Command::Certificate { command } => {
            edit::certificate(&mut session, command)
                .await
                .context("certificate")?;
        }
        Command::MainUser { command } => {
            edit::main_user(&mut session, command)
                .await
                .context("main user")?;
        }
        Command::Reset => edit::reset(&mut session).context("reset")?,
    }

    Ok(())
}
