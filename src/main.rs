use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use git_release::builder::resolve_repo_meta;
use git_release::config::{load_config, Config};
use git_release::domain::ConventionalCommit;
use git_release::git::Git2Repository;
use git_release::orchestrator::Orchestrator;
use git_release::registry::NpmRegistry;
use git_release::resolver::resolve_packages;
use git_release::ui;

#[derive(Parser)]
#[command(
    name = "git-release",
    about = "Automate conventional-commit releases: changelogs, version tags, npm publishing"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Restrict package discovery to this subpath")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full release pipeline: changelog, commit, tag, publish, push
    Release {
        #[arg(long, help = "Pass the release to the registry as a dry run")]
        dry_run: bool,
    },
    /// Write changelogs only, without committing, tagging or publishing
    Changelog,
    /// Validate a commit message file against the conventional grammar
    Lint {
        #[arg(help = "Path to the commit message file")]
        file: PathBuf,
    },
}

enum Mode {
    Release { dry_run: bool },
    Changelog,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };

    match args.command {
        Command::Lint { file } => lint(&file),
        Command::Release { dry_run } => {
            run(&config, args.dir.as_deref(), Mode::Release { dry_run })
        }
        Command::Changelog => run(&config, args.dir.as_deref(), Mode::Changelog),
    }
}

fn lint(file: &Path) -> Result<()> {
    let message = std::fs::read_to_string(file)?;
    if let Err(e) = ConventionalCommit::validate(&message) {
        ui::display_error(&e.to_string());
        std::process::exit(1);
    }
    ui::display_success("commit message is valid");
    Ok(())
}

fn run(config: &Config, dir: Option<&Path>, mode: Mode) -> Result<()> {
    let repo = match Git2Repository::open(".") {
        Ok(repo) => repo,
        Err(e) => {
            ui::display_error(&format!("Git repository error: {}", e));
            std::process::exit(1);
        }
    };

    let dry_run = matches!(mode, Mode::Release { dry_run: true }) || config.registry.dry_run;
    let registry = NpmRegistry::new(config.registry.url.clone(), dry_run);
    let orchestrator = Orchestrator::new(
        &repo,
        &registry,
        config.changelog.strategy.strategy(),
        config.behavior.remote.clone(),
    );

    if matches!(mode, Mode::Release { .. }) {
        if let Err(e) = orchestrator.preflight() {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    }

    let packages = match resolve_packages(&repo, dir) {
        Ok(packages) => packages,
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    };

    let repo_meta = match resolve_repo_meta(&repo, &config.behavior.remote) {
        Ok(meta) => meta,
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    };

    let summary = match mode {
        Mode::Release { .. } => {
            ui::display_status(&format!("Releasing {} package(s)", packages.len()));
            orchestrator.run_release(&packages, &repo_meta)
        }
        Mode::Changelog => {
            ui::display_status(&format!(
                "Writing changelogs for {} package(s)",
                packages.len()
            ));
            orchestrator.run_changelog(&packages, &repo_meta)
        }
    };

    ui::display_run_summary(&summary);
    if !summary.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
