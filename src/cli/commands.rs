//! Command dispatch and handlers

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::tree_view::CategoryTreeConvert;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::OfferClassifier;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::JsonLinesSink;
use crate::infrastructure::InfraError;

/// Execute the parsed command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        Some(Commands::Config {
            command: ConfigCommands::Template,
        }) => {
            output::info(Settings::template());
            Ok(())
        }
        Some(command) => {
            let settings = Settings::load(cli.config.as_deref())?;
            debug!("settings: {:?}", settings);
            dispatch(command, settings)
        }
        None => Err(CliError::Usage(
            "no command given, see `feedcat --help`".to_string(),
        )),
    }
}

fn dispatch(command: &Commands, settings: Settings) -> CliResult<()> {
    match command {
        Commands::Tree { feed } => cmd_tree(&build_container(feed.as_deref(), settings)?),
        Commands::Paths { feed } => cmd_paths(&build_container(feed.as_deref(), settings)?),
        Commands::Classify { feed, categories } => {
            cmd_classify(&build_container(feed.as_deref(), settings)?, categories)
        }
        Commands::Ingest { feed, output } => {
            let output = output.clone().or_else(|| settings.output.clone());
            cmd_ingest(&build_container(feed.as_deref(), settings)?, output.as_deref())
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => cmd_config_show(&settings),
            ConfigCommands::Path => cmd_config_path(),
            ConfigCommands::Template => {
                output::info(Settings::template());
                Ok(())
            }
        },
        Commands::Completion { shell } => cmd_completion(*shell),
    }
}

/// Feed given on the command line, else `data_dir/target_filename`.
fn resolve_feed(feed: Option<&Path>, settings: &Settings) -> CliResult<PathBuf> {
    feed.map(Path::to_path_buf)
        .or_else(|| settings.feed_path())
        .ok_or_else(|| {
            CliError::Usage(
                "no feed given and no target_filename configured".to_string(),
            )
        })
}

fn build_container(feed: Option<&Path>, settings: Settings) -> CliResult<ServiceContainer> {
    let path = resolve_feed(feed, &settings)?;
    debug!("feed: {}", path.display());
    Ok(ServiceContainer::new(settings, path))
}

// ============================================================
// Category commands
// ============================================================

#[instrument(level = "debug", skip_all)]
fn cmd_tree(container: &ServiceContainer) -> CliResult<()> {
    let tree = container.catalog_service().load_tree()?;
    let rendered = tree.to_tree_strings();
    output::header(format!(
        "{} categories, {} roots",
        tree.len(),
        rendered.len()
    ));
    for root in rendered {
        output::info(root);
    }
    Ok(())
}

#[instrument(level = "debug", skip_all)]
fn cmd_paths(container: &ServiceContainer) -> CliResult<()> {
    let tree = container.catalog_service().load_tree()?;
    for category in tree.sorted_by_path() {
        output::info(format!("{}\t{}", category.id, category.path));
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_classify(container: &ServiceContainer, categories: &[String]) -> CliResult<()> {
    let tree = container.catalog_service().load_tree()?;
    let classifier = OfferClassifier::new(
        &tree,
        container.settings.classification.shallow_categories,
    );

    let mut first_error = None;
    for id in categories {
        match classifier.classify(id) {
            Ok(c) => output::info(
                [
                    id.as_str(),
                    c.level1.as_str(),
                    c.level2.as_str(),
                    c.level3.as_str(),
                    c.remainder.as_str(),
                ]
                .iter()
                .join("\t"),
            ),
            Err(e) => {
                output::warning(&e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(crate::application::ApplicationError::from(e).into()),
        None => Ok(()),
    }
}

// ============================================================
// Ingestion
// ============================================================

#[instrument(level = "debug", skip(container))]
fn cmd_ingest(container: &ServiceContainer, out: Option<&Path>) -> CliResult<()> {
    let writer: Box<dyn Write> = match out {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| InfraError::io_at("create output", path, e))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut sink = JsonLinesSink::new(writer);
    let report = container.ingest_service().run(&mut sink)?;

    output::status(&report);
    if let Some(path) = out {
        output::status(format!("records written to {}", path.display()));
    }
    Ok(())
}

// ============================================================
// Config commands
// ============================================================

fn cmd_config_show(settings: &Settings) -> CliResult<()> {
    output::info(settings.to_toml()?);
    Ok(())
}

fn cmd_config_path() -> CliResult<()> {
    let mark = |path: &Path| if path.exists() { "" } else { " (not found)" };

    match global_config_path() {
        Some(path) => output::action("global", format!("{}{}", path.display(), mark(&path))),
        None => output::action("global", "unavailable (no home directory)"),
    }

    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?;
    let local = local_config_path(&cwd);
    output::action("local", format!("{}{}", local.display(), mark(&local)));
    Ok(())
}

fn cmd_completion(shell: clap_complete::Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
