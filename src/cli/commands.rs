//! Command dispatch: builds trees from arguments and runs walks/comparisons.

use std::io;
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, instrument};

use crate::application::{walk_spawned, Comparator, Verdict};
use crate::cli::args::{Cli, Commands, ConfigCommands, TreeSource};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::Tree;
use crate::exitcode;

/// Run the parsed command; returns the process exit code.
pub fn execute_command(cli: &Cli) -> CliResult<i32> {
    match &cli.command {
        Commands::Walk { tree, inline } => cmd_walk(cli, tree, *inline),
        Commands::Same {
            left,
            left_tour,
            right,
            right_tour,
            seed,
        } => {
            let mut rng = rng_from(*seed);
            let left = build_tree(left, *left_tour, &mut rng);
            let right = build_tree(right, *right_tour, &mut rng);
            cmd_same(cli, &left, &right)
        }
        Commands::Show { tree } => cmd_show(tree),
        Commands::Config { command } => cmd_config(cli, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(exitcode::OK)
        }
    }
}

/// Load layered settings and apply command line overrides last.
pub fn resolve_settings(cli: &Cli) -> CliResult<Settings> {
    let settings = Settings::load(cli.config.as_deref())?;
    Ok(settings.merge_with(&cli.settings_overlay()))
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Tour tree when `tour` is given, otherwise a BST from `values` (possibly empty).
pub fn build_tree(values: &[i64], tour: Option<i64>, rng: &mut StdRng) -> Tree {
    match tour {
        Some(k) => Tree::tour(k, rng),
        None => Tree::from_values(values.iter().copied()),
    }
}

impl TreeSource {
    pub fn build(&self) -> Tree {
        build_tree(&self.values, self.tour, &mut rng_from(self.seed))
    }
}

#[instrument(skip(cli))]
fn cmd_walk(cli: &Cli, source: &TreeSource, inline: bool) -> CliResult<i32> {
    let settings = resolve_settings(cli)?;
    let tree = Arc::new(source.build());
    debug!(nodes = tree.len(), "walking");

    let (mut rx, handle) = walk_spawned(tree, &settings);
    if inline {
        output::info(&rx.join(","));
    } else {
        for value in rx {
            output::info(&value);
        }
    }

    let walked = handle
        .join()
        .map_err(|_| CliError::Internal("walk thread panicked".into()))?
        .map_err(|e| CliError::Application(e.into()))?;
    debug!(?walked, "walk finished");
    Ok(exitcode::OK)
}

#[instrument(skip_all)]
fn cmd_same(cli: &Cli, left: &Tree, right: &Tree) -> CliResult<i32> {
    let settings = resolve_settings(cli)?;
    let verdict = Comparator::new(settings).compare(left, right)?;

    output::info(&verdict.is_equivalent());
    match verdict {
        Verdict::Equivalent { .. } => {
            output::success_detail(&verdict);
            Ok(exitcode::OK)
        }
        Verdict::Different(_) => {
            output::failure(&verdict);
            Ok(exitcode::DIFFERENT)
        }
    }
}

fn cmd_show(source: &TreeSource) -> CliResult<i32> {
    let tree = source.build();
    output::info(&tree);
    output::detail(&format!("nodes: {}, depth: {}", tree.len(), tree.depth()));
    Ok(exitcode::OK)
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => {
            let settings = resolve_settings(cli)?;
            output::header("Effective settings");
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => {
                return Err(CliError::Internal(
                    "cannot determine the config directory".into(),
                ))
            }
        },
    }
    Ok(exitcode::OK)
}
