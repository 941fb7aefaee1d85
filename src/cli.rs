//! CLI argument parsing for the migration runner.
//!
//! The CLI stays thin: it resolves config and paths, then hands the parsed
//! document to the library's batch runner.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "tmig",
    version,
    about = "Apply step-based migrations to term taxonomies",
    after_help = "Examples:\n  tmig init\n  tmig run migrations/2024-reorg.json --dry-run\n  tmig run migrations/2024-reorg.json --out report.json\n  tmig fixtures create --count 10\n  tmig fixtures create --cleanup",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Init(InitArgs),
    #[command(subcommand)]
    Fixtures(FixturesCommand),
}

/// Where the store snapshot and config come from.
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Store snapshot JSON (overrides store_path from the config)
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Migration config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Parse a migration file and apply its steps in order")]
pub struct RunArgs {
    /// Migration JSON file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Describe the planned steps without changing the store
    #[arg(long)]
    pub dry_run: bool,

    /// Print the annotated document (or plan) as JSON instead of summary lines
    #[arg(long)]
    pub json: bool,

    /// Write the annotated document to this path
    #[arg(long, value_name = "PATH", conflicts_with = "dry_run")]
    pub out: Option<PathBuf>,

    /// Fail steps whose parent slug does not resolve instead of dropping the parent
    #[arg(long)]
    pub strict_parents: bool,

    /// Skip cache invalidation after each mutation
    #[arg(long)]
    pub no_cache_invalidation: bool,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Log each step as it runs
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Write a default migration config")]
pub struct InitArgs {
    /// Config path to write (defaults to ./term-migration.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
#[command(about = "Manage fixture test data")]
pub enum FixturesCommand {
    Create(FixturesCreateArgs),
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Seed fixture terms and content, or remove them with --cleanup")]
pub struct FixturesCreateArgs {
    /// Remove previously generated fixtures instead of creating them
    #[arg(long)]
    pub cleanup: bool,

    /// Number of fixture terms to create
    #[arg(long, value_name = "N", default_value_t = crate::fixtures::DEFAULT_FIXTURE_COUNT, conflicts_with = "cleanup")]
    pub count: usize,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Log what was created or removed
    #[arg(long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        RootArgs::command().debug_assert();
    }

    #[test]
    fn run_accepts_dry_run_and_store() {
        let args = RootArgs::try_parse_from([
            "tmig",
            "run",
            "migration.json",
            "--dry-run",
            "--store",
            "store.json",
        ])
        .expect("parse");
        let Command::Run(run) = args.command else {
            panic!("expected run command");
        };
        assert!(run.dry_run);
        assert_eq!(run.file, PathBuf::from("migration.json"));
        assert_eq!(run.store.store, Some(PathBuf::from("store.json")));
    }

    #[test]
    fn out_conflicts_with_dry_run() {
        let err = RootArgs::try_parse_from([
            "tmig",
            "run",
            "migration.json",
            "--dry-run",
            "--out",
            "report.json",
        ])
        .expect_err("conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn fixtures_create_defaults_count() {
        let args = RootArgs::try_parse_from(["tmig", "fixtures", "create"]).expect("parse");
        let Command::Fixtures(FixturesCommand::Create(create)) = args.command else {
            panic!("expected fixtures create");
        };
        assert!(!create.cleanup);
        assert_eq!(create.count, crate::fixtures::DEFAULT_FIXTURE_COUNT);
    }
}
