//! Command implementations behind the `tmig` subcommands.
use crate::cli::{FixturesCommand, InitArgs, RunArgs, StoreArgs};
use crate::config::{self, MigrationConfig, DEFAULT_CONFIG_FILE};
use crate::fixtures;
use crate::migration::{parse_file, BatchRunner, Hooks, OperationRegistry, ParentPolicy};
use crate::report;
use crate::store::{load_store, save_store};
use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn run_init(args: &InitArgs, out: &mut impl Write) -> Result<()> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    config::write_config(&path, &config::default_config())?;
    writeln!(out, "wrote {}", path.display())?;
    Ok(())
}

/// Parse a migration file, then either describe it (dry run) or apply it.
///
/// Parse failures abort before any step runs. Step failures are reported in
/// the output and the annotated document but never fail the command.
pub fn run_migration(args: &RunArgs, out: &mut impl Write) -> Result<()> {
    let config = load_config_for(&args.store)?;
    let mut options = config.options();
    if args.strict_parents {
        options.parent_policy = ParentPolicy::Fail;
    }
    if args.no_cache_invalidation {
        options.invalidate_cache = false;
    }

    let document = parse_file(&args.file).map_err(|err| {
        let code = err.code();
        anyhow::Error::new(err).context(format!(
            "migration {} rejected ({code})",
            args.file.display()
        ))
    })?;
    let hooks = Hooks::new();
    let document = hooks.apply_parse(document);
    let registry = OperationRegistry::with_builtin();
    let runner = BatchRunner::new(&registry, &hooks, options);

    if args.dry_run {
        let plan = runner.plan(&document);
        if args.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&plan)?)?;
        } else {
            write!(out, "{}", report::render_plan(&plan))?;
        }
        return Ok(());
    }

    let store_path = resolve_store_path(&args.store, &config)?;
    let mut store = load_store(&store_path)?;
    tracing::info!(
        file = %args.file.display(),
        store = %store_path.display(),
        steps = document.steps.len(),
        "running migration"
    );
    let executed = runner.run(document, &mut store);
    save_store(&store_path, &store)?;

    if let Some(path) = &args.out {
        report::write_json(path, &executed)?;
        tracing::info!(path = %path.display(), "wrote annotated migration");
    }
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&executed)?)?;
    } else {
        write!(out, "{}", report::render_run(&executed))?;
    }
    Ok(())
}

pub fn run_fixtures(command: &FixturesCommand, out: &mut impl Write) -> Result<()> {
    match command {
        FixturesCommand::Create(args) => {
            let config = load_config_for(&args.store)?;
            let store_path = resolve_store_path(&args.store, &config)?;
            let mut store = load_store(&store_path)?;
            let summary = if args.cleanup {
                let summary = fixtures::cleanup_fixtures(&mut store);
                writeln!(
                    out,
                    "removed {} fixture terms and {} fixture posts",
                    summary.terms.len(),
                    summary.content.len()
                )?;
                summary
            } else {
                let summary = fixtures::create_fixtures(&mut store, args.count)?;
                writeln!(
                    out,
                    "created {} fixture terms and {} fixture posts",
                    summary.terms.len(),
                    summary.content.len()
                )?;
                summary
            };
            save_store(&store_path, &store)?;
            tracing::debug!(?summary, store = %store_path.display(), "fixtures saved");
            Ok(())
        }
    }
}

fn load_config_for(args: &StoreArgs) -> Result<MigrationConfig> {
    match &args.config {
        Some(path) => config::load_config(path),
        None => config::load_config_optional(Path::new(DEFAULT_CONFIG_FILE)),
    }
}

fn resolve_store_path(args: &StoreArgs, config: &MigrationConfig) -> Result<PathBuf> {
    match &args.store {
        Some(path) => Ok(path.clone()),
        None => config
            .resolve_store_path()
            .context("resolve store snapshot path"),
    }
}
