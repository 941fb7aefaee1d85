use anyhow::Result;
use clap::Parser;
use term_migration::cli::{Command, FixturesCommand, RootArgs};
use term_migration::{logging, workflow};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    let verbose = match &args.command {
        Command::Run(run) => run.verbose,
        Command::Fixtures(FixturesCommand::Create(create)) => create.verbose,
        Command::Init(_) => false,
    };
    logging::init(verbose);

    let mut stdout = std::io::stdout().lock();
    match &args.command {
        Command::Run(run) => workflow::run_migration(run, &mut stdout),
        Command::Init(init) => workflow::run_init(init, &mut stdout),
        Command::Fixtures(fixtures) => workflow::run_fixtures(fixtures, &mut stdout),
    }
}
