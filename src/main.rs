mod categorizer;
mod cli;
mod db;
mod dedup;
mod editor;
mod error;
mod export;
mod fmt;
mod importer;
mod models;
mod normalize;
mod reports;
mod schema;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{
    CategoriesCommands, Cli, Commands, ConfigCommands, ExportCommands, ItemsCommands, ReconcileCommands,
    ReportCommands, RulesCommands,
};

fn init_logging() {
    let filter = EnvFilter::try_from_env("BOOKKEEPER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import { file, kind, force } => cli::import::run(&file, kind.into(), force),
        Commands::Add {
            date,
            description,
            amount,
            category,
            job,
            notes,
        } => cli::add::run(date, description, amount, category, job, notes),
        Commands::Edit {
            id,
            description,
            category,
            job,
            notes,
            batch,
            rule,
        } => cli::edit::run(&id, description, category, job, notes, batch, rule),
        Commands::Categorize => cli::categorize::run(),
        Commands::Rules { command } => match command {
            RulesCommands::Add { keyword, category } => cli::rules::add(&keyword, &category),
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Delete { position } => cli::rules::delete(position),
        },
        Commands::Categories { command } => match command {
            CategoriesCommands::Add { name } => cli::categories::add(&name),
            CategoriesCommands::List => cli::categories::list(),
            CategoriesCommands::Delete { name } => cli::categories::delete(&name),
        },
        Commands::Reconcile { command } => match command {
            ReconcileCommands::Toggle { id } => cli::reconcile::toggle(&id),
            ReconcileCommands::Mark { period, search, unmark } => {
                cli::reconcile::mark(period.into(), search.as_deref(), !unmark)
            }
            ReconcileCommands::Check { balance, period } => cli::reconcile::check(&balance, period.into()),
        },
        Commands::Items { command } => match command {
            ItemsCommands::Add {
                kind,
                party,
                number,
                date,
                amount,
            } => cli::items::add(kind.into(), party, number, date, amount),
            ItemsCommands::Toggle { id } => cli::items::toggle(&id),
            ItemsCommands::List { kind, period } => cli::items::list(kind.map(Into::into), period.into()),
        },
        Commands::Report { command } => match command {
            ReportCommands::Dashboard { period } => cli::report::dashboard(period.into()),
            ReportCommands::Transactions { period, search, limit } => {
                cli::report::transactions(period.into(), search.as_deref(), limit)
            }
            ReportCommands::Pnl { period } => cli::report::pnl(period.into()),
            ReportCommands::Jobs { period } => cli::report::jobs(period.into()),
            ReportCommands::Aging { kind, period } => cli::report::aging(kind.into(), period.into()),
            ReportCommands::Tax { period, rate } => cli::report::tax(period.into(), rate),
        },
        Commands::Export { command } => match command {
            ExportCommands::Iif { period, output } => cli::export::iif(period.into(), output),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::SetTaxRate { rate } => cli::config::set_tax_rate(rate),
        },
        Commands::Clear { yes } => cli::clear::run(yes),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
