// Inherit lint configuration from lib.rs for consistency
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::items_after_statements,
    clippy::too_many_lines,
    clippy::similar_names,
    clippy::fn_params_excessive_bools,
    clippy::unnecessary_wraps,
    clippy::match_same_arms
)]

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use restructure::cli::commands::{Cli, Command};
use restructure::cli::output;
use restructure::config::Config;
use restructure::db::Database;
use restructure::error::RestructureError;
use restructure::operations;
use restructure::refactor::notice_channel;

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

/// Log to stderr so stdout stays pure JSON. Level comes from `RUST_LOG`.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::fmt::Display>> {
    match cli.command {
        Command::Import { snapshot } => cmd_import(&snapshot),
        Command::Export => cmd_export(),
        Command::Tree => cmd_tree(),
        Command::Refs { element } => cmd_refs(&element),
        Command::Plan { elements, to } => cmd_plan(&elements, &to),
        Command::Move {
            elements,
            to,
            force,
        } => cmd_move(&elements, &to, force),
        Command::PushDown {
            class,
            members,
            targets,
        } => cmd_push_down(&class, &members, &targets),
        Command::Verify => cmd_verify(),
    }
}

type CmdResult = Result<(), Box<dyn std::fmt::Display>>;

fn map_err(e: impl std::fmt::Display + 'static) -> Box<dyn std::fmt::Display> {
    Box::new(e.to_string())
}

fn get_config() -> Result<Config, Box<dyn std::fmt::Display>> {
    Config::from_cwd().map_err(map_err)
}

/// Open the model database; everything except `import` needs one to exist.
fn get_db(config: &Config) -> Result<Database, Box<dyn std::fmt::Display>> {
    if !config.model_exists() {
        return Err(map_err(RestructureError::ModelNotFound));
    }
    Database::open(&config.db_path).map_err(map_err)
}

fn cmd_import(snapshot: &str) -> CmdResult {
    let config = get_config()?;
    config.ensure_state_dir().map_err(map_err)?;
    let mut db = Database::open(&config.db_path).map_err(map_err)?;
    let path = config.project_root.join(Path::new(snapshot));
    let result = operations::import_snapshot(&mut db, &path).map_err(map_err)?;
    println!("{}", output::format_json(&result));
    Ok(())
}

fn cmd_export() -> CmdResult {
    let config = get_config()?;
    let db = get_db(&config)?;
    let snapshot = operations::export_snapshot(&db).map_err(map_err)?;
    println!("{}", output::format_json(&snapshot));
    Ok(())
}

fn cmd_tree() -> CmdResult {
    let config = get_config()?;
    let db = get_db(&config)?;
    let entries = operations::build_tree(&db).map_err(map_err)?;
    println!("{}", output::format_json(&entries));
    Ok(())
}

fn cmd_refs(element: &str) -> CmdResult {
    let config = get_config()?;
    let db = get_db(&config)?;
    let result = operations::get_refs(&db, element).map_err(map_err)?;
    println!("{}", output::format_json(&result));
    Ok(())
}

fn cmd_plan(elements: &[String], to: &str) -> CmdResult {
    let config = get_config()?;
    let db = get_db(&config)?;
    let result = operations::plan_relocation(&db, &config, elements, to).map_err(map_err)?;
    println!("{}", output::format_json(&result));
    Ok(())
}

fn cmd_move(elements: &[String], to: &str, force: bool) -> CmdResult {
    let config = get_config()?;
    let mut db = get_db(&config)?;
    let (notices, mut receiver) = notice_channel();

    let rt = tokio::runtime::Runtime::new().map_err(map_err)?;
    let result = rt.block_on(async {
        let printer = tokio::spawn(async move {
            while let Some(notice) = receiver.next().await {
                eprintln!("{}", output::format_notice(&notice));
            }
        });
        // the sender is dropped when relocate returns, which ends the printer
        let result = operations::relocate(&mut db, &config, notices, elements, to, force);
        if let Err(e) = printer.await {
            tracing::warn!(error = %e, "notice printer failed");
        }
        result
    });
    let result = result.map_err(map_err)?;

    println!("{}", output::format_json(&result));
    if result.applied {
        Ok(())
    } else {
        Err(map_err(RestructureError::ConflictsDetected {
            count: result.conflicts.len(),
        }))
    }
}

fn cmd_push_down(class: &str, members: &[String], targets: &[String]) -> CmdResult {
    let config = get_config()?;
    let db = get_db(&config)?;
    let result =
        operations::check_push_down(&db, &config, class, members, targets).map_err(map_err)?;
    println!("{}", output::format_json(&result));
    Ok(())
}

fn cmd_verify() -> CmdResult {
    let config = get_config()?;
    let db = get_db(&config)?;
    let report = operations::verify_model(&db).map_err(map_err)?;
    println!("{}", output::format_json(&report));
    Ok(())
}
