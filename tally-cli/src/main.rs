use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tally_core::{Category, PaymentMonth, TallyError};
use tally_session::Session;

mod config;
mod logging;
mod report;
mod state;
mod tui;

use config::{load_config, Config};

#[derive(Parser, Debug)]
#[command(name = "tally", version, about = "Tag card statement rows and chart spending by category")]
struct Cli {
    /// Debug-level logging (overridden by TALLY_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal UI
    Tui {
        /// Statement CSV to open on start
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Resume the previous snapshot without asking
        #[arg(long, conflicts_with = "csv")]
        restore: bool,
    },

    /// Read a statement CSV, print it, and save it as the current snapshot
    Load {
        csv: PathBuf,

        /// Print only; leave the snapshot untouched
        #[arg(long)]
        no_save: bool,
    },

    /// Tag rows of the current snapshot with a category
    Assign {
        /// Row indices, e.g. `0,2,5-7`
        #[arg(long)]
        rows: String,

        /// One of: food, utilities, transport, communications, household,
        /// entertainment, education, gas, water, sundries, advances
        #[arg(long)]
        category: Category,

        #[command(flatten)]
        source: SnapshotArg,
    },

    /// Print the rows of a snapshot
    Show {
        #[command(flatten)]
        source: SnapshotArg,
    },

    /// Print totals per category
    Summary {
        #[command(flatten)]
        source: SnapshotArg,

        #[arg(long)]
        json: bool,
    },

    /// Print the category breakdown (every row must be tagged)
    Chart {
        #[command(flatten)]
        source: SnapshotArg,

        #[arg(long)]
        json: bool,
    },

    /// Copy the working set to another snapshot file
    Save {
        #[arg(long)]
        to: PathBuf,

        #[command(flatten)]
        source: SnapshotArg,
    },

    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(clap::Args, Debug)]
struct SnapshotArg {
    /// Snapshot to read instead of the default one
    #[arg(long = "from")]
    from: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.tally/config.toml with defaults
    Init,
    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Tui { .. } = cli.command {
        logging::init_file(cli.verbose)?;
    } else {
        logging::init_stderr(cli.verbose);
    }

    let cfg = load_config()?;

    match cli.command {
        Command::Tui { csv, restore } => {
            let session = new_session(&cfg);
            let ask = cfg.ui.ask_restore && session.store().exists();
            let mut app = tui::App::new(session, cfg.ui.default_category);

            if let Some(path) = csv {
                app.open_statement(path);
            } else if restore {
                app.open_snapshot(None);
            } else if ask {
                app.ask_restore();
            }
            tui::run_tui(app)?;
        }

        Command::Load { csv, no_save } => {
            if !csv.exists() {
                bail!("CSV not found: {}", csv.display());
            }
            let mut session = new_session(&cfg);
            let summary = session
                .load_statement(&csv)
                .with_context(|| format!("loading {}", csv.display()))?;

            print!("{}", report::render_table(session.records()));
            println!();
            print!("{}", report::render_summary(&summary, session.payment_month()));

            if !no_save {
                let path = session.save()?;
                println!("\nSnapshot: {}", path.display());
            }
        }

        Command::Assign {
            rows,
            category,
            source,
        } => {
            let rows = state::parse_rows(&rows)?;
            let mut session = open_snapshot(&cfg, &source)?;
            let outcome = session.assign(&rows, category)?;

            println!(
                "Tagged {} row(s) as {}",
                outcome.report.applied.len(),
                category
            );
            if !outcome.report.ignored.is_empty() {
                println!("Ignored out-of-range rows: {:?}", outcome.report.ignored);
            }
            if let Some(e) = outcome.snapshot_error {
                eprintln!("warning: {e}");
            }
            // --from writes back to the file it was read from
            if let Some(path) = &source.from {
                if !outcome.report.is_noop() {
                    session.save_to(path)?;
                }
            }
            println!();
            print!(
                "{}",
                report::render_summary(&outcome.summary, session.payment_month())
            );
        }

        Command::Show { source } => {
            let session = open_snapshot(&cfg, &source)?;
            print!("{}", report::render_table(session.records()));
            print_source(&session);
        }

        Command::Summary { source, json } => {
            let session = open_snapshot(&cfg, &source)?;
            let summary = session.summary();
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", report::render_summary(&summary, session.payment_month()));
            }
        }

        Command::Chart { source, json } => {
            let session = open_snapshot(&cfg, &source)?;
            match session.chart() {
                Ok(chart) if json => println!("{}", serde_json::to_string_pretty(&chart)?),
                Ok(chart) => print!("{}", report::render_chart(&chart)),
                Err(TallyError::IncompleteCategorization { uncategorized }) => bail!(
                    "{uncategorized} row(s) have no category yet; tag them with `tally assign`"
                ),
                Err(e) => return Err(e.into()),
            }
        }

        Command::Save { to, source } => {
            let session = open_snapshot(&cfg, &source)?;
            let path = session.save_to(&to)?;
            println!("Wrote {} rows to {}", session.records().len(), path.display());
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg)?);
            }
        },
    }

    Ok(())
}

fn new_session(cfg: &Config) -> Session {
    Session::new(cfg.snapshot_store(), cfg.resolver())
}

fn open_snapshot(cfg: &Config, arg: &SnapshotArg) -> Result<Session> {
    let mut session = new_session(cfg);
    match &arg.from {
        Some(path) => {
            session
                .restore_from(path)
                .with_context(|| format!("reading {}", path.display()))?;
        }
        None => {
            if !session.store().exists() {
                bail!(
                    "No snapshot at {}. Run: tally load <statement.csv>",
                    session.store().path().display()
                );
            }
            session.restore()?;
        }
    }
    Ok(session)
}

fn print_source(session: &Session) {
    let month = session.payment_month();
    let source = session
        .source()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    if *month == PaymentMonth::Unknown {
        println!("\nsource: {source}");
    } else {
        println!("\nsource: {source} ({month})");
    }
}
