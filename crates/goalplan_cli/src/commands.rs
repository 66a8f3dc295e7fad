//! CLI arguments and command dispatch.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use goalplan_core::db::open_db;
use goalplan_core::{
    default_log_level, hours_per_goal, init_logging, progress, timeline, AccountService,
    GoalService, GridConfig, NewStep, Session, SlotKey, SqliteGoalRepository,
    SqliteUserRepository, StepId, SummaryReport, PRIORITY_DEFAULT,
};
use log::info;
use rusqlite::Connection;

use crate::output::{self, StatsView};

/// goalplan - track goals, split hours across steps and fill a weekly grid.
#[derive(Debug, Parser)]
#[command(name = "goalplan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, env = "GOALPLAN_DB", default_value = "goalplan.sqlite3")]
    db: PathBuf,

    /// Directory for rolling log files. Logging is off when omitted.
    #[arg(long, global = true, env = "GOALPLAN_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, global = true, env = "GOALPLAN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Account name.
    #[arg(long, short, global = true, env = "GOALPLAN_USER")]
    user: Option<String>,

    /// Account password.
    #[arg(long, global = true, env = "GOALPLAN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create an account with --user and --password.
    Register,

    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that run inside a logged-in session.
#[derive(Debug, Subcommand)]
enum SessionCommand {
    /// Manage goals.
    #[command(subcommand)]
    Goal(GoalCommand),

    /// Manage steps.
    #[command(subcommand)]
    Step(StepCommand),

    /// List goals and their steps.
    List,

    /// Split an hour budget across all steps.
    Allocate {
        /// Hours available.
        #[arg(long, allow_negative_numbers = true)]
        budget: f64,

        /// Reference date for deadlines (defaults to today).
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Place steps into open slots of the weekly grid.
    Schedule(GridArgs),

    /// Show chart data: hours per goal, progress and timeline.
    Stats,

    /// Export the summary report.
    Report {
        /// Output file (defaults to report_<user>.txt).
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum GoalCommand {
    /// Create a goal; an existing goal with the same name is kept.
    Add {
        name: String,
    },
}

#[derive(Debug, Subcommand)]
enum StepCommand {
    /// Add a step to an existing goal.
    Add {
        #[arg(long)]
        goal: String,

        #[arg(long)]
        name: String,

        /// Estimated hours.
        #[arg(long)]
        hours: f64,

        /// 1 = high, 5 = low.
        #[arg(long, default_value_t = PRIORITY_DEFAULT)]
        priority: u8,

        /// Deadline as YYYY-MM-DD.
        #[arg(long)]
        deadline: NaiveDate,
    },

    /// Mark a step as done.
    Done {
        id: StepId,

        /// Mark the step as not done instead.
        #[arg(long)]
        undo: bool,
    },
}

#[derive(Debug, Args)]
struct GridArgs {
    #[arg(long, default_value_t = GridConfig::default().start_hour)]
    start_hour: u8,

    #[arg(long, default_value_t = GridConfig::default().end_hour)]
    end_hour: u8,

    /// Hours between two slot rows.
    #[arg(long, default_value_t = GridConfig::default().interval_hours)]
    interval: u8,

    /// Slot to keep free, as DAY@HOUR (repeatable), e.g. Mon@8.
    #[arg(long = "reserve")]
    reserved: Vec<SlotKey>,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        self.init_logging()?;

        let conn = open_db(&self.db)
            .with_context(|| format!("failed to open database `{}`", self.db.display()))?;

        match &self.command {
            Commands::Register => self.register(&conn),
            Commands::Session(command) => self.run_session(&conn, command),
        }
    }

    fn register(&self, conn: &Connection) -> Result<()> {
        let (username, password) = self.credentials()?;
        AccountService::new(SqliteUserRepository::new(conn)).register(username, password)?;
        println!("Account `{}` created.", username.trim());
        Ok(())
    }

    fn run_session(&self, conn: &Connection, command: &SessionCommand) -> Result<()> {
        let username = self.login(conn)?;
        let grid_config = match command {
            SessionCommand::Schedule(args) => {
                GridConfig::new(args.start_hour, args.end_hour, args.interval)?
            }
            _ => GridConfig::default(),
        };
        let goals = GoalService::new(SqliteGoalRepository::new(conn));
        let mut session = goals.open_session(&username, grid_config)?;

        match command {
            SessionCommand::Goal(GoalCommand::Add { name }) => {
                let id = goals.create_goal(&mut session, name)?;
                println!("Goal `{}` ready ({id}).", name.trim());
            }
            SessionCommand::Step(StepCommand::Add {
                goal,
                name,
                hours,
                priority,
                deadline,
            }) => {
                let request = NewStep {
                    name: name.clone(),
                    hours: *hours,
                    priority: *priority,
                    deadline: *deadline,
                };
                let id = goals.add_step(&mut session, goal, &request)?;
                println!("Step `{}` added to goal `{}` ({id}).", name.trim(), goal.trim());
            }
            SessionCommand::Step(StepCommand::Done { id, undo }) => {
                goals.set_step_done(&mut session, *id, !undo)?;
                println!("Step {id} marked {}.", if *undo { "not done" } else { "done" });
            }
            SessionCommand::List => {
                if self.json {
                    output::print_json(session.goals())?;
                } else {
                    output::print_plans(session.goals());
                }
            }
            SessionCommand::Allocate { budget, today } => {
                let today = today.unwrap_or_else(|| Local::now().date_naive());
                let outcome = session
                    .allocate(*budget, today)
                    .context("optimization failed")?;
                if self.json {
                    output::print_json(&outcome)?;
                } else {
                    output::print_allocation(&outcome);
                }
            }
            SessionCommand::Schedule(args) => self.schedule(&mut session, args)?,
            SessionCommand::Stats => {
                let stats = StatsView {
                    hours_per_goal: hours_per_goal(session.goals()),
                    progress: progress(session.goals()),
                    timeline: timeline(session.goals()),
                };
                if self.json {
                    output::print_json(&stats)?;
                } else {
                    output::print_stats(&stats);
                }
            }
            SessionCommand::Report { out } => {
                let report = SummaryReport::build(session.username(), session.goals());
                if self.json {
                    output::print_json(&report)?;
                } else {
                    let path = out
                        .clone()
                        .unwrap_or_else(|| PathBuf::from(SummaryReport::file_name(&username)));
                    std::fs::write(&path, report.to_string())
                        .with_context(|| format!("failed to write `{}`", path.display()))?;
                    info!("event=report_export module=cli status=ok");
                    println!("Report written to {}.", path.display());
                }
            }
        }

        Ok(())
    }

    fn schedule(&self, session: &mut Session, args: &GridArgs) -> Result<()> {
        for slot in &args.reserved {
            if !session.toggle_slot(slot.day, slot.hour)?.is_reserved() {
                // Listed twice: the second toggle released it again.
                session.toggle_slot(slot.day, slot.hour)?;
            }
        }

        let outcome = session.schedule();
        if self.json {
            output::print_json(&outcome)?;
        } else {
            output::print_schedule(&outcome);
        }
        Ok(())
    }

    fn init_logging(&self) -> Result<()> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(());
        };
        let log_dir = absolute(log_dir)?;
        let level = self.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir).context("failed to initialize logging")?;
        Ok(())
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        let Some(username) = self.user.as_deref() else {
            bail!("--user is required (or set GOALPLAN_USER)");
        };
        let Some(password) = self.password.as_deref() else {
            bail!("--password is required (or set GOALPLAN_PASSWORD)");
        };
        Ok((username, password))
    }

    fn login(&self, conn: &Connection) -> Result<String> {
        let (username, password) = self.credentials()?;
        let username = AccountService::new(SqliteUserRepository::new(conn)).login(username, password)?;
        Ok(username)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, SessionCommand};
    use chrono::Weekday;
    use clap::{CommandFactory, Parser};
    use goalplan_core::SlotKey;
    use std::path::Path;

    fn cli(db: &Path, args: &[&str]) -> Cli {
        let mut argv = vec![
            "goalplan",
            "--db",
            db.to_str().unwrap(),
            "--user",
            "alice",
            "--password",
            "pw",
        ];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeated_reservations() {
        let parsed = cli(
            Path::new("unused.sqlite3"),
            &["schedule", "--reserve", "Mon@8", "--reserve", "Sat@10:00"],
        );
        match parsed.command {
            Commands::Session(SessionCommand::Schedule(args)) => {
                assert_eq!(
                    args.reserved,
                    vec![SlotKey::new(Weekday::Mon, 8), SlotKey::new(Weekday::Sat, 10)]
                );
                assert_eq!(args.start_hour, 6);
                assert_eq!(args.interval, 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn budget_accepts_a_negative_value() {
        let parsed = Cli::try_parse_from(["goalplan", "allocate", "--budget", "-1"]).unwrap();
        match parsed.command {
            Commands::Session(SessionCommand::Allocate { budget, today }) => {
                assert_eq!(budget, -1.0);
                assert_eq!(today, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn negative_budget_reports_infeasible_plan() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("goalplan.sqlite3");
        cli(&db, &["register"]).run().unwrap();
        cli(&db, &["goal", "add", "thesis"]).run().unwrap();
        cli(
            &db,
            &[
                "step", "add", "--goal", "thesis", "--name", "outline", "--hours", "2",
                "--deadline", "2030-01-10",
            ],
        )
        .run()
        .unwrap();

        let err = cli(&db, &["allocate", "--budget", "-1", "--today", "2030-01-01"])
            .run()
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("optimization failed"));
        assert!(message.contains("no allocation satisfies the budget and deadlines"));
    }

    #[test]
    fn rejects_malformed_slot() {
        let err = Cli::try_parse_from(["goalplan", "schedule", "--reserve", "Monday"]);
        assert!(err.is_err());
    }

    #[test]
    fn full_flow_against_a_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("goalplan.sqlite3");
        let report = dir.path().join("report.txt");

        cli(&db, &["register"]).run().unwrap();
        cli(&db, &["goal", "add", "thesis"]).run().unwrap();
        cli(
            &db,
            &[
                "step", "add", "--goal", "thesis", "--name", "outline", "--hours", "2",
                "--priority", "1", "--deadline", "2030-01-10",
            ],
        )
        .run()
        .unwrap();
        cli(&db, &["allocate", "--budget", "4", "--today", "2030-01-01"])
            .run()
            .unwrap();
        cli(&db, &["schedule", "--reserve", "Mon@6"]).run().unwrap();
        cli(&db, &["report", "--out", report.to_str().unwrap()])
            .run()
            .unwrap();

        let text = std::fs::read_to_string(&report).unwrap();
        assert!(text.starts_with("Report - alice"));
        assert!(text.contains("Step: outline, Time: 2h, Deadline: 2030-01-10, Priority: 1, Done?: no"));
    }

    #[test]
    fn wrong_password_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("goalplan.sqlite3");
        cli(&db, &["register"]).run().unwrap();

        let parsed = Cli::try_parse_from([
            "goalplan",
            "--db",
            db.to_str().unwrap(),
            "--user",
            "alice",
            "--password",
            "wrong",
            "list",
        ])
        .unwrap();
        let err = parsed.run().unwrap_err();
        assert!(err.to_string().contains("incorrect username or password"));
    }
}
