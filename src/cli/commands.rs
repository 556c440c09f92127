//! Command handlers.

use clap::CommandFactory;
use colored::Colorize;
use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::recycling::RecyclingState;
use crate::report;
use crate::storage::Database;

use super::{Cli, Commands};

/// Dispatch the parsed command.
pub fn run(cli: &Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.database.path.clone_from(db);
    }

    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "recert", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Init => {
            let db = Database::open(&config.database.path)?;
            emit(
                cli,
                &serde_json::json!({
                    "database": config.database.path,
                    "schema_version": db.schema_version(),
                }),
                &format!(
                    "Initialized {} (schema v{})",
                    config.database.path.display(),
                    db.schema_version()
                ),
            )?;
            return Ok(());
        }
        _ => {}
    }

    let mut db = Database::open(&config.database.path)?;
    let as_of = cli.resolve_as_of()?;

    match &cli.command {
        Commands::Init | Commands::Completions { .. } => unreachable!("handled above"),

        Commands::Seed => {
            let summary = super::seed::run(&mut db)?;
            emit(cli, &summary, &summary.describe())?;
        }

        Commands::Snapshot { user } => {
            let snapshot = report::user_compliance(db.conn(), &config.compliance, *user, as_of)?;
            let compliant = if snapshot.is_compliant {
                "compliant".green()
            } else {
                "NOT compliant".red()
            };
            emit(
                cli,
                &snapshot,
                &format!(
                    "User {user}: {:.2}/{:.2} hours ({} live, {} online) - {compliant}\n\
                     live ratio {:.0}% ({}), at risk next year: {}",
                    snapshot.total_hours,
                    snapshot.required_hours,
                    snapshot.live_hours,
                    snapshot.online_hours,
                    snapshot.live_ratio * 100.0,
                    if snapshot.is_live_ratio_compliant {
                        "ok"
                    } else {
                        "below threshold"
                    },
                    snapshot.is_at_risk_next_year,
                ),
            )?;
        }

        Commands::Recycling { user: Some(user) } => {
            let record =
                report::user_training_record(db.conn(), &config.compliance, *user, as_of)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&record.competencies)?);
            } else {
                for status in &record.competencies {
                    let state = match status.recycling.as_ref().map(|r| r.state) {
                        None => "no evidence".dimmed().to_string(),
                        Some(RecyclingState::Valid) => "valid".green().to_string(),
                        Some(RecyclingState::RecyclingSoon) => "recycling soon".yellow().to_string(),
                        Some(RecyclingState::Expired) => "EXPIRED".red().to_string(),
                    };
                    let due = status
                        .recycling
                        .as_ref()
                        .and_then(|r| r.due_date)
                        .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
                    println!(
                        "{:<30} {:<12} due {:<12} {}",
                        status.skill_name,
                        status.competency.level.to_string(),
                        due,
                        state
                    );
                }
            }
        }

        Commands::Recycling { user: None } => {
            let counts = report::recycling_counts_by_context(db.conn(), as_of)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&counts)?);
            } else if counts.is_empty() {
                println!("No competencies need recycling.");
            } else {
                for (context, count) in &counts {
                    println!("{context:<20} {count}");
                }
            }
        }

        Commands::Record { user } => {
            let record =
                report::user_training_record(db.conn(), &config.compliance, *user, as_of)?;
            // The record is a renderer input; human mode prints it as
            // JSON too.
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Pending => {
            let pending = report::pending_validation_counts(db.conn())?;
            emit(
                cli,
                &pending,
                &format!(
                    "Pending validation: {} external trainings, {} continuous-training records",
                    pending.external_trainings, pending.continuous_training_records
                ),
            )?;
        }

        Commands::Tutorless => {
            let skills = report::tutorless_skills(db.conn())?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&skills)?);
            } else if skills.is_empty() {
                println!("Every skill has at least one tutor.");
            } else {
                for skill in &skills {
                    println!("{} (#{})", skill.name, skill.id);
                }
            }
        }

        Commands::Summary => {
            let summary = report::dashboard_summary(db.conn(), &config.compliance, as_of)?;
            emit(
                cli,
                &summary,
                &format!(
                    "{} competencies need recycling, {} users non-compliant, {} + {} validations pending",
                    summary.competencies_needing_recycling,
                    summary.non_compliant_users,
                    summary.pending.external_trainings,
                    summary.pending.continuous_training_records,
                ),
            )?;
        }
    }

    Ok(())
}

fn emit<T: Serialize>(cli: &Cli, value: &T, human: &str) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{human}");
    }
    Ok(())
}
