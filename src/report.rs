//! Reporting summarizer.
//!
//! Stateless projections over competencies, practice events and
//! continuous-training records, consumed by external dashboards and
//! document renderers. Every function here is a pure read; none mutates
//! engine state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::compliance::{self, ComplianceSnapshot};
use crate::config::ComplianceConfig;
use crate::core::{Competency, Skill, User};
use crate::error::Result;
use crate::recycling::{self, RecyclingStatus};
use crate::storage::sqlite;

/// Bucket label for competencies whose skill and own record both carry
/// no contexts.
pub const UNSPECIFIED_CONTEXT: &str = "unspecified";

/// Pending evidence awaiting a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCounts {
    pub external_trainings: u64,
    pub continuous_training_records: u64,
}

/// Dashboard headline counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub competencies_needing_recycling: u64,
    pub non_compliant_users: u64,
    pub pending: PendingCounts,
}

/// One competency of a user's training record, with its recycling state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetencyStatus {
    pub competency: Competency,
    pub skill_name: String,
    /// Evaluation date or later practice, whichever is latest
    pub latest_evidence: Option<DateTime<Utc>>,
    /// Recycling evaluation; `None` until the competency has evidence
    pub recycling: Option<RecyclingStatus>,
}

/// Per-user projection feeding the external booklet renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTrainingRecord {
    pub user: User,
    pub competencies: Vec<CompetencyStatus>,
    pub compliance: ComplianceSnapshot,
}

/// Recycling evaluation of one stored competency at `as_of`.
///
/// Competencies that were never evaluated and never practiced have no
/// evidence to expire; they report `None` rather than a due date.
pub fn competency_recycling(
    conn: &Connection,
    competency: &Competency,
    as_of: DateTime<Utc>,
) -> Result<Option<RecyclingStatus>> {
    let skill = sqlite::get_skill(conn, competency.skill_id)?;
    let practices = sqlite::practice_dates_for(conn, competency.user_id, competency.skill_id)?;
    let Some(latest) = recycling::latest_evidence_date(competency.evaluation_date, practices)
    else {
        return Ok(None);
    };
    Ok(Some(recycling::evaluate(
        skill.validity_period_months,
        latest,
        as_of,
    )))
}

/// Count of competencies needing recycling, grouped by context name.
///
/// The bucket is the competency's own context-set, falling back to the
/// skill's contexts, then to [`UNSPECIFIED_CONTEXT`]. A competency
/// applying to several contexts counts once per context.
pub fn recycling_counts_by_context(
    conn: &Connection,
    as_of: DateTime<Utc>,
) -> Result<BTreeMap<String, u64>> {
    let names = sqlite::context_names(conn)?;
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();

    for competency in sqlite::all_competencies(conn)? {
        let needs = competency_recycling(conn, &competency, as_of)?
            .is_some_and(|status| status.needs_recycling());
        if !needs {
            continue;
        }

        let context_ids = if competency.contexts.is_empty() {
            sqlite::get_skill(conn, competency.skill_id)?.contexts
        } else {
            competency.contexts.clone()
        };

        if context_ids.is_empty() {
            *counts.entry(UNSPECIFIED_CONTEXT.to_string()).or_default() += 1;
        } else {
            for id in context_ids.iter() {
                let label = names
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| format!("context-{id}"));
                *counts.entry(label).or_default() += 1;
            }
        }
    }

    Ok(counts)
}

/// Total count of competencies needing recycling.
pub fn count_needing_recycling(conn: &Connection, as_of: DateTime<Utc>) -> Result<u64> {
    let mut count = 0;
    for competency in sqlite::all_competencies(conn)? {
        if competency_recycling(conn, &competency, as_of)?
            .is_some_and(|status| status.needs_recycling())
        {
            count += 1;
        }
    }
    Ok(count)
}

/// Ids of users failing the continuous-training requirement at `as_of`.
pub fn non_compliant_users(
    conn: &Connection,
    config: &ComplianceConfig,
    as_of: DateTime<Utc>,
) -> Result<Vec<i64>> {
    let mut out = Vec::new();
    for user in sqlite::list_users(conn)? {
        let attendances = sqlite::attendances_for(conn, user.id)?;
        let snapshot = compliance::snapshot(&attendances, config, as_of);
        if !snapshot.is_compliant {
            out.push(user.id);
        }
    }
    Ok(out)
}

/// Counts of evidence awaiting validation.
pub fn pending_validation_counts(conn: &Connection) -> Result<PendingCounts> {
    Ok(PendingCounts {
        external_trainings: sqlite::count_pending_external_trainings(conn)?,
        continuous_training_records: sqlite::count_pending_attendances(conn)?,
    })
}

/// Skills with an empty tutor roster.
pub fn tutorless_skills(conn: &Connection) -> Result<Vec<Skill>> {
    sqlite::tutorless_skill_ids(conn)?
        .into_iter()
        .map(|id| sqlite::get_skill(conn, id))
        .collect()
}

/// Compliance snapshot of one user at `as_of`.
pub fn user_compliance(
    conn: &Connection,
    config: &ComplianceConfig,
    user_id: i64,
    as_of: DateTime<Utc>,
) -> Result<ComplianceSnapshot> {
    sqlite::get_user(conn, user_id)?;
    let attendances = sqlite::attendances_for(conn, user_id)?;
    Ok(compliance::snapshot(&attendances, config, as_of))
}

/// Full training record of one user: every competency with its recycling
/// state plus the compliance snapshot.
pub fn user_training_record(
    conn: &Connection,
    config: &ComplianceConfig,
    user_id: i64,
    as_of: DateTime<Utc>,
) -> Result<UserTrainingRecord> {
    let user = sqlite::get_user(conn, user_id)?;

    let mut competencies = Vec::new();
    for competency in sqlite::competencies_of_user(conn, user_id)? {
        let skill = sqlite::get_skill(conn, competency.skill_id)?;
        let practices = sqlite::practice_dates_for(conn, user_id, competency.skill_id)?;
        let latest_evidence =
            recycling::latest_evidence_date(competency.evaluation_date, practices);
        let recycling_status = latest_evidence
            .map(|latest| recycling::evaluate(skill.validity_period_months, latest, as_of));
        competencies.push(CompetencyStatus {
            competency,
            skill_name: skill.name,
            latest_evidence,
            recycling: recycling_status,
        });
    }

    let attendances = sqlite::attendances_for(conn, user_id)?;
    Ok(UserTrainingRecord {
        user,
        competencies,
        compliance: compliance::snapshot(&attendances, config, as_of),
    })
}

/// Headline counts for the external dashboard.
pub fn dashboard_summary(
    conn: &Connection,
    config: &ComplianceConfig,
    as_of: DateTime<Utc>,
) -> Result<DashboardSummary> {
    Ok(DashboardSummary {
        competencies_needing_recycling: count_needing_recycling(conn, as_of)?,
        non_compliant_users: u64::try_from(non_compliant_users(conn, config, as_of)?.len())
            .unwrap_or(u64::MAX),
        pending: pending_validation_counts(conn)?,
    })
}
