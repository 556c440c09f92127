//! SQLite database layer.
//!
//! [`Database`] owns the connection and runs migrations on open. Query
//! functions take `&Connection` so they compose under a single
//! transaction: `rusqlite::Transaction` derefs to `Connection`, and the
//! reconciler wraps each evidence batch in one immediate transaction.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::compliance::Attendance;
use crate::core::{
    AttendanceStatus, Competency, Complexity, Context, ContextSet, ContinuousTrainingEvent,
    ContinuousTrainingRecord, DeliveryMode, Evaluator, EvidenceClaim, ExternalTraining,
    ExternalTrainingStatus, Level, Skill, TrainingSession, User,
};
use crate::error::{RecertError, Result};
use crate::storage::migrations;

/// SQLite database wrapper for the competency store.
pub struct Database {
    conn: Connection,
    schema_version: u32,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("schema_version", &self.schema_version)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open database at the given path, creating and migrating as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database. Used by tests and ephemeral tooling.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let schema_version = migrations::run_migrations(&conn)?;
        Ok(Self {
            conn,
            schema_version,
        })
    }

    /// Get a reference to the connection.
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Schema version after migrations.
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Begin an immediate transaction.
    ///
    /// Immediate mode takes the write lock up front, so two concurrent
    /// reconciliations of the same (user, skill) pair serialize instead
    /// of both observing "no match" and creating duplicate records.
    pub fn transaction(&mut self) -> Result<rusqlite::Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

// =============================================================================
// TIMESTAMP HELPERS
// =============================================================================

fn ts_string(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| RecertError::InvalidEvidence(format!("bad timestamp '{raw}': {err}")))
}

fn parse_opt_ts(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.as_deref().map(parse_ts).transpose()
}

// =============================================================================
// USERS AND CONTEXTS
// =============================================================================

/// Insert a user, returning its id.
pub fn insert_user(conn: &Connection, full_name: &str, email: &str, is_validator: bool) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (full_name, email, is_validator) VALUES (?1, ?2, ?3)",
        params![full_name, email, is_validator],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetch a user by id.
pub fn get_user(conn: &Connection, id: i64) -> Result<User> {
    conn.query_row(
        "SELECT id, full_name, email, is_validator FROM users WHERE id = ?1",
        [id],
        |row| {
            Ok(User {
                id: row.get(0)?,
                full_name: row.get(1)?,
                email: row.get(2)?,
                is_validator: row.get(3)?,
            })
        },
    )
    .optional()?
    .ok_or(RecertError::UserNotFound(id))
}

/// List all users ordered by id.
pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt =
        conn.prepare("SELECT id, full_name, email, is_validator FROM users ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(User {
            id: row.get(0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            is_validator: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Insert a context (species), returning its id.
pub fn insert_context(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO contexts (name) VALUES (?1)", [name])?;
    Ok(conn.last_insert_rowid())
}

/// Fetch a context by id.
pub fn get_context(conn: &Connection, id: i64) -> Result<Context> {
    conn.query_row(
        "SELECT id, name FROM contexts WHERE id = ?1",
        [id],
        |row| {
            Ok(Context {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or(RecertError::ContextNotFound(id))
}

/// Map of context id to name, for report labels.
pub fn context_names(conn: &Connection) -> Result<HashMap<i64, String>> {
    let mut stmt = conn.prepare("SELECT id, name FROM contexts")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    Ok(rows.collect::<rusqlite::Result<HashMap<_, _>>>()?)
}

// =============================================================================
// SKILLS AND TUTOR ROSTER
// =============================================================================

/// Insert a skill with its associated contexts, returning its id.
pub fn insert_skill(
    conn: &Connection,
    name: &str,
    description: &str,
    complexity: Complexity,
    validity_period_months: Option<u32>,
    contexts: &ContextSet,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO skills (name, description, complexity, validity_period_months)
         VALUES (?1, ?2, ?3, ?4)",
        params![name, description, complexity.as_str(), validity_period_months],
    )?;
    let skill_id = conn.last_insert_rowid();
    for context_id in contexts.iter() {
        conn.execute(
            "INSERT INTO skill_contexts (skill_id, context_id) VALUES (?1, ?2)",
            params![skill_id, context_id],
        )?;
    }
    Ok(skill_id)
}

fn skill_contexts(conn: &Connection, skill_id: i64) -> Result<ContextSet> {
    let mut stmt =
        conn.prepare("SELECT context_id FROM skill_contexts WHERE skill_id = ?1")?;
    let ids = stmt.query_map([skill_id], |row| row.get::<_, i64>(0))?;
    Ok(ids.collect::<rusqlite::Result<ContextSet>>()?)
}

/// Fetch a skill by id, including its context-set.
pub fn get_skill(conn: &Connection, id: i64) -> Result<Skill> {
    let raw = conn
        .query_row(
            "SELECT id, name, description, complexity, validity_period_months
             FROM skills WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<u32>>(4)?,
                ))
            },
        )
        .optional()?
        .ok_or(RecertError::SkillNotFound(id))?;

    Ok(Skill {
        id: raw.0,
        name: raw.1,
        description: raw.2,
        complexity: Complexity::parse(&raw.3)?,
        validity_period_months: raw.4,
        contexts: skill_contexts(conn, raw.0)?,
    })
}

/// List all skills ordered by name.
pub fn list_skills(conn: &Connection) -> Result<Vec<Skill>> {
    let mut stmt = conn.prepare("SELECT id FROM skills ORDER BY name")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    ids.into_iter().map(|id| get_skill(conn, id)).collect()
}

/// Add a user to a skill's tutor roster. Idempotent; returns whether the
/// membership was newly created.
pub fn add_tutor(conn: &Connection, skill_id: i64, user_id: i64) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO skill_tutors (skill_id, user_id) VALUES (?1, ?2)",
        params![skill_id, user_id],
    )?;
    Ok(changed > 0)
}

/// Remove a user from a skill's tutor roster. Idempotent; returns whether
/// a membership was removed.
pub fn remove_tutor(conn: &Connection, skill_id: i64, user_id: i64) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM skill_tutors WHERE skill_id = ?1 AND user_id = ?2",
        params![skill_id, user_id],
    )?;
    Ok(changed > 0)
}

/// Whether a user tutors a skill.
pub fn is_tutor(conn: &Connection, skill_id: i64, user_id: i64) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM skill_tutors WHERE skill_id = ?1 AND user_id = ?2",
            params![skill_id, user_id],
            |_| Ok(true),
        )
        .optional()?;
    Ok(found.unwrap_or(false))
}

/// Ids of skills with an empty tutor roster.
pub fn tutorless_skill_ids(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT s.id FROM skills s
         LEFT JOIN skill_tutors t ON t.skill_id = s.id
         WHERE t.user_id IS NULL
         ORDER BY s.name",
    )?;
    let ids = stmt.query_map([], |row| row.get(0))?;
    Ok(ids.collect::<rusqlite::Result<Vec<_>>>()?)
}

// =============================================================================
// TRAINING SESSIONS
// =============================================================================

/// Insert a training session with attendees and covered skills.
pub fn insert_session(
    conn: &Connection,
    title: &str,
    location: &str,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    tutor_id: Option<i64>,
    attendee_ids: &[i64],
    skill_ids: &[i64],
) -> Result<i64> {
    conn.execute(
        "INSERT INTO training_sessions (title, location, start_time, end_time, tutor_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            title,
            location,
            ts_string(start_time),
            ts_string(end_time),
            tutor_id
        ],
    )?;
    let session_id = conn.last_insert_rowid();
    for user_id in attendee_ids {
        conn.execute(
            "INSERT INTO session_attendees (session_id, user_id) VALUES (?1, ?2)",
            params![session_id, user_id],
        )?;
    }
    for skill_id in skill_ids {
        conn.execute(
            "INSERT INTO session_skills (session_id, skill_id) VALUES (?1, ?2)",
            params![session_id, skill_id],
        )?;
    }
    Ok(session_id)
}

/// Fetch a session by id, including attendees and covered skills.
pub fn get_session(conn: &Connection, id: i64) -> Result<TrainingSession> {
    let raw = conn
        .query_row(
            "SELECT id, title, location, start_time, end_time, tutor_id, realized
             FROM training_sessions WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                    row.get::<_, bool>(6)?,
                ))
            },
        )
        .optional()?
        .ok_or(RecertError::SessionNotFound(id))?;

    let mut stmt =
        conn.prepare("SELECT user_id FROM session_attendees WHERE session_id = ?1 ORDER BY user_id")?;
    let attendee_ids = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;

    let mut stmt =
        conn.prepare("SELECT skill_id FROM session_skills WHERE session_id = ?1 ORDER BY skill_id")?;
    let skill_ids = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;

    Ok(TrainingSession {
        id: raw.0,
        title: raw.1,
        location: raw.2,
        start_time: parse_ts(&raw.3)?,
        end_time: parse_ts(&raw.4)?,
        tutor_id: raw.5,
        attendee_ids,
        skill_ids,
        realized: raw.6,
    })
}

/// Set the Realized flag of a session.
pub fn set_session_realized(conn: &Connection, id: i64, realized: bool) -> Result<()> {
    conn.execute(
        "UPDATE training_sessions SET realized = ?2 WHERE id = ?1",
        params![id, realized],
    )?;
    Ok(())
}

// =============================================================================
// COMPETENCIES
// =============================================================================

/// Field values written by a reconciliation, shared between insert and
/// in-place update. Updating overwrites the evaluator designation and
/// both origin references, so stale counterparts cannot survive.
#[derive(Debug, Clone)]
pub struct CompetencyWrite {
    pub level: Level,
    pub evaluation_date: Option<DateTime<Utc>>,
    pub evaluator: Option<Evaluator>,
    pub session_id: Option<i64>,
    pub external_training_id: Option<i64>,
}

fn evaluator_columns(evaluator: Option<&Evaluator>) -> (Option<&'static str>, Option<i64>, Option<String>) {
    match evaluator {
        None => (None, None, None),
        Some(Evaluator::Internal { user_id }) => (Some("internal"), Some(*user_id), None),
        Some(Evaluator::External { name }) => (Some("external"), None, Some(name.clone())),
    }
}

fn evaluator_from_columns(
    kind: Option<String>,
    user_id: Option<i64>,
    name: Option<String>,
) -> Result<Option<Evaluator>> {
    match kind.as_deref() {
        None => Ok(None),
        Some("internal") => {
            let user_id = user_id.ok_or_else(|| {
                RecertError::InvalidEvidence("internal evaluator without user id".into())
            })?;
            Ok(Some(Evaluator::Internal { user_id }))
        }
        Some("external") => {
            let name = name.ok_or_else(|| {
                RecertError::InvalidEvidence("external evaluator without name".into())
            })?;
            Ok(Some(Evaluator::External { name }))
        }
        Some(other) => Err(RecertError::InvalidEvidence(format!(
            "unknown evaluator kind '{other}'"
        ))),
    }
}

/// Insert a new competency record with its context-set.
pub fn insert_competency(
    conn: &Connection,
    user_id: i64,
    skill_id: i64,
    write: &CompetencyWrite,
    contexts: &ContextSet,
) -> Result<i64> {
    let (kind, evaluator_user, evaluator_name) = evaluator_columns(write.evaluator.as_ref());
    conn.execute(
        "INSERT INTO competencies
             (user_id, skill_id, level, evaluation_date, evaluator_kind,
              evaluator_user_id, evaluator_name, session_id, external_training_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user_id,
            skill_id,
            write.level.as_str(),
            write.evaluation_date.map(ts_string),
            kind,
            evaluator_user,
            evaluator_name,
            write.session_id,
            write.external_training_id,
        ],
    )?;
    let competency_id = conn.last_insert_rowid();
    for context_id in contexts.iter() {
        conn.execute(
            "INSERT INTO competency_contexts (competency_id, context_id) VALUES (?1, ?2)",
            params![competency_id, context_id],
        )?;
    }
    Ok(competency_id)
}

/// Update an existing competency in place. The context-set is untouched:
/// in-place updates only happen when the incoming set equals the stored
/// one.
pub fn update_competency(conn: &Connection, competency_id: i64, write: &CompetencyWrite) -> Result<()> {
    let (kind, evaluator_user, evaluator_name) = evaluator_columns(write.evaluator.as_ref());
    let changed = conn.execute(
        "UPDATE competencies SET
             level = ?2, evaluation_date = ?3, evaluator_kind = ?4,
             evaluator_user_id = ?5, evaluator_name = ?6,
             session_id = ?7, external_training_id = ?8
         WHERE id = ?1",
        params![
            competency_id,
            write.level.as_str(),
            write.evaluation_date.map(ts_string),
            kind,
            evaluator_user,
            evaluator_name,
            write.session_id,
            write.external_training_id,
        ],
    )?;
    if changed == 0 {
        return Err(RecertError::CompetencyNotFound(competency_id));
    }
    Ok(())
}

/// Overwrite only the level of a competency.
pub fn update_competency_level(conn: &Connection, competency_id: i64, level: Level) -> Result<()> {
    let changed = conn.execute(
        "UPDATE competencies SET level = ?2 WHERE id = ?1",
        params![competency_id, level.as_str()],
    )?;
    if changed == 0 {
        return Err(RecertError::CompetencyNotFound(competency_id));
    }
    Ok(())
}

type RawCompetency = (
    i64,
    i64,
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<i64>,
    Option<String>,
    Option<i64>,
    Option<i64>,
);

fn read_raw_competency(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCompetency> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn competency_from_raw(conn: &Connection, raw: RawCompetency) -> Result<Competency> {
    let mut stmt =
        conn.prepare("SELECT context_id FROM competency_contexts WHERE competency_id = ?1")?;
    let contexts = stmt
        .query_map([raw.0], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<ContextSet>>()?;

    Ok(Competency {
        id: raw.0,
        user_id: raw.1,
        skill_id: raw.2,
        level: Level::parse(&raw.3)?,
        evaluation_date: parse_opt_ts(raw.4)?,
        evaluator: evaluator_from_columns(raw.5, raw.6, raw.7)?,
        session_id: raw.8,
        external_training_id: raw.9,
        contexts,
    })
}

const COMPETENCY_COLUMNS: &str = "id, user_id, skill_id, level, evaluation_date, evaluator_kind,
     evaluator_user_id, evaluator_name, session_id, external_training_id";

/// Fetch a competency by id.
pub fn get_competency(conn: &Connection, id: i64) -> Result<Competency> {
    let raw = conn
        .query_row(
            &format!("SELECT {COMPETENCY_COLUMNS} FROM competencies WHERE id = ?1"),
            [id],
            read_raw_competency,
        )
        .optional()?
        .ok_or(RecertError::CompetencyNotFound(id))?;
    competency_from_raw(conn, raw)
}

/// All competency records for one (user, skill) pair, the matcher's
/// input.
pub fn competencies_for(conn: &Connection, user_id: i64, skill_id: i64) -> Result<Vec<Competency>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPETENCY_COLUMNS} FROM competencies
         WHERE user_id = ?1 AND skill_id = ?2 ORDER BY id"
    ))?;
    let raws = stmt
        .query_map(params![user_id, skill_id], read_raw_competency)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter()
        .map(|raw| competency_from_raw(conn, raw))
        .collect()
}

/// All competency records of one user.
pub fn competencies_of_user(conn: &Connection, user_id: i64) -> Result<Vec<Competency>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPETENCY_COLUMNS} FROM competencies WHERE user_id = ?1 ORDER BY id"
    ))?;
    let raws = stmt
        .query_map([user_id], read_raw_competency)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter()
        .map(|raw| competency_from_raw(conn, raw))
        .collect()
}

/// Every competency record in the store, for reporting projections.
pub fn all_competencies(conn: &Connection) -> Result<Vec<Competency>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPETENCY_COLUMNS} FROM competencies ORDER BY id"
    ))?;
    let raws = stmt
        .query_map([], read_raw_competency)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter()
        .map(|raw| competency_from_raw(conn, raw))
        .collect()
}

// =============================================================================
// PRACTICE EVENTS
// =============================================================================

/// Insert a practice event covering the given skills.
pub fn insert_practice_event(
    conn: &Connection,
    user_id: i64,
    practice_date: DateTime<Utc>,
    skill_ids: &[i64],
    notes: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO practice_events (user_id, practice_date, notes) VALUES (?1, ?2, ?3)",
        params![user_id, ts_string(practice_date), notes],
    )?;
    let event_id = conn.last_insert_rowid();
    for skill_id in skill_ids {
        conn.execute(
            "INSERT INTO practice_event_skills (event_id, skill_id) VALUES (?1, ?2)",
            params![event_id, skill_id],
        )?;
    }
    Ok(event_id)
}

/// Whether an event for this exact (user, date) already references the
/// skill: the idempotency check for self-declared practice.
pub fn practice_event_exists(
    conn: &Connection,
    user_id: i64,
    practice_date: DateTime<Utc>,
    skill_id: i64,
) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM practice_events e
             JOIN practice_event_skills s ON s.event_id = e.id
             WHERE e.user_id = ?1 AND e.practice_date = ?2 AND s.skill_id = ?3",
            params![user_id, ts_string(practice_date), skill_id],
            |_| Ok(true),
        )
        .optional()?;
    Ok(found.unwrap_or(false))
}

/// All practice dates of one user for one skill.
pub fn practice_dates_for(conn: &Connection, user_id: i64, skill_id: i64) -> Result<Vec<DateTime<Utc>>> {
    let mut stmt = conn.prepare(
        "SELECT e.practice_date FROM practice_events e
         JOIN practice_event_skills s ON s.event_id = e.id
         WHERE e.user_id = ?1 AND s.skill_id = ?2",
    )?;
    let raws = stmt
        .query_map(params![user_id, skill_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.iter().map(|raw| parse_ts(raw)).collect()
}

// =============================================================================
// EXTERNAL TRAININGS
// =============================================================================

/// Insert an external training with its claims.
pub fn insert_external_training(
    conn: &Connection,
    user_id: i64,
    trainer_name: Option<&str>,
    date: DateTime<Utc>,
    claims: &[EvidenceClaim],
) -> Result<i64> {
    conn.execute(
        "INSERT INTO external_trainings (user_id, trainer_name, date) VALUES (?1, ?2, ?3)",
        params![user_id, trainer_name, ts_string(date)],
    )?;
    let training_id = conn.last_insert_rowid();
    for claim in claims {
        conn.execute(
            "INSERT INTO external_claims (training_id, skill_id, level, practice_date, wants_tutor)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                training_id,
                claim.skill_id,
                claim.level.as_str(),
                claim.practice_date.map(ts_string),
                claim.wants_tutor,
            ],
        )?;
        for context_id in claim.contexts.iter() {
            conn.execute(
                "INSERT INTO external_claim_contexts (training_id, skill_id, context_id)
                 VALUES (?1, ?2, ?3)",
                params![training_id, claim.skill_id, context_id],
            )?;
        }
    }
    Ok(training_id)
}

/// Fetch an external training by id, including claims and their
/// context-sets.
pub fn get_external_training(conn: &Connection, id: i64) -> Result<ExternalTraining> {
    let raw = conn
        .query_row(
            "SELECT id, user_id, trainer_name, date, status, validator_id
             FROM external_trainings WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                ))
            },
        )
        .optional()?
        .ok_or(RecertError::TrainingNotFound(id))?;

    let mut stmt = conn.prepare(
        "SELECT skill_id, level, practice_date, wants_tutor
         FROM external_claims WHERE training_id = ?1 ORDER BY skill_id",
    )?;
    let raw_claims = stmt
        .query_map([id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut claims = Vec::with_capacity(raw_claims.len());
    for (skill_id, level, practice_date, wants_tutor) in raw_claims {
        let mut stmt = conn.prepare(
            "SELECT context_id FROM external_claim_contexts
             WHERE training_id = ?1 AND skill_id = ?2",
        )?;
        let contexts = stmt
            .query_map(params![id, skill_id], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<ContextSet>>()?;
        claims.push(EvidenceClaim {
            skill_id,
            level: Level::parse(&level)?,
            contexts,
            practice_date: parse_opt_ts(practice_date)?,
            wants_tutor,
        });
    }

    Ok(ExternalTraining {
        id: raw.0,
        user_id: raw.1,
        trainer_name: raw.2,
        date: parse_ts(&raw.3)?,
        status: ExternalTrainingStatus::parse(&raw.4)?,
        validator_id: raw.5,
        claims,
    })
}

/// Write the terminal status of an external training.
pub fn set_external_training_status(
    conn: &Connection,
    id: i64,
    status: ExternalTrainingStatus,
    validator_id: i64,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE external_trainings SET status = ?2, validator_id = ?3 WHERE id = ?1",
        params![id, status.as_str(), validator_id],
    )?;
    if changed == 0 {
        return Err(RecertError::TrainingNotFound(id));
    }
    Ok(())
}

/// Count of external trainings awaiting validation.
pub fn count_pending_external_trainings(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM external_trainings WHERE status = 'pending'",
        [],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or(0))
}

// =============================================================================
// CONTINUOUS TRAINING
// =============================================================================

/// Insert a continuing-education event, returning its id.
pub fn insert_ct_event(
    conn: &Connection,
    title: &str,
    date: DateTime<Utc>,
    mode: DeliveryMode,
    duration_hours: f64,
) -> Result<i64> {
    if duration_hours < 0.0 || !duration_hours.is_finite() {
        return Err(RecertError::InvalidEvidence(format!(
            "event duration must be a non-negative hour count, got {duration_hours}"
        )));
    }
    conn.execute(
        "INSERT INTO continuous_training_events (title, date, mode, duration_hours)
         VALUES (?1, ?2, ?3, ?4)",
        params![title, ts_string(date), mode.as_str(), duration_hours],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetch a continuing-education event by id.
pub fn get_ct_event(conn: &Connection, id: i64) -> Result<ContinuousTrainingEvent> {
    let raw = conn
        .query_row(
            "SELECT id, title, date, mode, duration_hours
             FROM continuous_training_events WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            },
        )
        .optional()?
        .ok_or(RecertError::EventNotFound(id))?;

    Ok(ContinuousTrainingEvent {
        id: raw.0,
        title: raw.1,
        date: parse_ts(&raw.2)?,
        mode: DeliveryMode::parse(&raw.3)?,
        duration_hours: raw.4,
    })
}

/// Record a user's attendance submission for an event.
///
/// One record per (user, event): resubmission is a duplicate, reported as
/// such rather than silently inserting.
pub fn submit_attendance(conn: &Connection, user_id: i64, event_id: i64) -> Result<i64> {
    get_user(conn, user_id)?;
    get_ct_event(conn, event_id)?;

    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM continuous_training_records WHERE user_id = ?1 AND event_id = ?2",
            params![user_id, event_id],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Err(RecertError::DuplicateSubmission(format!(
            "user {user_id} already submitted attendance {id} for event {event_id}"
        )));
    }

    conn.execute(
        "INSERT INTO continuous_training_records (user_id, event_id) VALUES (?1, ?2)",
        params![user_id, event_id],
    )?;
    Ok(conn.last_insert_rowid())
}

fn get_ct_record(conn: &Connection, id: i64) -> Result<ContinuousTrainingRecord> {
    let raw = conn
        .query_row(
            "SELECT id, user_id, event_id, status, validated_hours
             FROM continuous_training_records WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                ))
            },
        )
        .optional()?
        .ok_or(RecertError::EventNotFound(id))?;

    Ok(ContinuousTrainingRecord {
        id: raw.0,
        user_id: raw.1,
        event_id: raw.2,
        status: AttendanceStatus::parse(&raw.3)?,
        validated_hours: raw.4,
    })
}

/// Approve an attendance record, granting `hours` or the event's nominal
/// duration when none is supplied. Pending records only.
pub fn approve_attendance(conn: &Connection, record_id: i64, hours: Option<f64>) -> Result<f64> {
    let record = get_ct_record(conn, record_id)?;
    if record.status.is_terminal() {
        return Err(RecertError::DuplicateSubmission(format!(
            "attendance {record_id} is already {}",
            record.status.as_str()
        )));
    }
    if let Some(h) = hours {
        if h < 0.0 || !h.is_finite() {
            return Err(RecertError::InvalidEvidence(format!(
                "validated hours must be a non-negative count, got {h}"
            )));
        }
    }
    let granted = match hours {
        Some(h) => h,
        None => get_ct_event(conn, record.event_id)?.duration_hours,
    };
    conn.execute(
        "UPDATE continuous_training_records
         SET status = 'approved', validated_hours = ?2 WHERE id = ?1",
        params![record_id, granted],
    )?;
    Ok(granted)
}

/// Reject an attendance record. Pending records only.
pub fn reject_attendance(conn: &Connection, record_id: i64) -> Result<()> {
    let record = get_ct_record(conn, record_id)?;
    if record.status.is_terminal() {
        return Err(RecertError::DuplicateSubmission(format!(
            "attendance {record_id} is already {}",
            record.status.as_str()
        )));
    }
    conn.execute(
        "UPDATE continuous_training_records SET status = 'rejected' WHERE id = ?1",
        [record_id],
    )?;
    Ok(())
}

/// All attendances of one user, joined to their events.
pub fn attendances_for(conn: &Connection, user_id: i64) -> Result<Vec<Attendance>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.user_id, r.event_id, r.status, r.validated_hours,
                e.id, e.title, e.date, e.mode, e.duration_hours
         FROM continuous_training_records r
         JOIN continuous_training_events e ON e.id = r.event_id
         WHERE r.user_id = ?1
         ORDER BY e.date",
    )?;
    let raws = stmt
        .query_map([user_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, f64>(9)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    raws.into_iter()
        .map(|raw| {
            Ok(Attendance {
                record: ContinuousTrainingRecord {
                    id: raw.0,
                    user_id: raw.1,
                    event_id: raw.2,
                    status: AttendanceStatus::parse(&raw.3)?,
                    validated_hours: raw.4,
                },
                event: ContinuousTrainingEvent {
                    id: raw.5,
                    title: raw.6,
                    date: parse_ts(&raw.7)?,
                    mode: DeliveryMode::parse(&raw.8)?,
                    duration_hours: raw.9,
                },
            })
        })
        .collect()
}

/// Count of attendance records awaiting validation.
pub fn count_pending_attendances(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM continuous_training_records WHERE status = 'pending'",
        [],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or(0))
}
