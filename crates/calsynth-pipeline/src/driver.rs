use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use calsynth_content::{ContentProvider, prompts};
use calsynth_core::{
    Calendar, CalendarShare, Dataset, Event, SqlDialect, TableCounts, User, UserProfile,
    validate_dataset,
};
use calsynth_emit::{SqlEmitter, schema_ddl, write_dataset_csv};
use calsynth_generate::{
    CheckReport, SeedCatalog, assign_attendees, build_calendars, build_shares, build_users,
    events_from_drafts, generate_work_events, run_checks,
};

use crate::checkpoint::CheckpointStore;
use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::execute::{ExecutionSummary, execute_sqlite};
use crate::step::Step;

/// Checkpoint payload of the `dataframes` step.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Frames {
    users: Vec<User>,
    calendars: Vec<Calendar>,
    shares: Vec<CalendarShare>,
}

/// What to do with one step on this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Compute and checkpoint.
    Run,
    /// Use the existing checkpoint.
    Reuse,
    /// Step was skipped; its checkpoint must already exist.
    LoadOnly,
}

fn plan_action(step: Step, skip: &[Step], force: &[Step], exists: bool) -> Action {
    if skip.contains(&step) {
        Action::LoadOnly
    } else if force.contains(&step) || !exists {
        Action::Run
    } else {
        Action::Reuse
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub today: NaiveDate,
    pub session_id: String,
    pub counts: TableCounts,
    pub sql_files: Vec<PathBuf>,
    pub execution: Option<ExecutionSummary>,
}

/// Sequences the seven steps with checkpoint reuse, skip and force
/// semantics.
pub struct Pipeline {
    config: PipelineConfig,
    store: CheckpointStore,
    provider: Arc<dyn ContentProvider>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        provider: Arc<dyn ContentProvider>,
    ) -> Result<Self, PipelineError> {
        let store = CheckpointStore::new(&config.checkpoint_dir)?;
        Ok(Self {
            config,
            store,
            provider,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self, skip: &[Step], force: &[Step]) -> Result<RunSummary, PipelineError> {
        let today = self.config.resolved_today();
        let generate_config = self.config.generate_config(today);
        let session_id = self
            .config
            .session_id
            .clone()
            .unwrap_or_else(|| format!("session_{}", uuid::Uuid::new_v4().simple()));
        let seed = self.config.seed;

        info!(
            %today,
            seed,
            session_id = %session_id,
            skip = ?skip.iter().map(Step::as_str).collect::<Vec<_>>(),
            force = ?force.iter().map(Step::as_str).collect::<Vec<_>>(),
            "pipeline started"
        );

        let catalog = self.load_catalog()?;

        // Step 1: profiles (content generator).
        let profiles: Vec<UserProfile> =
            match plan_action(Step::Profiles, skip, force, self.store.exists(Step::Profiles)) {
                Action::Run => {
                    info!(people = catalog.organization.len(), "generating profiles");
                    let mut profiles = Vec::with_capacity(catalog.organization.len());
                    for person in &catalog.organization {
                        let profile = self.provider.generate_profile(person).await?;
                        profiles.push(profile);
                    }
                    self.store.save(Step::Profiles, &profiles)?;
                    profiles
                }
                Action::Reuse | Action::LoadOnly => self.require(Step::Profiles)?,
            };

        // Step 2: users/calendars/shares tables.
        let frames: Frames = match plan_action(
            Step::Dataframes,
            skip,
            force,
            self.store.exists(Step::Dataframes),
        ) {
            Action::Run => {
                let users = build_users(&profiles, generate_config.generated_at)?;
                let calendars = build_calendars(&users, generate_config.generated_at);
                let shares = build_shares(&users, &profiles, generate_config.generated_at);
                let frames = Frames {
                    users,
                    calendars,
                    shares,
                };
                self.store.save(Step::Dataframes, &frames)?;
                frames
            }
            Action::Reuse | Action::LoadOnly => self.require(Step::Dataframes)?,
        };

        // Step 3: templated work events.
        let work_events: Vec<Event> = match plan_action(
            Step::WorkEvents,
            skip,
            force,
            self.store.exists(Step::WorkEvents),
        ) {
            Action::Run => {
                let mut events = Vec::new();
                for user in &frames.users {
                    events.extend(generate_work_events(
                        user.id,
                        &catalog.templates,
                        &generate_config,
                        seed,
                    )?);
                }
                info!(events = events.len(), "work events generated");
                self.store.save(Step::WorkEvents, &events)?;
                events
            }
            Action::Reuse | Action::LoadOnly => self.require(Step::WorkEvents)?,
        };

        // Step 4: personal events (content generator).
        let personal_events: Vec<Event> = match plan_action(
            Step::PersonalEvents,
            skip,
            force,
            self.store.exists(Step::PersonalEvents),
        ) {
            Action::Run => {
                let mut events = Vec::new();
                for (index, profile) in profiles.iter().enumerate() {
                    let user_id = index as i64 + 1;
                    let user_work: Vec<Event> = work_events
                        .iter()
                        .filter(|event| event.user_id == user_id)
                        .cloned()
                        .collect();
                    let summary = prompts::work_schedule_summary(&user_work);
                    let drafts = self
                        .provider
                        .generate_personal_events(profile, &summary)
                        .await?;
                    events.extend(events_from_drafts(
                        user_id,
                        &drafts,
                        &generate_config,
                        seed,
                    )?);
                }
                info!(events = events.len(), "personal events generated");
                self.store.save(Step::PersonalEvents, &events)?;
                events
            }
            Action::Reuse | Action::LoadOnly => self.require(Step::PersonalEvents)?,
        };

        // Step 5: attendee RSVP assignment.
        let mut all_events = work_events;
        all_events.extend(personal_events);
        let attendees = match plan_action(
            Step::Attendees,
            skip,
            force,
            self.store.exists(Step::Attendees),
        ) {
            Action::Run => {
                let attendees = assign_attendees(&all_events, &profiles, &generate_config, seed);
                info!(attendees = attendees.len(), "attendees assigned");
                self.store.save(Step::Attendees, &attendees)?;
                attendees
            }
            Action::Reuse | Action::LoadOnly => self.require(Step::Attendees)?,
        };

        let dataset = Dataset {
            users: frames.users,
            calendars: frames.calendars,
            shares: frames.shares,
            events: all_events,
            attendees,
        };
        let counts = dataset.counts();

        // Step 6: CSV + SQL artifacts.
        let mut sql_files = Vec::new();
        if !skip.contains(&Step::Sql) {
            let issues = validate_dataset(&dataset);
            if !issues.is_empty() {
                warn!(issues = issues.len(), "dataset has structural issues");
            }

            write_dataset_csv(&self.config.output_dir, &dataset)?;

            let sqlite_script =
                SqlEmitter::new(SqlDialect::Sqlite, today, self.config.status_policy)
                    .emit(&dataset)?;
            std::fs::write(&self.config.sql_file, &sqlite_script)?;
            sql_files.push(self.config.sql_file.clone());

            let mysql_script = SqlEmitter::new(SqlDialect::MySql, today, self.config.status_policy)
                .emit(&dataset)?;
            std::fs::write(&self.config.mysql_sql_file, &mysql_script)?;
            sql_files.push(self.config.mysql_sql_file.clone());

            info!(files = sql_files.len(), "sql scripts emitted");
        } else {
            info!("skipping sql emission");
        }

        // Step 7: load the SQLite script.
        let mut execution = None;
        if !skip.contains(&Step::ExecuteSql) {
            if !self.config.sql_file.exists() {
                return Err(PipelineError::MissingCheckpoint { step: Step::Sql });
            }
            let script = std::fs::read_to_string(&self.config.sql_file)?;
            let summary = execute_sqlite(
                &self.config.db_file,
                schema_ddl(SqlDialect::Sqlite),
                &script,
                today,
                &session_id,
            )
            .await?;
            execution = Some(summary);
        } else {
            info!("skipping sql execution");
        }

        info!(
            users = counts.users,
            calendars = counts.calendars,
            shares = counts.shares,
            events = counts.events,
            attendees = counts.attendees,
            "pipeline completed"
        );

        Ok(RunSummary {
            today,
            session_id,
            counts,
            sql_files,
            execution,
        })
    }

    /// Dataset re-assembled from checkpoints; used by the advisory checks
    /// and ad-hoc re-emission.
    pub fn load_dataset(&self) -> Result<Dataset, PipelineError> {
        let frames: Frames = self.require(Step::Dataframes)?;
        let work: Vec<Event> = self.require(Step::WorkEvents)?;
        let personal: Vec<Event> = self.require(Step::PersonalEvents)?;
        let attendees = self.require(Step::Attendees)?;

        let mut events = work;
        events.extend(personal);
        Ok(Dataset {
            users: frames.users,
            calendars: frames.calendars,
            shares: frames.shares,
            events,
            attendees,
        })
    }

    /// Advisory data-quality report over the checkpointed dataset.
    pub fn quality_report(&self) -> Result<CheckReport, PipelineError> {
        let dataset = self.load_dataset()?;
        let today = self.config.resolved_today();
        Ok(run_checks(&dataset, &self.config.generate_config(today)))
    }

    /// Re-emit the SQL script for one dialect from checkpoints.
    pub fn emit_script(&self, dialect: SqlDialect) -> Result<String, PipelineError> {
        let dataset = self.load_dataset()?;
        let today = self.config.resolved_today();
        Ok(SqlEmitter::new(dialect, today, self.config.status_policy).emit(&dataset)?)
    }

    fn load_catalog(&self) -> Result<SeedCatalog, PipelineError> {
        let catalog = match &self.config.seed_data_dir {
            Some(dir) => SeedCatalog::from_dir(dir)?,
            None => SeedCatalog::embedded()?,
        };
        Ok(match self.config.users {
            Some(count) => catalog.truncated(count),
            None => catalog,
        })
    }

    fn require<T: serde::de::DeserializeOwned>(&self, step: Step) -> Result<T, PipelineError> {
        self.store
            .load(step)?
            .ok_or(PipelineError::MissingCheckpoint { step })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_follow_skip_force_and_checkpoint_state() {
        let none: [Step; 0] = [];
        assert_eq!(
            plan_action(Step::Profiles, &none, &none, false),
            Action::Run
        );
        assert_eq!(
            plan_action(Step::Profiles, &none, &none, true),
            Action::Reuse
        );
        assert_eq!(
            plan_action(Step::Profiles, &none, &[Step::Profiles], true),
            Action::Run
        );
        assert_eq!(
            plan_action(Step::Profiles, &[Step::Profiles], &none, false),
            Action::LoadOnly
        );
        // Skip wins over force.
        assert_eq!(
            plan_action(Step::Profiles, &[Step::Profiles], &[Step::Profiles], true),
            Action::LoadOnly
        );
    }
}
