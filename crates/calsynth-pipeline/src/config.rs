use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use calsynth_core::StatusPolicy;
use calsynth_generate::{GenerateConfig, RsvpWeights};

use crate::errors::PipelineError;

/// Content generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Model name for the external endpoint, or `stub` for the offline
    /// deterministic provider.
    pub model: String,
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            model: "stub".to_string(),
            max_retries: 3,
            backoff_ms: 500,
        }
    }
}

/// Transformer settings; the date window itself derives from
/// `back_days`/`ahead_days` around the resolved base date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSettings {
    pub max_events_per_day: usize,
    pub business_start_hour: u32,
    pub business_end_hour: u32,
    pub lead_days_min: i64,
    pub lead_days_max: i64,
    pub required_weights: RsvpWeights,
    pub optional_weights: RsvpWeights,
    pub distribution_tolerance: f64,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            max_events_per_day: 6,
            business_start_hour: 8,
            business_end_hour: 18,
            lead_days_min: 7,
            lead_days_max: 45,
            required_weights: RsvpWeights::required(),
            optional_weights: RsvpWeights::optional(),
            distribution_tolerance: 0.15,
        }
    }
}

/// Full pipeline configuration, loadable from `calsynth.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub seed: u64,
    /// Limit the organization catalog to the first N people.
    pub users: Option<usize>,
    /// Days of history before the base date.
    pub back_days: i64,
    /// Days of future after the base date.
    pub ahead_days: i64,
    /// Base date override; defaults to the local date at run time. Pin it
    /// for reproducible runs.
    pub today: Option<NaiveDate>,
    /// Session tag override; defaults to a fresh `session_<uuid>`.
    pub session_id: Option<String>,
    pub output_dir: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub sql_file: PathBuf,
    pub mysql_sql_file: PathBuf,
    pub db_file: PathBuf,
    /// Directory with catalog overrides; embedded catalogs otherwise.
    pub seed_data_dir: Option<PathBuf>,
    pub status_policy: StatusPolicy,
    pub content: ContentConfig,
    pub generate: GenerateSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            users: None,
            back_days: 30,
            ahead_days: 180,
            today: None,
            session_id: None,
            output_dir: PathBuf::from("output"),
            checkpoint_dir: PathBuf::from("output/checkpoints"),
            sql_file: PathBuf::from("calendar_data_final.sql"),
            mysql_sql_file: PathBuf::from("calendar_data_final.mysql.sql"),
            db_file: PathBuf::from("calendar.db"),
            seed_data_dir: None,
            status_policy: StatusPolicy::default(),
            content: ContentConfig::default(),
            generate: GenerateSettings::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|err| {
            PipelineError::Config(format!("failed to parse {}: {err}", path.display()))
        })
    }

    /// Load the config file if present, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, PipelineError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Base date for this run.
    pub fn resolved_today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Concrete transformer config for the resolved base date.
    pub fn generate_config(&self, today: NaiveDate) -> GenerateConfig {
        let mut config = GenerateConfig::for_window(
            today - chrono::Duration::days(self.back_days),
            today + chrono::Duration::days(self.ahead_days),
            today.and_hms_opt(12, 0, 0).unwrap_or_default(),
        );
        config.max_events_per_day = self.generate.max_events_per_day;
        config.business_start_hour = self.generate.business_start_hour;
        config.business_end_hour = self.generate.business_end_hour;
        config.lead_days_min = self.generate.lead_days_min;
        config.lead_days_max = self.generate.lead_days_max;
        config.required_weights = self.generate.required_weights;
        config.optional_weights = self.generate.optional_weights;
        config.distribution_tolerance = self.generate.distribution_tolerance;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_overrides_merge_onto_defaults() {
        let parsed: PipelineConfig = toml::from_str(
            r#"
            seed = 7
            users = 5
            today = "2024-01-15"

            [content]
            model = "gpt-4o-mini"

            [generate]
            max_events_per_day = 3
            "#,
        )
        .unwrap();
        assert_eq!(parsed.seed, 7);
        assert_eq!(parsed.users, Some(5));
        assert_eq!(parsed.content.model, "gpt-4o-mini");
        assert_eq!(parsed.content.max_retries, 3);
        assert_eq!(parsed.generate.max_events_per_day, 3);
        assert_eq!(parsed.back_days, 30);
    }

    #[test]
    fn generate_config_derives_the_window() {
        let mut config = PipelineConfig::default();
        config.back_days = 7;
        config.ahead_days = 7;
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let generate = config.generate_config(today);
        assert_eq!(
            generate.window_start,
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        );
        assert_eq!(
            generate.window_end,
            NaiveDate::from_ymd_opt(2024, 1, 22).unwrap()
        );
    }
}
