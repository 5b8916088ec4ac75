use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::accumulation::AccumulationMode;
use crate::analytes::{DISSOLVED_ORGANIC_NITROGEN, TOTAL_KJELDAHL_NITROGEN};
use crate::calendar::DuplicateDates;
use crate::coercion::CellPolicy;
use crate::error::{PipelineError, Result};

pub const CONFIG_ENV_VAR: &str = "DELTABC_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaConfig {
    pub paths: PathsConfig,
    pub reformat: ReformatConfig,
    pub reconcile: ReconcileConfig,
    /// Directory relative paths resolve against; the config file's directory when loaded from disk.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub sources_dir: PathBuf,
    pub intermediate_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sources_dir: PathBuf::from("../sources"),
            intermediate_dir: PathBuf::from("../outputs/intermediate"),
        }
    }
}

/// Inputs and outputs of the wide-to-long reformat. All files live in `sources_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReformatConfig {
    pub input: String,
    pub lab_output: String,
    pub field_output: String,
    pub program_label: String,
}

impl Default for ReformatConfig {
    fn default() -> Self {
        Self {
            input: "SACSJ_delta_water_quality_2012_2018.csv".to_string(),
            lab_output: "EMP_Lab_updated.csv".to_string(),
            field_output: "EMP_Field_updated.csv".to_string(),
            program_label: "EMP Monitoring".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(deserialize_with = "config_date::deserialize")]
    pub start: NaiveDate,
    #[serde(deserialize_with = "config_date::deserialize")]
    pub end: NaiveDate,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            start: ymd(2016, 10, 1),
            end: ymd(2018, 1, 1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Long-term survey export, in `sources_dir`.
    pub water_quality: String,
    /// Station metadata table, in `sources_dir`.
    pub stations: String,
    pub calendar: CalendarConfig,
    pub accumulation_mode: AccumulationMode,
    pub duplicate_dates: DuplicateDates,
    pub targets: Vec<TargetConfig>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            water_quality: "SACSJ_delta_water_quality_2000_2018.csv".to_string(),
            stations: "EMP_Discrete_Water_Quality_Stations.csv".to_string(),
            calendar: CalendarConfig::default(),
            accumulation_mode: AccumulationMode::default(),
            duplicate_dates: DuplicateDates::default(),
            targets: default_targets(),
        }
    }
}

/// One river inflow whose nutrient series is assembled from surrogate stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    /// Flow export, in `sources_dir`.
    pub flow: String,
    /// Required when the flow table has more than one column after `Date`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_column: Option<String>,
    /// Accumulation file, in `intermediate_dir`.
    pub accumulation: String,
    /// Concatenated in this order.
    pub segments: Vec<SegmentConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub station: String,
    #[serde(default)]
    pub window: SegmentWindow,
    #[serde(default)]
    pub default_policy: CellPolicy,
    /// Per-analyte overrides of `default_policy`, keyed by survey column name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub coercion: BTreeMap<String, CellPolicy>,
}

impl SegmentConfig {
    pub fn new(station: impl Into<String>, window: SegmentWindow) -> Self {
        Self {
            station: station.into(),
            window,
            default_policy: CellPolicy::default(),
            coercion: BTreeMap::new(),
        }
    }

    pub fn with_policy(mut self, column: &str, policy: CellPolicy) -> Self {
        self.coercion.insert(column.to_string(), policy);
        self
    }

    pub fn policy_for(&self, column: &str) -> CellPolicy {
        self.coercion
            .get(column)
            .copied()
            .unwrap_or(self.default_policy)
    }
}

/// Which of a station's rows a segment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SegmentWindow {
    #[default]
    Full,
    /// The last `rows` rows in file order.
    Tail { rows: usize },
    /// Rows dated within the bounds, both inclusive.
    DateRange {
        #[serde(
            default,
            deserialize_with = "config_date::deserialize_option",
            skip_serializing_if = "Option::is_none"
        )]
        start: Option<NaiveDate>,
        #[serde(
            default,
            deserialize_with = "config_date::deserialize_option",
            skip_serializing_if = "Option::is_none"
        )]
        end: Option<NaiveDate>,
    },
}

/// Dates in the config file may be bare TOML dates (`2016-10-01`) or strings.
mod config_date {
    use chrono::NaiveDate;
    use deltabc_parser::parse_calendar_date;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    fn from_value<E: Error>(value: toml::Value) -> Result<NaiveDate, E> {
        let text = match value {
            toml::Value::String(text) => text,
            toml::Value::Datetime(datetime) => datetime.to_string(),
            other => {
                return Err(E::custom(format!(
                    "expected a date, found {}",
                    other.type_str()
                )))
            }
        };
        parse_calendar_date(&text).ok_or_else(|| E::custom(format!("invalid date '{text}'")))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        from_value(toml::Value::deserialize(deserializer)?)
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        Option::<toml::Value>::deserialize(deserializer)?
            .map(from_value)
            .transpose()
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn default_targets() -> Vec<TargetConfig> {
    vec![
        TargetConfig {
            name: "sacramento".to_string(),
            flow: "sac_flow.csv".to_string(),
            flow_column: None,
            accumulation: "false_sac.csv".to_string(),
            segments: vec![
                SegmentConfig::new("D24", SegmentWindow::Full),
                SegmentConfig::new("D22", SegmentWindow::Tail { rows: 12 })
                    .with_policy(DISSOLVED_ORGANIC_NITROGEN, CellPolicy::ZeroFill),
            ],
        },
        TargetConfig {
            name: "san_joaquin".to_string(),
            flow: "sj_flow.csv".to_string(),
            flow_column: None,
            accumulation: "false_sj.csv".to_string(),
            segments: vec![SegmentConfig::new("D26", SegmentWindow::Full)
                .with_policy(TOTAL_KJELDAHL_NITROGEN, CellPolicy::ZeroFill)
                .with_policy(DISSOLVED_ORGANIC_NITROGEN, CellPolicy::ZeroFill)],
        },
    ]
}

impl DeltaConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DeltaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Loads `path` when given, otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|err| PipelineError::Config(format!("failed to serialize config: {err}")))
    }

    pub fn validate(&self) -> Result<()> {
        let calendar = self.reconcile.calendar;
        if calendar.start > calendar.end {
            return Err(PipelineError::InvalidCalendar {
                start: calendar.start,
                end: calendar.end,
            });
        }

        let mut names = HashSet::new();
        let mut accumulations = HashSet::new();
        for target in &self.reconcile.targets {
            if !names.insert(target.name.as_str()) {
                return Err(PipelineError::Config(format!(
                    "target '{}' is defined more than once",
                    target.name
                )));
            }
            if !accumulations.insert(self.intermediate_path(&target.accumulation)) {
                return Err(PipelineError::Config(format!(
                    "target '{}' shares accumulation file '{}' with another target",
                    target.name, target.accumulation
                )));
            }
            if target.segments.is_empty() {
                return Err(PipelineError::Config(format!(
                    "target '{}' has no surrogate segments",
                    target.name
                )));
            }
            for segment in &target.segments {
                match segment.window {
                    SegmentWindow::Tail { rows: 0 } => {
                        return Err(PipelineError::Config(format!(
                            "target '{}' segment {} has an empty tail window",
                            target.name, segment.station
                        )));
                    }
                    SegmentWindow::DateRange {
                        start: Some(start),
                        end: Some(end),
                    } if start > end => {
                        return Err(PipelineError::Config(format!(
                            "target '{}' segment {} window starts {start} after it ends {end}",
                            target.name, segment.station
                        )));
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn resolve(&self, dir: &Path, file: &str) -> PathBuf {
        let joined = dir.join(file);
        match &self.base_dir {
            Some(base) if joined.is_relative() => base.join(joined),
            _ => joined,
        }
    }

    pub fn source_path(&self, file: &str) -> PathBuf {
        self.resolve(&self.paths.sources_dir, file)
    }

    pub fn intermediate_path(&self, file: &str) -> PathBuf {
        self.resolve(&self.paths.intermediate_dir, file)
    }

    pub fn target(&self, name: &str) -> Option<&TargetConfig> {
        self.reconcile
            .targets
            .iter()
            .find(|target| target.name == name)
    }
}
