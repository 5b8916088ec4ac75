use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::series::{DailyRecord, DerivedNutrientSeries, FlowSeries, ReconciledDailySeries};

/// How a calendar day is joined when the right-hand series has that date more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateDates {
    /// One output row per match, in series order.
    KeepAll,
    /// Only the match that comes last in series order.
    #[default]
    PreferLater,
}

impl DuplicateDates {
    fn pick<'a>(&self, matches: &'a [usize]) -> &'a [usize] {
        match self {
            DuplicateDates::KeepAll => matches,
            DuplicateDates::PreferLater => &matches[matches.len().saturating_sub(1)..],
        }
    }
}

/// Every day from `start` to `end`, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCalendar {
    start: NaiveDate,
    end: NaiveDate,
}

impl DailyCalendar {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PipelineError::InvalidCalendar { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |day| *day <= self.end)
    }

    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }
}

fn index_by_date(dates: impl Iterator<Item = NaiveDate>) -> HashMap<NaiveDate, Vec<usize>> {
    let mut index: HashMap<NaiveDate, Vec<usize>> = HashMap::new();
    for (idx, date) in dates.enumerate() {
        index.entry(date).or_default().push(idx);
    }
    index
}

/// Left-joins the calendar with flow, then with nutrients. Days without a
/// match keep missing values; no calendar day is ever dropped.
pub fn reconcile_daily(
    calendar: &DailyCalendar,
    flow: &FlowSeries,
    nutrients: &DerivedNutrientSeries,
    duplicates: DuplicateDates,
) -> ReconciledDailySeries {
    let flow_index = index_by_date(flow.dates.iter().copied());
    let nutrient_index = index_by_date(nutrients.samples.iter().map(|sample| sample.date));

    let mut records = Vec::with_capacity(calendar.len());
    for day in calendar.days() {
        let flows: Vec<Option<f64>> = match flow_index.get(&day) {
            Some(matches) => duplicates
                .pick(matches)
                .iter()
                .map(|idx| flow.flow[*idx])
                .collect(),
            None => vec![None],
        };

        for flow_value in flows {
            match nutrient_index.get(&day) {
                Some(matches) => {
                    for idx in duplicates.pick(matches) {
                        let sample = &nutrients.samples[*idx];
                        records.push(DailyRecord {
                            date: day,
                            flow: flow_value,
                            ammonia: sample.ammonia,
                            nitrate_nitrite: sample.nitrate_nitrite,
                            orthophosphate: sample.orthophosphate,
                        });
                    }
                }
                None => records.push(DailyRecord {
                    flow: flow_value,
                    ..DailyRecord::empty(day)
                }),
            }
        }
    }

    ReconciledDailySeries { records }
}
