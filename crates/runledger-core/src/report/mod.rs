//! Report assembly: time filter → section queries → text or JSON.

pub mod filter;
pub mod queries;
pub mod table;

use crate::config::ReportSettings;
use crate::errors::Result;
use crate::model::RUN_DATE_FORMAT;
use crate::storage::Store;
use chrono::NaiveDateTime;
use filter::{Predicate, TimeFilter};
use queries::exceptions::{self, ExceptionNameRow, TraceBucketRow};
use queries::failures::{self, AlwaysFailingRow, GroupFailureRateRow, TopFailingRow};
use queries::runs::{self, FailuresPerRunRow, RunCountRow, StatusPerRunRow};
use queries::timing::{self, SlowTestRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use table::{Table, BANNER};
use tracing::debug;

/// Report sections, declared in rendering order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SectionId {
    RunCount,
    StatusPerRun,
    TopFailingTests,
    TestsAlwaysFailing,
    MostFrequentExceptionNames,
    MostFrequentExceptionTraces,
    SlowestTests,
    AvgFailuresPerGroup,
    FailuresPerRun,
}

impl SectionId {
    pub const ALL: [SectionId; 9] = [
        SectionId::RunCount,
        SectionId::StatusPerRun,
        SectionId::TopFailingTests,
        SectionId::TestsAlwaysFailing,
        SectionId::MostFrequentExceptionNames,
        SectionId::MostFrequentExceptionTraces,
        SectionId::SlowestTests,
        SectionId::AvgFailuresPerGroup,
        SectionId::FailuresPerRun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::RunCount => "run-count",
            SectionId::StatusPerRun => "status-per-run",
            SectionId::TopFailingTests => "top-failing-tests",
            SectionId::TestsAlwaysFailing => "tests-always-failing",
            SectionId::MostFrequentExceptionNames => "most-frequent-exception-names",
            SectionId::MostFrequentExceptionTraces => "most-frequent-exception-traces",
            SectionId::SlowestTests => "slowest-tests",
            SectionId::AvgFailuresPerGroup => "avg-failures-per-group",
            SectionId::FailuresPerRun => "failures-per-run",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a section query needs; passed explicitly to each query.
pub struct ReportContext<'a> {
    pub store: &'a Store,
    pub filter: TimeFilter,
    pub predicate: Predicate,
    pub settings: &'a ReportSettings,
    pub now: NaiveDateTime,
}

impl<'a> ReportContext<'a> {
    /// Resolves `filter` against `store` at `now`.
    pub fn new(
        store: &'a Store,
        filter: TimeFilter,
        settings: &'a ReportSettings,
        now: NaiveDateTime,
    ) -> Result<Self> {
        let predicate = filter.resolve(store, now)?;
        debug!(?filter, clauses = predicate.clauses().len(), "resolved report filter");
        Ok(Self {
            store,
            filter,
            predicate,
            settings,
            now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionData {
    RunCount(Vec<RunCountRow>),
    StatusPerRun(Vec<StatusPerRunRow>),
    TopFailingTests(Vec<TopFailingRow>),
    TestsAlwaysFailing(Vec<AlwaysFailingRow>),
    ExceptionNames(Vec<ExceptionNameRow>),
    ExceptionTraces(Vec<TraceBucketRow>),
    SlowestTests(Vec<SlowTestRow>),
    GroupFailureRates(Vec<GroupFailureRateRow>),
    FailuresPerRun(Vec<FailuresPerRunRow>),
}

impl SectionData {
    fn table(&self) -> Table {
        match self {
            SectionData::RunCount(rows) => runs::run_count_table(rows),
            SectionData::StatusPerRun(rows) => runs::status_per_run_table(rows),
            SectionData::TopFailingTests(rows) => failures::top_failing_tests_table(rows),
            SectionData::TestsAlwaysFailing(rows) => failures::tests_always_failing_table(rows),
            SectionData::ExceptionNames(rows) => {
                exceptions::most_frequent_exception_names_table(rows)
            }
            SectionData::ExceptionTraces(rows) => {
                exceptions::most_frequent_exception_traces_table(rows)
            }
            SectionData::SlowestTests(rows) => timing::slowest_tests_table(rows),
            SectionData::GroupFailureRates(rows) => failures::avg_failures_per_group_table(rows),
            SectionData::FailuresPerRun(rows) => runs::failures_per_run_table(rows),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub id: SectionId,
    pub rows: SectionData,
}

fn run_section(id: SectionId, ctx: &ReportContext<'_>) -> Result<SectionData> {
    Ok(match id {
        SectionId::RunCount => SectionData::RunCount(runs::run_count(ctx)?),
        SectionId::StatusPerRun => SectionData::StatusPerRun(runs::status_per_run(ctx)?),
        SectionId::TopFailingTests => {
            SectionData::TopFailingTests(failures::top_failing_tests(ctx)?)
        }
        SectionId::TestsAlwaysFailing => {
            SectionData::TestsAlwaysFailing(failures::tests_always_failing(ctx)?)
        }
        SectionId::MostFrequentExceptionNames => {
            SectionData::ExceptionNames(exceptions::most_frequent_exception_names(ctx)?)
        }
        SectionId::MostFrequentExceptionTraces => {
            SectionData::ExceptionTraces(exceptions::most_frequent_exception_traces(ctx)?)
        }
        SectionId::SlowestTests => SectionData::SlowestTests(timing::slowest_tests(ctx)?),
        SectionId::AvgFailuresPerGroup => {
            SectionData::GroupFailureRates(failures::avg_failures_per_group(ctx)?)
        }
        SectionId::FailuresPerRun => SectionData::FailuresPerRun(runs::failures_per_run(ctx)?),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generated_at: String,
    pub filter: String,
    pub sections: Vec<Section>,
}

impl Report {
    /// Runs `sections` (all when empty) in declaration order. The first failing query fails the
    /// whole report.
    pub fn generate(ctx: &ReportContext<'_>, sections: &[SectionId]) -> Result<Report> {
        let selected: BTreeSet<SectionId> = if sections.is_empty() {
            SectionId::ALL.into_iter().collect()
        } else {
            sections.iter().copied().collect()
        };

        let mut out = Vec::with_capacity(selected.len());
        for id in selected {
            debug!(section = %id, "running report query");
            out.push(Section {
                id,
                rows: run_section(id, ctx)?,
            });
        }

        Ok(Report {
            generated_at: ctx.now.format(RUN_DATE_FORMAT).to_string(),
            filter: ctx.filter.describe(),
            sections: out,
        })
    }

    pub fn render_text(&self, column_width: usize) -> String {
        let mut out = String::new();
        for _ in 0..3 {
            out.push_str(BANNER);
            out.push('\n');
        }
        out.push_str(&format!("Test Results Report for {}\n", self.generated_at));
        out.push_str(&self.filter);
        out.push('\n');
        for section in &self.sections {
            out.push_str(&section.rows.table().render(column_width));
        }
        out
    }
}
