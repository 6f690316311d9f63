//! Per-suite comparison tables

use benchcmp_common::{CompareError, CriterionData, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::rows::{BuiltRow, CompareStatsRow};

/// Criteria shown as table columns, keyed by criterion name
pub type CompareStatsTableHeader = IndexMap<String, CriterionData>;

/// One suite's rows and their shared criteria header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareStatsTable {
    pub criteria: CompareStatsTableHeader,
    pub benchmarks: Vec<CompareStatsRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview_svg_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_exe_name: Option<String>,
}

impl CompareStatsTable {
    /// Column order, i.e. the order criteria were first observed.
    pub fn criteria_order(&self) -> Vec<&str> {
        self.criteria.keys().map(String::as_str).collect()
    }

    pub fn is_across_exes(&self) -> bool {
        self.baseline_exe_name.is_some()
    }
}

#[derive(Debug, Default)]
pub struct TableBuilder {
    criteria: CompareStatsTableHeader,
    rows: Vec<CompareStatsRow>,
    overview_svg_url: Option<String>,
    baseline_exe_name: Option<String>,
}

impl TableBuilder {
    pub fn new(overview_svg_url: Option<String>) -> Self {
        Self {
            overview_svg_url,
            ..Default::default()
        }
    }

    /// A table comparing executables against `baseline_exe`.
    pub fn across_exes(overview_svg_url: Option<String>, baseline_exe: impl Into<String>) -> Self {
        Self {
            overview_svg_url,
            baseline_exe_name: Some(baseline_exe.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add a row; its criteria extend the header in first-seen order.
    pub fn push(&mut self, built: BuiltRow) -> Result<()> {
        for criterion in built.criteria {
            match self.criteria.get(&criterion.name) {
                Some(known) if known.unit != criterion.unit => {
                    return Err(CompareError::MalformedInput(format!(
                        "criterion '{}' reported in '{}' and '{}' within one suite",
                        criterion.name, known.unit, criterion.unit
                    )));
                }
                Some(_) => {}
                None => {
                    self.criteria.insert(criterion.name.clone(), criterion);
                }
            }
        }
        self.rows.push(built.row);
        Ok(())
    }

    /// Finish the table, checking every row statistic has a header column.
    pub fn build(self) -> Result<CompareStatsTable> {
        for row in &self.rows {
            if let Some(name) = row
                .stats
                .criteria()
                .into_iter()
                .find(|name| !self.criteria.contains_key(*name))
            {
                return Err(CompareError::MalformedInput(format!(
                    "row {} has statistics for '{}' outside the table header",
                    row.bench_id, name
                )));
            }
        }

        Ok(CompareStatsTable {
            criteria: self.criteria,
            benchmarks: self.rows,
            overview_svg_url: self.overview_svg_url,
            baseline_exe_name: self.baseline_exe_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::{RowStats, RunDetails};
    use benchcmp_common::BenchmarkId;

    fn built(bench: &str, criteria: &[(&str, &str)]) -> BuiltRow {
        BuiltRow {
            row: CompareStatsRow {
                bench_id: BenchmarkId::new(bench, "som", "micro"),
                details: RunDetails {
                    cmdline: String::new(),
                    env_id: 1,
                    has_warmup: false,
                    profile_base: None,
                    profile_change: None,
                    data_series: None,
                    cross_experiment: false,
                    num_v: 1,
                    num_c: 1,
                    num_i: 1,
                    num_ea: 1,
                    num_env: 1,
                },
                arguments_for_display: String::new(),
                missing: Vec::new(),
                inline_plot: None,
                stats: RowStats::VersionStats(IndexMap::new()),
            },
            criteria: criteria.iter().map(|(n, u)| CriterionData::new(*n, *u)).collect(),
        }
    }

    #[test]
    fn test_header_is_union_in_first_seen_order() {
        let mut builder = TableBuilder::new(Some("r/overview.som.micro.svg".to_string()));
        builder.push(built("Fib", &[("total", "ms"), ("GC", "ms")])).unwrap();
        builder.push(built("Sieve", &[("mem", "MB"), ("total", "ms")])).unwrap();

        let table = builder.build().unwrap();
        assert_eq!(table.criteria_order(), vec!["total", "GC", "mem"]);
        assert_eq!(table.benchmarks.len(), 2);
        assert!(!table.is_across_exes());
        assert_eq!(table.overview_svg_url.as_deref(), Some("r/overview.som.micro.svg"));
    }

    #[test]
    fn test_unit_conflict_fails_fast() {
        let mut builder = TableBuilder::new(None);
        builder.push(built("Fib", &[("total", "ms")])).unwrap();
        let err = builder.push(built("Sieve", &[("total", "s")])).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_across_exes_table_names_baseline() {
        let builder = TableBuilder::across_exes(None, "som");
        assert!(builder.is_empty());
        let table = builder.build().unwrap();
        assert!(table.is_across_exes());
        assert_eq!(table.baseline_exe_name.as_deref(), Some("som"));
    }
}
