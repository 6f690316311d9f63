//! Suite navigation derived from an aggregated report

use serde::{Deserialize, Serialize};

use crate::report::AllStats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExeNavigation {
    pub exe_name: String,
    pub suites: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteNavigation {
    pub suites: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareNavigation {
    pub nav: Vec<ExeNavigation>,
    pub nav_exe_comparison: SuiteNavigation,
}

/// Navigation entries in the iteration order of the report's tables.
pub fn build_navigation(stats: &AllStats) -> CompareNavigation {
    let nav = stats
        .across_versions
        .all_measurements
        .iter()
        .map(|(exe, suites)| ExeNavigation {
            exe_name: exe.clone(),
            suites: suites.keys().cloned().collect(),
        })
        .collect();

    CompareNavigation {
        nav,
        nav_exe_comparison: SuiteNavigation {
            suites: stats.across_exes.keys().cloned().collect(),
        },
    }
}
