//! Locations of the plots referenced by a report
//!
//! The images are produced elsewhere; the report model only carries their
//! paths relative to the reports directory.

use benchcmp_common::RunId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlotPaths {
    report_id: Option<String>,
}

impl PlotPaths {
    pub fn new(report_id: Option<String>) -> Self {
        Self { report_id }
    }

    /// No plots are referenced at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn overview_png(&self) -> String {
        self.report_id
            .as_ref()
            .map(|id| format!("{}/overview.png", id))
            .unwrap_or_default()
    }

    pub fn overview_svg(&self, exe: &str) -> Option<String> {
        self.report_id
            .as_ref()
            .map(|id| format!("{}/overview.{}.svg", id, exe))
    }

    pub fn table_svg(&self, exe: &str, suite: &str) -> Option<String> {
        self.report_id
            .as_ref()
            .map(|id| format!("{}/overview.{}.{}.svg", id, exe, suite))
    }

    pub fn exe_table_svg(&self, suite: &str) -> Option<String> {
        self.report_id
            .as_ref()
            .map(|id| format!("{}/exes.{}.svg", id, suite))
    }

    pub fn inline(&self, run_id: RunId) -> Option<String> {
        self.report_id
            .as_ref()
            .map(|id| format!("{}/inline-{}.svg", id, run_id))
    }
}
