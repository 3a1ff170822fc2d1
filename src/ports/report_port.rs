//! Report generation port trait.

use std::fs;
use std::path::Path;

use crate::domain::error::MarketSimError;
use crate::domain::report::SimulationReport;

/// Port for rendering simulation reports.
pub trait ReportPort {
    fn render(&self, report: &SimulationReport) -> Result<String, MarketSimError>;

    /// Default implementation: render and write the whole document to `output_path`.
    fn write(&self, report: &SimulationReport, output_path: &Path) -> Result<(), MarketSimError> {
        let content = self.render(report)?;
        fs::write(output_path, content)?;
        Ok(())
    }
}
