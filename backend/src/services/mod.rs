pub mod export;
pub mod reports;

pub use export::{ExportError, ExportKind, ExportService, XLSX_CONTENT_TYPE};
pub use reports::{OpportunityStore, ReportError, ReportResult, ReportService};
