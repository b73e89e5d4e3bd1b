// LGU Compliance Report Tracker - Core Library
// Exposes all modules for use in the CLI and tests

pub mod batch;
pub mod checklist;
pub mod config;
pub mod export;
pub mod registry;
pub mod template;
pub mod workbook;

// Re-export commonly used types
pub use batch::{process_batch, BatchProgress, BatchReport};
pub use checklist::{
    build_checklist, Checklist, ChecklistError, ChecklistGroup, ChecklistRow, ChecklistSummary,
};
pub use config::AppConfig;
pub use export::{
    export_checklist_csv, export_compilation, save_compilation, COMPILATION_HEADERS,
    DEFAULT_COMPILATION_NAME,
};
pub use registry::{
    load_entities, load_records, ChecklistFilter, Entity, EntityRef, SubmissionRecord,
    SubmissionStatus,
};
pub use template::{
    parse_report, parse_report_with, CellAddr, ParsedResult, ReportFile, TemplateLayout,
    NO_FINDINGS_SENTINEL,
};
pub use workbook::{cell_num, cell_str, open_report, sheet_or_first, WorkbookError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
