//! Keyword tables written to completion and MSW files.

pub mod compdat;
pub mod formatter;
pub mod msw_tables;
pub mod report;

pub use compdat::{CompdatOptions, WellSpecEntry, compdat_table, welspecs_table, wpimult_table};
pub use formatter::{
    Column, ColumnFormat, KeywordTable, TableDocument, TableFormatter, TableKind, TableLine,
    TableSection, Value,
};
pub use msw_tables::{compsegs_table, msw_document, welsegs_table, wsegvalv_table};
pub use report::{FractureReportItem, fracture_report_section};
