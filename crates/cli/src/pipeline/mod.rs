//! Pipeline run reporting.

mod report;

pub use report::print_summary;
