mod runner;
mod summary;


pub(crate) use runner::run_load;
pub(crate) use summary::{export_report, print_summary};
