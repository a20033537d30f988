//! Run statistics: status histogram, latency percentiles and throughput.
mod aggregator;
mod lines;
mod percentiles;


pub use aggregator::{LatencyStats, Report, ReportAggregator, SUCCESS_STATUS};
pub use lines::{summary_line, summary_lines};
pub use percentiles::percentile;
