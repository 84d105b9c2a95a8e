//! Benchmark log analysis for the KFusion reconstruction pipeline:
//! parsing of the benchmark logs, trajectory alignment and error
//! statistics, CSV reports and aggregation across repeated runs.

pub mod config_file;
pub mod csv_report;
pub mod ctx;
pub mod get_terminal_width;
pub mod io_utils;
pub mod log_format;
pub mod multi_run;
pub mod report_config;
pub mod reports;
pub mod serde;
pub mod series;
pub mod stats;
pub mod terminal_table;
pub mod trajectory;
pub mod utillib;
