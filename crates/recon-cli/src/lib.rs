//! Library half of the `recon` binary: logging setup and run reports.

pub mod logging;
pub mod report;
