//! Directory polling: find candidate workbooks and feed them through the
//! dispatcher one at a time.

pub mod poller;
pub mod scanner;

pub use poller::{CycleReport, PollIntervals, Poller};
pub use scanner::{Candidate, DirectoryScanner};
