//! `zcheck-recon`: Z-Read vs E-Journal reconciliation engine.
//!
//! Parses point-of-sale register text (end-of-day Z-Read reports and
//! electronic journals), correlates journals to Z-Read windows by date or
//! invoice serial range, and classifies each window as MATCH or MISMATCH.
//! Folder loading lives in [`source`]; everything else works on in-memory
//! [`Document`]s.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod money;
pub mod parse;
pub mod patterns;
pub mod report;
pub mod source;
pub mod totals;

pub use config::ReconConfig;
pub use engine::{run, Reconciler};
pub use error::{ParseFailure, ReconError};
pub use model::{DateFilter, Document, ReconInput, ReconReport};
