//! Derived views over a flight schedule dataset.
//!
//! The pipeline runs strictly forward: records are grouped, the groupings feed
//! the delta model and the rescheduled-flight detector, and histograms are
//! computed over any group's members. [`report::build_report`] runs all of it
//! once and collects the results.

pub mod anomaly;
pub mod delta;
pub mod grouping;
pub mod histogram;
pub mod moved;
pub mod report;
pub mod utility;
