pub mod compliance_category;
pub mod frame_aggregator;
pub mod frame_tally;
pub mod label_classifier;
pub mod session_stats;
pub mod violation_event;
