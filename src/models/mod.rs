pub mod commit;
pub mod metrics;
pub mod snapshot;
pub mod test_summary;
