pub mod arch_summary;
pub mod coverage;
pub mod nearest;
pub mod report;
pub mod sampler;
pub mod smells;
pub mod table;
pub mod test_output;
pub mod type_metrics;
