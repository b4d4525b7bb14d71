pub mod cli;
pub mod compute;
pub mod coordinator;
pub mod csv_writer;
pub mod distribute;
pub mod error;
pub mod group;
pub mod metrics;
pub mod partition;
pub mod reporter;
pub mod types;
