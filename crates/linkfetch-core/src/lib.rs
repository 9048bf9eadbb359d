pub mod config;
pub mod logging;

pub mod batch;
pub mod fetch;
pub mod links;
pub mod progress;
pub mod run;
pub mod stats;
pub mod storage;
