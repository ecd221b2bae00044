#![forbid(unsafe_code)]

pub mod cli;
pub mod content;
pub mod edit;
pub mod identity;
pub mod ingest;
pub mod logging;
pub mod normalize;
pub mod storage;
pub mod store;
