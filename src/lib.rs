pub mod actors;
pub mod config;
pub mod probe;
pub mod retry;
pub mod storage;
pub mod util;
