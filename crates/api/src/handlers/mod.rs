pub mod downloads;
pub mod runner;
