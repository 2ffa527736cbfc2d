pub mod controller;

pub use controller::{ALL_EXECUTED, NOTHING_TO_DO, RunController};
