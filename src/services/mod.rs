pub mod recommendations;
pub mod stats;
