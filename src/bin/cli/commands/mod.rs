pub mod extract;
pub mod generate;
pub mod schedule;
pub mod serve;
