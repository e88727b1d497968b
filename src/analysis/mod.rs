pub mod champion_stats;
pub mod queue;
pub mod role;
pub mod scoring;
pub mod standout;
pub mod summary;
