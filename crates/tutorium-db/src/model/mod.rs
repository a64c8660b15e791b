pub mod configuration;
pub mod free_period;
pub mod schedule;
pub mod session;
pub mod tutorial_group;
