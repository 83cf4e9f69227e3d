//! Cucumber world and step definitions


pub use support::TestWorld;
