pub mod command;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod filters;
pub mod planner;
pub mod plant;
pub mod safety;
pub mod telemetry;
pub mod transport;
