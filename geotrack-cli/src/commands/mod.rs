//! Command handlers for the geotrack CLI.

pub mod config;
pub mod device;
pub mod drain;
pub mod run;
pub mod status;
pub mod update;
pub mod zones;
