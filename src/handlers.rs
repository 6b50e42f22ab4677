pub mod auth;
pub mod config;
pub mod hours;
pub mod merge;
pub mod reservations;
pub mod tables;
