pub mod catalog;
pub mod config;
pub mod doctor;
pub mod error;
pub mod ops;
