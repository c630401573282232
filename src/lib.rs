#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// #![warn(clippy::cargo)]

pub mod calibration;
pub mod config;
pub mod margin;
pub mod report;
pub mod validation;

pub type Result<T> = ::std::result::Result<T, Box<dyn ::std::error::Error>>;
