#![cfg_attr(doc, doc = include_str!("../README.md"))]
#![forbid(unsafe_code)]

pub mod args;
pub mod config;

mod error;
pub use error::{DistrictMapError, DistrictMapResult};

pub mod srv;
