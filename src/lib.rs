#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub(crate) mod api;
pub mod app;
pub mod config;
pub mod observability;
pub mod replay;
pub mod store;
pub mod tagmap;
