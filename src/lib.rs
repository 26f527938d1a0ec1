#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate serde_json;

pub mod error;
pub use error::Error;

pub mod util;

pub mod app;

pub mod forms;

pub mod models;

pub mod db;

pub mod services;
