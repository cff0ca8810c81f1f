pub mod config;
pub mod usecases;
