// src/lib.rs

pub mod app_state;
pub mod clients;
pub mod config;
pub mod deploy_config;
pub mod error;
pub mod service;
pub mod storage;
