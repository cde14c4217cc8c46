pub mod auth;
pub mod catalog;
pub mod config;
pub mod contact;
pub mod gallery;
pub mod profile;
pub mod site_config;
pub mod storage;
pub mod upload;
