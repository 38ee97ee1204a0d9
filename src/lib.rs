//! NextNote: a notes server with per-user ownership and sharing.

pub mod api;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod models;
