// Shared infrastructure: league settings/config loading and draft persistence.

pub mod config;
pub mod db;
