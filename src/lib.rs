pub mod db;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod state;
pub mod web;
