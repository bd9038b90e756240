//! Projekti - project records with Excel and PDF reports
//!
//! Projects, people, partners, jobs, documentation, cards with their
//! transactions, requests and tasks, plus the lookup tables they use.

pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod reports;
pub mod services;
pub mod views;
pub mod web;
