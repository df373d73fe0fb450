//! ShareHub Match - donation matching service for UHV ShareHub
//!
//! Ranks verified help seekers around a donation, drives the match and
//! donation-request lifecycles, and runs the profile verification workflow.

pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod workflows;

// Re-export commonly used types
pub use core::{Matcher, distance::{haversine_distance, calculate_bounding_box}};
pub use error::AppError;
pub use models::{Candidate, CandidatesResponse, Donation, DonationMatch, HelpSeeker, ScoringRules};
pub use state::AppState;
