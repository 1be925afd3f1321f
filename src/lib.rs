//! medsync — client-side data layer for clinic applications.
//!
//! Maintains live, filtered, ordered in-memory mirrors of remote tables
//! ([`view::LiveView`]) and computes clinician working-hours availability
//! ([`schedule`], [`roster`]). Persistence, auth, and realtime delivery are
//! owned by the hosted backend; this crate only reconciles what it is told.

pub mod backend;
pub mod config;
pub mod error;
pub mod hub;
pub mod memory;
pub mod model;
pub mod observability;
pub mod roster;
pub mod schedule;
pub mod view;
