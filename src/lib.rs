//! Turnstile - Fixed-Window Request Admission
//!
//! This crate implements a per-client fixed-window rate limiter and the HTTP
//! boundary that uses it to protect a contact-form endpoint. The limiter is
//! an ordinary value: construct one, wrap it in an `Arc`, and hand it to
//! whatever needs admission control.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
