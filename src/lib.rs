//! A conversational restaurant ordering assistant: a session-scoped cart
//! behind a stateless chat surface, reconciled exactly once against an
//! external payment gateway.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
