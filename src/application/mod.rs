//! Application layer: the dialogue engine that maps option tokens to order
//! state transitions, and the payment coordinator that settles orders against
//! an external gateway exactly once.

pub mod dialogue;
pub mod payment;
