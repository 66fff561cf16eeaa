//! Domain layer: the entities of the ordering assistant and the ports the
//! application layer drives them through.

pub mod menu;
pub mod money;
pub mod order;
pub mod ports;
pub mod user;
