//! Domain layer: entities, value objects, state-transition guards, and the
//! storage ports the application layer is written against.

pub mod currency;
pub mod dispute;
pub mod event;
pub mod friendship;
pub mod ids;
pub mod ports;
pub mod transaction;
pub mod user;
pub mod wallet;
pub mod wish;
