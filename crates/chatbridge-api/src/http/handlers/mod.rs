//! Route handlers.

pub mod inspect;
pub mod ws;
