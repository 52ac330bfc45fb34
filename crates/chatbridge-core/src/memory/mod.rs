//! Rolling conversation memory.

pub mod manager;
