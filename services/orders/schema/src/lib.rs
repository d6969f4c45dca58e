//! sea-orm entities for the orders service.

pub mod orders;
