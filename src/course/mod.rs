//! Course reference parsing and work-item generation.

pub mod reference;
pub mod workitems;
