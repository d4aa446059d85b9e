pub mod access;
pub mod delivery;
pub mod registry;
