pub mod campaign;
pub mod roster;
