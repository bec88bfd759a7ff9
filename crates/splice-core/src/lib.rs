pub mod dna;
pub mod location;
pub mod role;

pub use location::*;
pub use role::*;
