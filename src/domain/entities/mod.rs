mod participant;
mod party;

pub use participant::*;
pub use party::*;
