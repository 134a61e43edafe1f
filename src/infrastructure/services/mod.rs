mod catalog;
pub mod outbox;
pub mod party_actor;
pub mod party_directory;

pub use catalog::*;
pub use outbox::{Outbox, PushOutcome};
pub use party_actor::{PartyActor, PartyHandle};
pub use party_directory::{CodeSource, DirectoryError, PartyDirectory, RandomCodes};
