//! Client-side party state, independent of any UI toolkit
//!
//! Server frames are parsed into events, folded into a [`PartyViewState`],
//! and turned into [`PlaybackIntent`]s for the local media engine.

mod clock;
mod drift;
mod subscription;
mod view_state;

pub use clock::*;
pub use drift::*;
pub use subscription::*;
pub use view_state::*;
