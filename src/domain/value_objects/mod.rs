mod moment;
mod party_code;
mod playback_state;
mod sync_settings;

pub use moment::*;
pub use party_code::*;
pub use playback_state::*;
pub use sync_settings::*;
