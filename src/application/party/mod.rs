mod create_party;
mod end_party;
mod get_party_details;
mod join_party;
mod leave_party;
mod relay;
mod sync_playback;

pub use create_party::*;
pub use end_party::*;
pub use get_party_details::*;
pub use join_party::*;
pub use leave_party::*;
pub use relay::*;
pub use sync_playback::*;
