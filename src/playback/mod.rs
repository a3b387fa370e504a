//! Playback: the state machine, the paced video loop, and still-image display.

mod player;
mod state;
mod still;

pub use player::{Player, Step, IDLE_POLL, PENDING_POLL};
pub use state::{PlaybackState, Transition};
pub use still::{draw_still, show_still, still_title};
