pub mod countdown;
pub mod nav_guard;
pub mod proctor_monitor;
pub mod question_deck;

pub use countdown::{Countdown, Tick};
pub use nav_guard::{BackDecision, NavigationGuard, LEAVE_WARNING};
pub use proctor_monitor::{ChannelSource, ProctorGuard, ProctorMonitor, ProctorSource};
pub use question_deck::{dedupe_by_stem, prepare_deck, shuffle_deck};
