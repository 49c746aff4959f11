// moderation core - verdicts in, deletions/warnings/mutes out

mod engine;
mod mute;
mod seen;
mod triggers;

pub use engine::{Action, Moderator, Subject, Verdict};
pub use mute::{HIERARCHY_HINT, MUTE_ROLE, MuteController, MuteError};
pub use triggers::TriggerWords;
