//! Game simulation modules

pub mod arena;
pub mod combat;
pub mod lifecycle;
pub mod r#match;
pub mod physics;
pub mod scheduler;
pub mod snapshot;
pub mod timers;
pub mod world;

pub use scheduler::{spawn_arena, ArenaClosed, ArenaHandle, SESSION_QUEUE_CAPACITY};
