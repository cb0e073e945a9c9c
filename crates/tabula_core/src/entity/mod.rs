//! Entity types.

mod id;
mod record;

pub use id::EntityId;
pub use record::{Entity, EntityDraft, Fields};
