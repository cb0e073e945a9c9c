//! Collections: the entity store and its per-collection view state.

mod store;
mod view;

pub use store::EntityStore;
pub use view::CollectionView;
