mod entity;

pub use entity::{create, get_by_id, list, remove, replace};
