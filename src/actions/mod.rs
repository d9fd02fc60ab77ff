//! Action catalog: what an agent can do in one tick and how much it wants to

pub mod catalog;
pub mod combat;
pub mod context;
pub mod curves;
pub mod idle;
pub mod social;
pub mod survival;
pub mod work;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{ActionId, CatalogEntry, CATALOG};
pub use context::{ActionContext, Movement};
