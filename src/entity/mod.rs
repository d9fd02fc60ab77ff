pub mod agent;
pub mod memory;
pub mod needs;
pub mod relationships;
pub mod traits;

pub use agent::{Activity, Agent, DecisionBias, Inventory, ResourceKind, Role, Trait, Vitals};
