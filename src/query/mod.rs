pub mod engine;

pub use engine::{GraphAccess, GraphState};
