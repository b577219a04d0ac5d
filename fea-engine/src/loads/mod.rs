//! Load types

mod distributed;
mod load_case;
mod node_load;

pub use distributed::{DistributedLoad, LoadDirection};
pub use load_case::LoadCase;
pub use node_load::NodeLoad;
