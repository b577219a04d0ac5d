//! Structural elements module

mod material;
mod member;
mod node;
mod section;
mod support;

pub use material::{Material, MaterialKind};
pub use member::Member;
pub use node::Node;
pub use section::Section;
pub use support::Support;
