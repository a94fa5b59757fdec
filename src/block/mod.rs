pub mod field;
pub mod java_type;
pub mod kind;

pub use field::*;
pub use java_type::*;
pub use kind::*;
