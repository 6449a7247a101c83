pub mod engine_type;
pub mod mapping;
pub mod metadata;
pub mod signature;
pub mod value;

pub use engine_type::*;
pub use mapping::*;
pub use metadata::*;
pub use signature::*;
pub use value::*;
