mod assertion_types;
mod types;

pub use assertion_types::*;
pub use types::*;
