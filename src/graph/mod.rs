pub mod conversion;
pub mod layout;
pub mod validation;

pub use conversion::*;
pub use layout::*;
pub use validation::*;
