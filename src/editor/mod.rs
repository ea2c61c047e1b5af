pub mod requests;
pub mod session;
pub mod viewport;

pub use requests::*;
pub use session::*;
pub use viewport::*;
