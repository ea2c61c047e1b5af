pub mod connection;
pub mod content;
pub mod node;
pub mod port;
pub mod workflow;

pub use connection::*;
pub use content::*;
pub use node::*;
pub use port::*;
pub use workflow::*;
