pub mod connection;
pub mod envelope;
pub mod hub;
pub mod routing;

pub use connection::*;
pub use envelope::*;
pub use hub::*;
pub use routing::*;
