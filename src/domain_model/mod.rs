mod claims;
mod identity;
mod session;

pub use claims::*;
pub use identity::*;
pub use session::*;
