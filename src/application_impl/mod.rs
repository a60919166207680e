mod argon2_hasher;
mod jwt_codec;
mod token_service_impl;

pub use argon2_hasher::*;
pub use jwt_codec::*;
pub use token_service_impl::*;
