pub mod account_service;
pub mod account_service_impl;
pub use account_service::{AccountError, AccountService, AuthError};
pub use account_service_impl::SeaOrmAccountService;

pub mod token_service;
pub mod token_service_impl;
pub use token_service::{Claims, TokenPair, TokenService, TokenType};
pub use token_service_impl::JwtTokenService;

pub mod self_service;
pub use self_service::SelfService;
