pub mod password;
pub mod permission;
pub mod token;
pub mod user;

pub use password::{CredentialError, Password};
pub use permission::Permissions;
pub use token::{Scope, Token, TokenError};
pub use user::{Identity, User};
