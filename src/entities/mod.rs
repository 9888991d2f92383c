pub mod prelude;

pub mod permissions;
pub mod tokens;
pub mod users;
pub mod users_permissions;
