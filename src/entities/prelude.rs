pub use super::permissions::Entity as Permissions;
pub use super::tokens::Entity as Tokens;
pub use super::users::Entity as Users;
pub use super::users_permissions::Entity as UsersPermissions;
