mod grant;
mod init;

pub use grant::cmd_grant;
pub use init::cmd_init;
