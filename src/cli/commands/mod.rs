mod init;
mod list;
mod serve;
mod superuser;
mod wait_for_db;

pub use init::cmd_init;
pub use list::cmd_list_accounts;
pub use serve::cmd_serve;
pub use superuser::cmd_create_superuser;
pub use wait_for_db::cmd_wait_for_db;
