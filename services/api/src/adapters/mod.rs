pub mod db;
pub mod mail;
pub mod memory;

pub use db::DbAdapter;
pub use mail::{LogMailAdapter, SmtpMailAdapter};
pub use memory::MemoryAdapter;
