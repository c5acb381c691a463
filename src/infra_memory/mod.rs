mod friend_request_repo_memory;
mod user_repo_memory;

pub use friend_request_repo_memory::*;
pub use user_repo_memory::*;

mod repo_tx_memory;

pub use repo_tx_memory::*;
