pub mod add;
pub mod common;
pub mod completions;
pub mod delete;
pub mod list;
pub mod seed;
pub mod status;
pub mod sync;
pub mod update;
pub mod watch;
