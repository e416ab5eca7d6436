pub mod check_host;
pub mod fetch;
pub mod pick;
pub mod serve;
pub mod utils;
pub mod version;

#[cfg(test)]
#[path = "../commands_test.rs"]
mod commands_test;
