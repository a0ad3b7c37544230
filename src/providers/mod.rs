//! Concrete collaborator implementations

pub mod amm;
pub mod fixed;
pub mod http;
pub mod memory_token;
pub mod receivers;
