pub mod logger;
pub mod pansharpen;
