pub mod config;
pub mod density;
pub mod detect;
pub mod info;
