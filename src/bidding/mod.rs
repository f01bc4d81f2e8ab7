pub mod commands;
pub mod locks;
pub mod proxy;
