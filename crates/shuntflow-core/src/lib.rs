pub mod cloud;
pub mod config;
pub mod consts;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod extract;
pub mod frame;
pub mod io;
pub mod sectors;
pub mod series;
pub mod session;
