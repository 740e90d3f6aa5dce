pub mod alias_index;
pub mod command_path;
pub mod config;
pub mod contract;
pub mod controller;
pub mod discovery;
pub mod engine;
pub mod fs_index;
pub mod launcher;
pub mod logging;
pub mod model;
pub mod package_index;
pub mod process_table;
pub mod ranker;
pub mod resolver;
pub mod shortcut_index;
pub mod transport;
pub mod worker;
