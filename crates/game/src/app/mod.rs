pub(crate) mod bootstrap;
mod console;
mod data;
pub(crate) mod loop_runner;
mod scenes;
