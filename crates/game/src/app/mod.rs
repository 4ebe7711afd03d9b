pub(crate) mod bootstrap;
pub(crate) mod loop_runner;

mod cursor;
mod net;
mod script;
mod session;
