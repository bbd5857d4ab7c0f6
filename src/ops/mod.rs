pub mod dispatch;
pub mod invocation;
pub mod probe;
pub mod provision;
pub mod terminal;
