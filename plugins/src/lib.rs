pub mod command;
pub mod factory;
pub mod replay;

pub use command::CommandOperation;
pub use factory::build_operation;
pub use replay::ReplayOperation;
