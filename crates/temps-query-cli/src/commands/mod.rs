mod batch;
mod clouds;

pub use batch::{BuildCommand, RunCommand};
pub use clouds::CloudsCommand;
