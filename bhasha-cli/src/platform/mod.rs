//! 终端输出相关的平台代码

pub mod cli;

pub use cli::print_failure_with_source;
