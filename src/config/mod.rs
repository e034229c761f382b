//! 应用配置
//!
//! 静态配置通过 `config` crate 从配置文件与环境变量加载，启动后全局只读。

#[path = "impl.rs"]
mod loader;
mod structs;

pub use structs::*;
