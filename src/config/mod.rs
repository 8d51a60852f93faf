//! 配置管理
//!
//! 配置来源依次为：内置默认值、`config.toml`、`config.{APP_ENV}.toml`、
//! `PEER_REVIEW__` 前缀的环境变量，以及少量常用环境变量覆盖。

mod r#impl;
mod structs;

pub use structs::*;
