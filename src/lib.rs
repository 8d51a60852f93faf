//! Peer Review - 课程作业互评分配服务
//!
//! 基于 Actix Web 构建，为作业分配评审关系并维护其不变量。
//!
//! # 架构
//! - `allocation`: 分配策略与未提交评审上限
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `handler`: 评审映射处理器（策略 + 上限 + 存储）
//! - `middlewares`: 速率限制中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: HTTP 服务层
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod allocation;
pub mod config;
pub mod entity;
pub mod errors;
pub mod handler;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod test_support;
