//! 学校报告汇总服务
//!
//! 教师按报告任务提交内容；协调员与校长把同一任务下的同级提交
//! 合并进自己的目标报告，或撤销合并。
//!
//! 请求自 `routes` 进入，经 `middlewares` 做认证、角色与限流，
//! 由 `services` 编排，`storage` 通过 SeaORM `entity` 读写数据库。
//! 合并规则全部在 `consolidation` 中，不接触数据库。
//! 其余模块：`config` 加载配置，`cache` 提供 Moka/Redis 缓存，
//! `errors` 定义统一错误，`runtime` 负责启动与退出，`utils` 收纳杂项。

pub mod cache;
pub mod config;
pub mod consolidation;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
