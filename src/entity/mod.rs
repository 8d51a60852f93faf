//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体读写数据库，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod assignments;
pub mod participants;
pub mod review_dependents;
pub mod review_mappings;
pub mod signed_up_teams;
pub mod team_members;
pub mod teams;
pub mod topics;
