use serde::Serialize;

use super::entities::ReviewMapping;

/// 动态分配成功的返回数据
#[derive(Debug, Clone, Serialize)]
pub struct DynamicAssignResponse {
    pub mapping_id: i64,
    pub reviewee_id: i64,
    pub mapping: ReviewMapping,
}

/// 动态分配被拒绝时附带的上限信息
#[derive(Debug, Clone, Serialize)]
pub struct CapacityRefusal {
    pub outstanding: u64,
    pub cap: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewMappingListResponse {
    pub items: Vec<ReviewMapping>,
    pub total: usize,
}
