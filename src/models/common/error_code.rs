// 业务错误码，随 ApiResponse 一起返回
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    NotFound = 1001,
    Conflict = 1002,
    RateLimitExceeded = 1003,
    InternalServerError = 1099,

    // 作业与名单
    AssignmentNotFound = 2000,
    AssignmentConfigInvalid = 2004,
    RosterEntryExists = 2005,

    // 评审映射
    ReviewMappingNotFound = 3000,
    ReviewCapacityExhausted = 3002,
    NoEligibleReviewee = 3003,
    DuplicateReviewMapping = 3004,
    GradeInvalid = 3005,
    CalibrationDisabled = 3006,

    // 导入
    ImportFileMissing = 4000,
    ImportFileParseFailed = 4001,
    ImportFileDataInvalid = 4002,
    FileUploadFailed = 4003,
}
