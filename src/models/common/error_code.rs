/// 业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,

    // 认证错误
    AuthFailed = 2000,

    // 用户错误
    UserNotFound = 3000,
    UserAlreadyExists = 3001,
    UserNameInvalid = 3002,
    UserEmailInvalid = 3003,
    UserPasswordInvalid = 3004,

    // 分类错误
    CategoryNotFound = 4000,

    // 报告任务错误
    ReportAssignmentNotFound = 5000,

    // 提交错误
    SubmissionNotFound = 6000,
    SubmissionFieldsInvalid = 6001,

    // 通知错误
    NotificationNotFound = 8000,
}
