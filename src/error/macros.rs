//! # 错误处理宏

/// 快速创建业务错误的宏
#[macro_export]
macro_rules! business_error {
    ($msg:expr) => {
        $crate::error::DormError::business($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::DormError::business(format!($fmt, $($arg)*))
    };
}

/// 快速创建校验错误的宏
#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::error::DormError::validation($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::DormError::validation(format!($fmt, $($arg)*))
    };
}

/// 快速创建认证错误的宏
#[macro_export]
macro_rules! auth_error {
    ($msg:expr) => {
        $crate::error::DormError::auth($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::DormError::auth(format!($fmt, $($arg)*))
    };
}

/// 快速创建内部错误的宏
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::error::DormError::internal($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::DormError::internal(format!($fmt, $($arg)*))
    };
}

/// 确保条件成立，否则返回业务错误
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::business_error!($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::business_error!($fmt, $($arg)*));
        }
    };
}

/// 确保条件成立，否则返回校验错误
#[macro_export]
macro_rules! ensure_valid {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::validation_error!($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::validation_error!($fmt, $($arg)*));
        }
    };
}
