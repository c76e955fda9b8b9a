pub mod error_code;
pub mod pagination;
pub mod response;
pub(crate) mod string_enum;

pub use pagination::{PageWindow, PaginationInfo, PaginationQuery};
