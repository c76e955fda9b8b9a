use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

/// 单页条目上限
pub const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PAGE_SIZE: i64 = 10;

/// 列表接口共用的分页参数，查询串里的数字以字符串形式到达
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationQuery {
    #[serde(default = "first_page", deserialize_with = "lenient_i64")]
    pub page: i64,
    #[serde(default = "default_page_size", deserialize_with = "lenient_i64")]
    pub size: i64,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: first_page(),
            size: default_page_size(),
        }
    }
}

impl PaginationQuery {
    pub fn window(&self) -> PageWindow {
        PageWindow::new(Some(self.page), Some(self.size))
    }
}

/// 归一化后的页码与页大小，直接喂给 SeaORM 的 paginator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub size: u64,
}

impl PageWindow {
    /// 页码从 1 开始，页大小限制在 1..=MAX_PAGE_SIZE
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1) as u64,
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE) as u64,
        }
    }

    /// SeaORM 的 fetch_page 从 0 开始计页
    pub fn zero_based(&self) -> u64 {
        self.page - 1
    }

    pub fn describe(&self, total: u64, total_pages: u64) -> PaginationInfo {
        PaginationInfo {
            page: self.page as i64,
            page_size: self.size as i64,
            total: total as i64,
            total_pages: total_pages as i64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/pagination.ts")]
pub struct PaginatedResponse<T: TS> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

/// 同时接受 JSON 数字与数字字符串
fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(i64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("expected an integer, got \"{s}\""))
        }),
    }
}

fn first_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_accepts_numeric_strings() {
        let query: PaginationQuery = serde_json::from_str(r#"{"page":"3","size":25}"#).unwrap();
        assert_eq!(query.page, 3);
        assert_eq!(query.size, 25);

        let query: PaginationQuery = serde_json::from_str("{}").unwrap();
        assert_eq!((query.page, query.size), (1, DEFAULT_PAGE_SIZE));

        assert!(serde_json::from_str::<PaginationQuery>(r#"{"page":"two"}"#).is_err());
    }

    #[test]
    fn test_window_clamps_out_of_range_values() {
        let window = PageWindow::new(Some(0), Some(1000));
        assert_eq!(window, PageWindow { page: 1, size: 100 });
        assert_eq!(window.zero_based(), 0);

        let window = PageWindow::new(None, Some(-5));
        assert_eq!(window.size, 1);

        let info = PageWindow::new(Some(2), Some(20)).describe(45, 3);
        assert_eq!(info.page, 2);
        assert_eq!(info.page_size, 20);
        assert_eq!(info.total_pages, 3);
    }
}
