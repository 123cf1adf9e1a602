//! Query parameters shared by the plain list endpoints

use serde::Deserialize;

use otica_shared::Pagination;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive substring search
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }

    /// Search term with surrounding whitespace removed, `None` when blank.
    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}
