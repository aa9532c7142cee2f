use topic_beans::{Result, ViewerError};

/// Genes shown per page by default
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Fixed for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerConfig {
    pub page_size: usize,
}

impl ViewerConfig {
    pub fn new(page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(ViewerError::contract("page size must be positive"));
        }
        Ok(Self { page_size })
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
