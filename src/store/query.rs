use serde::{Deserialize, Serialize};

use crate::model::{FlowModel, FlowStatus};

/// Filter and page selection for [`FlowStore::query`](super::FlowStore::query).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    /// 1-based page number
    pub page_num: usize,
    pub page_size: usize,
    pub status: Option<FlowStatus>,
    pub creator: Option<String>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            page_num: 1,
            page_size: 20,
            status: None,
            creator: None,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(
        mut self,
        page_num: usize,
        page_size: usize,
    ) -> Self {
        self.page_num = page_num;
        self.page_size = page_size;
        self
    }

    pub fn status(
        mut self,
        status: FlowStatus,
    ) -> Self {
        self.status = Some(status);
        self
    }

    pub fn creator(
        mut self,
        creator: impl Into<String>,
    ) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn matches(
        &self,
        flow: &FlowModel,
    ) -> bool {
        self.status.is_none_or(|s| s == flow.status) && self.creator.as_deref().is_none_or(|c| c == flow.creator)
    }

    /// Offset of the first row of the page; page 0 is treated as page 1.
    pub fn offset(&self) -> usize {
        self.page_num.max(1).saturating_sub(1).saturating_mul(self.page_size)
    }
}
