//! Storage layer for persisting flow definitions.
//!
//! Engines talk to the [`FlowStore`] trait; [`MemStore`] is the in-memory
//! implementation used by default and in tests.

mod mem;
mod query;

use serde::{Deserialize, Serialize};

use crate::{Result, model::FlowModel};

pub use mem::MemStore;
pub use query::Query;

/// Paginated query result.
#[derive(Debug, Deserialize, Serialize)]
pub struct PageData<T> {
    /// Total number of matching records.
    pub count: usize,
    /// Current page number (1-based).
    pub page_num: usize,
    /// Total number of pages.
    pub page_count: usize,
    /// Number of records per page.
    pub page_size: usize,
    /// Records in the current page.
    pub rows: Vec<T>,
}

/// Persistence for flow definitions.
pub trait FlowStore: Send + Sync {
    /// Checks if a flow with the given ID exists.
    fn exists(
        &self,
        id: &str,
    ) -> Result<bool>;

    /// Finds a flow by ID, failing with `NotFound` when absent.
    fn find(
        &self,
        id: &str,
    ) -> Result<FlowModel>;

    /// Queries flows with pagination and filtering.
    fn query(
        &self,
        query: &Query,
    ) -> Result<PageData<FlowModel>>;

    /// Creates a new flow; the id must not be taken.
    fn create(
        &self,
        data: &FlowModel,
    ) -> Result<bool>;

    /// Replaces an existing flow.
    fn update(
        &self,
        data: &FlowModel,
    ) -> Result<bool>;

    /// Deletes a flow by ID, returning whether it existed.
    fn delete(
        &self,
        id: &str,
    ) -> Result<bool>;
}
