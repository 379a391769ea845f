use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use tracing::trace;

use crate::{
    AgentflowError, Result, ShareLock,
    model::FlowModel,
    store::{FlowStore, PageData, Query},
};

/// Keeps flows in a process-local map.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    flows: ShareLock<HashMap<String, FlowModel>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            flows: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl FlowStore for MemStore {
    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        trace!("mem::flows::exists({})", id);
        let flows = self.flows.read().map_err(|e| AgentflowError::Store(e.to_string()))?;
        Ok(flows.contains_key(id))
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<FlowModel> {
        trace!("mem::flows::find({})", id);
        let flows = self.flows.read().map_err(|e| AgentflowError::Store(e.to_string()))?;
        flows.get(id).cloned().ok_or_else(|| AgentflowError::NotFound(id.to_string()))
    }

    fn query(
        &self,
        query: &Query,
    ) -> Result<PageData<FlowModel>> {
        trace!("mem::flows::query({:?})", query);
        let flows = self.flows.read().map_err(|e| AgentflowError::Store(e.to_string()))?;

        let mut matched: Vec<&FlowModel> = flows.values().filter(|f| query.matches(f)).collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let count = matched.len();
        let page_count = count.div_ceil(query.page_size.max(1));
        let rows = matched.into_iter().skip(query.offset()).take(query.page_size).cloned().collect();

        Ok(PageData {
            count,
            page_num: query.page_num.max(1),
            page_count,
            page_size: query.page_size,
            rows,
        })
    }

    fn create(
        &self,
        data: &FlowModel,
    ) -> Result<bool> {
        trace!("mem::flows::create({})", data.id);
        let mut flows = self.flows.write().map_err(|e| AgentflowError::Store(e.to_string()))?;
        if flows.contains_key(&data.id) {
            return Err(AgentflowError::Store(format!("flow {} already exists", data.id)));
        }
        flows.insert(data.id.clone(), data.clone());
        Ok(true)
    }

    fn update(
        &self,
        data: &FlowModel,
    ) -> Result<bool> {
        trace!("mem::flows::update({})", data.id);
        let mut flows = self.flows.write().map_err(|e| AgentflowError::Store(e.to_string()))?;
        match flows.get_mut(&data.id) {
            Some(flow) => {
                *flow = data.clone();
                Ok(true)
            }
            None => Err(AgentflowError::NotFound(data.id.clone())),
        }
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        trace!("mem::flows::delete({})", id);
        let mut flows = self.flows.write().map_err(|e| AgentflowError::Store(e.to_string()))?;
        Ok(flows.remove(id).is_some())
    }
}
