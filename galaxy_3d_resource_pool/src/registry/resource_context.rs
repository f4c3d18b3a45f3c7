/// ResourceContext - explicitly owned registry and pipeline cache.
///
/// Whoever owns the device owns one of these. Dropping it tears down every
/// cached pipeline before the raw resources those pipelines were built from.

use crate::cache::{PipelineCache, PipelineCacheConfig};
use crate::engine_info;
use super::ResourceRegistry;

const SOURCE: &str = "galaxy3d::ResourceContext";

pub struct ResourceContext<A> {
    registry: ResourceRegistry,
    pipelines: PipelineCache<A>,
}

impl<A> ResourceContext<A> {
    pub fn new() -> Self {
        Self::with_config(PipelineCacheConfig::default())
    }

    pub fn with_config(config: PipelineCacheConfig) -> Self {
        Self {
            registry: ResourceRegistry::new(),
            pipelines: PipelineCache::with_config(config),
        }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.registry
    }

    pub fn pipelines(&self) -> &PipelineCache<A> {
        &self.pipelines
    }

    pub fn pipelines_mut(&mut self) -> &mut PipelineCache<A> {
        &mut self.pipelines
    }

    /// Release every pipeline, then every registered resource
    ///
    /// Returns the total number of objects torn down. Safe to call more
    /// than once; `Drop` calls it too.
    pub fn shutdown(&mut self) -> usize {
        let pipelines = self.pipelines.clear();
        let resources = self.registry.clear();
        if pipelines + resources > 0 {
            engine_info!(SOURCE, "Shutdown released {} pipelines and {} resources",
                pipelines, resources);
        }
        pipelines + resources
    }
}

impl<A> Default for ResourceContext<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Drop for ResourceContext<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "resource_context_tests.rs"]
mod tests;
