//! Pipeline cache module
//!
//! Cache keys, pipeline state descriptors, and the memoization tables that
//! map keys to pooled artifacts.

mod cache_key;
mod pipeline_state;
mod pipeline_cache;
mod shared_pipeline_cache;

pub use cache_key::{CacheKey, CacheKeyBuilder, KeySource};
pub use pipeline_state::{
    GRAPHICS_PIPELINE_DOMAIN,
    PrimitiveTopology, VertexInputRate, VertexFormat, VertexAttribute, VertexBinding, VertexLayout,
    CullMode, FrontFace, PolygonMode, DepthBias, RasterizationState,
    CompareOp, StencilOp, StencilFaceState, DepthStencilState,
    BlendFactor, BlendOp, ColorWriteMask, ColorTargetBlend,
    SampleCount, MultisampleState, TextureFormat, TargetFingerprint,
    PipelineStateDesc,
};
pub use pipeline_cache::{PipelineCache, PipelineCacheConfig, CacheStats};
pub use shared_pipeline_cache::SharedPipelineCache;
