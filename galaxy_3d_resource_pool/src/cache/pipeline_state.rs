/// Pipeline state descriptors and their cache key derivation
///
/// Everything that changes how a graphics pipeline behaves lives here as a
/// plain `Hash + Eq` value. Shaders and binding layouts are referenced by
/// `ResourceId` (slot identity), never by pointer. Depth bias is stored in
/// fixed point so the whole descriptor stays free of floats.

use bitflags::bitflags;
use super::cache_key::{CacheKey, CacheKeyBuilder, KeySource};
use crate::pool::ResourceId;

/// Domain marker for graphics pipeline keys
pub const GRAPHICS_PIPELINE_DOMAIN: u32 = 0x4750_4950; // "GPIP"

/// Fieldless enums write their discriminant
macro_rules! discriminant_key_source {
    ($($ty:ty),* $(,)?) => {
        $(
            impl KeySource for $ty {
                fn write_key(&self, builder: &mut CacheKeyBuilder) {
                    builder.write_discriminant(*self as u32);
                }
            }
        )*
    };
}

// ===== INPUT ASSEMBLY =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    #[default]
    TriangleList,
    TriangleStrip,
    LineList,
    LineStrip,
    PointList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexInputRate {
    Vertex,
    Instance,
}

/// Vertex attribute data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    Unorm8x4,
    Uint32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: VertexFormat,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBinding {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: VertexInputRate,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexLayout {
    pub bindings: Vec<VertexBinding>,
    pub attributes: Vec<VertexAttribute>,
}

// ===== RASTERIZATION =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

/// Depth bias in fixed point: `slope_factor_milli = 1500` means 1.5
///
/// Resolution is 1/1000. Factors closer together than that share one
/// fixed-point value and therefore one cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthBias {
    pub constant_factor: i32,
    pub slope_factor_milli: i32,
    pub clamp_milli: i32,
}

/// `value * 1000` rounded, or None if not finite or outside `i32`
fn to_milli(value: f32) -> Option<i32> {
    let scaled = (f64::from(value) * 1000.0).round();
    let in_range = scaled >= f64::from(i32::MIN) && scaled <= f64::from(i32::MAX);
    (scaled.is_finite() && in_range).then_some(scaled as i32)
}

impl DepthBias {
    /// Convert float factors to fixed point (rounded to 1/1000)
    ///
    /// Returns None if a factor is NaN, infinite, or its fixed-point value
    /// does not fit in an `i32` (beyond about ±2.147e6).
    pub fn from_factors(constant_factor: i32, slope_factor: f32, clamp: f32) -> Option<Self> {
        Some(Self {
            constant_factor,
            slope_factor_milli: to_milli(slope_factor)?,
            clamp_milli: to_milli(clamp)?,
        })
    }

    pub fn slope_factor(&self) -> f32 {
        self.slope_factor_milli as f32 / 1000.0
    }

    pub fn clamp(&self) -> f32 {
        self.clamp_milli as f32 / 1000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterizationState {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub polygon_mode: PolygonMode,
    /// None = disabled
    pub depth_bias: Option<DepthBias>,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            polygon_mode: PolygonMode::Fill,
            depth_bias: None,
        }
    }
}

// ===== DEPTH / STENCIL =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

/// Per-face stencil behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFaceState {
    pub fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub compare_op: CompareOp,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

impl Default for StencilFaceState {
    fn default() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
            compare_mask: 0xFF,
            write_mask: 0xFF,
            reference: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub stencil_test_enable: bool,
    pub front: StencilFaceState,
    pub back: StencilFaceState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare_op: CompareOp::Less,
            stencil_test_enable: false,
            front: StencilFaceState::default(),
            back: StencilFaceState::default(),
        }
    }
}

// ===== COLOR BLEND =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    SrcAlphaSaturate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

bitflags! {
    /// Channels written to a color attachment
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWriteMask: u8 {
        const R = 0b0001;
        const G = 0b0010;
        const B = 0b0100;
        const A = 0b1000;
        const RGB = Self::R.bits() | Self::G.bits() | Self::B.bits();
        const ALL = Self::RGB.bits() | Self::A.bits();
    }
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Blend configuration of one color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorTargetBlend {
    pub blend_enable: bool,
    pub src_color_factor: BlendFactor,
    pub dst_color_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub src_alpha_factor: BlendFactor,
    pub dst_alpha_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
    pub write_mask: ColorWriteMask,
}

impl ColorTargetBlend {
    /// Classic `src * a + dst * (1 - a)`
    pub fn alpha_blending() -> Self {
        Self {
            blend_enable: true,
            src_color_factor: BlendFactor::SrcAlpha,
            dst_color_factor: BlendFactor::OneMinusSrcAlpha,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::OneMinusSrcAlpha,
            ..Self::default()
        }
    }
}

impl Default for ColorTargetBlend {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_color_factor: BlendFactor::One,
            dst_color_factor: BlendFactor::Zero,
            color_blend_op: BlendOp::Add,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
            write_mask: ColorWriteMask::ALL,
        }
    }
}

// ===== MULTISAMPLE =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleCount {
    #[default]
    S1,
    S2,
    S4,
    S8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MultisampleState {
    pub sample_count: SampleCount,
    pub alpha_to_coverage: bool,
}

// ===== OUTPUT COMPATIBILITY =====

/// Attachment formats a pipeline can render into
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    R16G16B16A16_SFLOAT,
    D16_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
}

/// What a pipeline's output must be compatible with
///
/// Two render targets with the same fingerprint can share pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TargetFingerprint {
    pub color_formats: Vec<TextureFormat>,
    pub depth_format: Option<TextureFormat>,
    pub sample_count: SampleCount,
}

discriminant_key_source!(
    PrimitiveTopology,
    VertexInputRate,
    VertexFormat,
    CullMode,
    FrontFace,
    PolygonMode,
    CompareOp,
    StencilOp,
    BlendFactor,
    BlendOp,
    SampleCount,
    TextureFormat,
);

impl KeySource for ColorWriteMask {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder.write_u8(self.bits());
    }
}

impl KeySource for VertexAttribute {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder
            .write_u32(self.location)
            .write_u32(self.binding)
            .write(&self.format)
            .write_u32(self.offset);
    }
}

impl KeySource for VertexBinding {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder
            .write_u32(self.binding)
            .write_u32(self.stride)
            .write(&self.input_rate);
    }
}

impl KeySource for VertexLayout {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder.write_seq(&self.bindings).write_seq(&self.attributes);
    }
}

impl KeySource for DepthBias {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder
            .write_i32(self.constant_factor)
            .write_i32(self.slope_factor_milli)
            .write_i32(self.clamp_milli);
    }
}

impl KeySource for RasterizationState {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder
            .write(&self.cull_mode)
            .write(&self.front_face)
            .write(&self.polygon_mode)
            .write(&self.depth_bias);
    }
}

impl KeySource for StencilFaceState {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder
            .write(&self.fail_op)
            .write(&self.pass_op)
            .write(&self.depth_fail_op)
            .write(&self.compare_op)
            .write_u32(self.compare_mask)
            .write_u32(self.write_mask)
            .write_u32(self.reference);
    }
}

impl KeySource for DepthStencilState {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder
            .write_bool(self.depth_test_enable)
            .write_bool(self.depth_write_enable)
            .write(&self.depth_compare_op)
            .write_bool(self.stencil_test_enable);
        // Stencil faces only matter when the test is on
        if self.stencil_test_enable {
            builder.write(&self.front).write(&self.back);
        }
    }
}

impl KeySource for ColorTargetBlend {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder.write_bool(self.blend_enable);
        // Factors and ops are ignored by the hardware when blending is off
        if self.blend_enable {
            builder
                .write(&self.src_color_factor)
                .write(&self.dst_color_factor)
                .write(&self.color_blend_op)
                .write(&self.src_alpha_factor)
                .write(&self.dst_alpha_factor)
                .write(&self.alpha_blend_op);
        }
        builder.write(&self.write_mask);
    }
}

impl KeySource for MultisampleState {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder
            .write(&self.sample_count)
            .write_bool(self.alpha_to_coverage);
    }
}

impl KeySource for TargetFingerprint {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder
            .write_seq(&self.color_formats)
            .write(&self.depth_format)
            .write(&self.sample_count);
    }
}

// ===== PIPELINE STATE =====

/// Complete description of a graphics pipeline
///
/// `binding_layouts[n]` is the layout of resource set `n`
/// (global constants, pass constants, material constants, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineStateDesc {
    pub vertex_shader: ResourceId,
    pub fragment_shader: ResourceId,
    pub vertex_layout: VertexLayout,
    pub topology: PrimitiveTopology,
    pub binding_layouts: Vec<ResourceId>,
    pub push_constant_size: u32,
    pub rasterization: RasterizationState,
    pub depth_stencil: DepthStencilState,
    pub color_targets: Vec<ColorTargetBlend>,
    pub multisample: MultisampleState,
    pub target: TargetFingerprint,
}

impl PipelineStateDesc {
    /// Default fixed-function state for a shader pair
    pub fn new(vertex_shader: ResourceId, fragment_shader: ResourceId) -> Self {
        Self {
            vertex_shader,
            fragment_shader,
            vertex_layout: VertexLayout::default(),
            topology: PrimitiveTopology::default(),
            binding_layouts: Vec::new(),
            push_constant_size: 0,
            rasterization: RasterizationState::default(),
            depth_stencil: DepthStencilState::default(),
            color_targets: vec![ColorTargetBlend::default()],
            multisample: MultisampleState::default(),
            target: TargetFingerprint {
                color_formats: vec![TextureFormat::B8G8R8A8_SRGB],
                depth_format: Some(TextureFormat::D32_FLOAT),
                sample_count: SampleCount::S1,
            },
        }
    }

    /// Derive the cache key
    pub fn cache_key(&self) -> CacheKey {
        let mut builder = CacheKeyBuilder::new();
        builder.write_domain(GRAPHICS_PIPELINE_DOMAIN);
        self.write_key(&mut builder);
        builder.build()
    }
}

impl KeySource for PipelineStateDesc {
    fn write_key(&self, builder: &mut CacheKeyBuilder) {
        builder
            .write_resource(self.vertex_shader)
            .write_resource(self.fragment_shader)
            .write(&self.vertex_layout)
            .write(&self.topology)
            .write_seq(&self.binding_layouts)
            .write_u32(self.push_constant_size)
            .write(&self.rasterization)
            .write(&self.depth_stencil)
            .write_seq(&self.color_targets)
            .write(&self.multisample)
            .write(&self.target);
    }
}

#[cfg(test)]
#[path = "pipeline_state_tests.rs"]
mod tests;
