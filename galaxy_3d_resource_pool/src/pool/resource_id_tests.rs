/// Tests for ResourceKind and ResourceId

use super::*;

struct Shader;
impl PoolResource for Shader {
    const KIND: ResourceKind = ResourceKind::Shader;
}

struct Texture;
impl PoolResource for Texture {
    const KIND: ResourceKind = ResourceKind::Texture;
}

#[test]
fn test_kind_codes_are_unique() {
    let kinds = [
        ResourceKind::Buffer,
        ResourceKind::Texture,
        ResourceKind::Sampler,
        ResourceKind::Shader,
        ResourceKind::BindingLayout,
        ResourceKind::BindingGroup,
        ResourceKind::RenderPass,
        ResourceKind::Framebuffer,
        ResourceKind::Custom(0),
        ResourceKind::Custom(1),
    ];
    let mut codes: Vec<u64> = kinds.iter().map(|k| k.code()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), kinds.len());
}

#[test]
fn test_custom_code_carries_payload() {
    assert_eq!(ResourceKind::Custom(77).code() & 0xFFFF_FFFF, 77);
}

#[test]
fn test_id_of_handle() {
    let handle: Handle<Shader> = Handle::from_raw_parts(2, 5);
    let id = ResourceId::of(handle);
    assert_eq!(id.kind(), ResourceKind::Shader);
    assert_eq!(id.index(), 2);
    assert_eq!(id.generation(), 5);
    assert_eq!(ResourceId::from(handle), id);
}

#[test]
fn test_same_slot_different_kind_is_distinct() {
    let shader = ResourceId::of(Handle::<Shader>::from_raw_parts(0, 1));
    let texture = ResourceId::of(Handle::<Texture>::from_raw_parts(0, 1));
    assert_ne!(shader, texture);
}

#[test]
fn test_to_handle_checks_kind() {
    let id = ResourceId::of(Handle::<Shader>::from_raw_parts(3, 4));
    assert_eq!(id.to_handle::<Shader>(), Some(Handle::from_raw_parts(3, 4)));
    assert!(id.to_handle::<Texture>().is_none());
}
