/// Tests for ResourceContext
///
/// The ordering test records every teardown in a shared log so it can check
/// that pipelines go before the resources they were built from.

use super::*;
use crate::cache::CacheKey;
use crate::mock_backend::{destroy_with, MockBuffer, MockDevice, MockPipeline, MockShader};
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn key(value: u32) -> CacheKey {
    CacheKey::builder().write_u32(value).build()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_shutdown_releases_everything() {
    let device = MockDevice::new();
    let mut context: ResourceContext<MockPipeline> = ResourceContext::new();
    context.pipelines_mut().set_teardown(destroy_with::<MockPipeline>(&device));
    context
        .registry_mut()
        .set_teardown::<MockBuffer, _>(destroy_with::<MockBuffer>(&device))
        .unwrap();

    context.registry_mut().register(device.create_buffer(64)).unwrap();
    context
        .pipelines_mut()
        .get_or_create(key(1), || Ok::<_, String>(device.create_pipeline("p")))
        .unwrap();

    assert_eq!(context.shutdown(), 2);
    assert_eq!(device.alive(), 0);
    assert_eq!(context.shutdown(), 0);
}

#[test]
fn test_pipelines_torn_down_before_resources() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let device = MockDevice::new();
    let mut context: ResourceContext<MockPipeline> = ResourceContext::new();

    let log = order.clone();
    context.pipelines_mut().set_teardown(move |_: MockPipeline| {
        log.lock().unwrap().push("pipeline");
    });
    let log = order.clone();
    context
        .registry_mut()
        .set_teardown::<MockShader, _>(move |_: MockShader| {
            log.lock().unwrap().push("shader");
        })
        .unwrap();

    let shader = context.registry_mut().register(device.create_shader("main")).unwrap();
    let shader_id = context.registry().resource_id(shader).unwrap();
    let pipeline_key = CacheKey::builder().write_resource(shader_id).build();
    context
        .pipelines_mut()
        .get_or_create(pipeline_key, || Ok::<_, String>(device.create_pipeline("p")))
        .unwrap();

    context.shutdown();
    assert_eq!(*order.lock().unwrap(), vec!["pipeline", "shader"]);
}

#[test]
fn test_drop_runs_shutdown() {
    let device = MockDevice::new();
    {
        let mut context: ResourceContext<MockPipeline> = ResourceContext::new();
        context.pipelines_mut().set_teardown(destroy_with::<MockPipeline>(&device));
        for i in 0..3 {
            context
                .pipelines_mut()
                .get_or_create(key(i), || Ok::<_, String>(device.create_pipeline("p")))
                .unwrap();
        }
        assert_eq!(context.pipelines().len(), 3);
    }
    assert_eq!(device.alive(), 0);
}
