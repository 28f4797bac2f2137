#[cfg(feature = "integration-tests")]
use stage_ngin::pipelines::ProgramKind;

#[test]
#[cfg(feature = "integration-tests")]
fn should_compile_builtin_stages_on_a_real_device() {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });
    let adapter = futures::executor::block_on(instance.request_adapter(
        &wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        },
    ))
    .expect("an adapter is available");
    let (device, _queue) = futures::executor::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        },
    ))
    .expect("a device is available");

    for kind in ProgramKind::ALL {
        let (vertex, fragment) = kind.sources();
        for (stage, source) in [("vertex", vertex), ("fragment", fragment)] {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(kind.label()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            let info = futures::executor::block_on(module.get_compilation_info());
            let errors: Vec<_> = info
                .messages
                .iter()
                .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
                .map(|m| m.message.clone())
                .collect();
            assert!(errors.is_empty(), "{} {stage}: {errors:?}", kind.label());
        }
    }
}
