//! Frame execution tests against a recording backend.
//!
//! These exercise the acquire/configure/draw/release sequence without a GPU.

use glam::{Mat4, Vec3};
use inscatter_core::{
    InscatteringOptions, InscatteringVolume, SharedVolume, TargetFilter, VolumeRegistry,
    VolumeTransform,
};
use inscatter_render::{
    run_frame, CompositeBackend, FrameCamera, GlobalParams, RenderError, RenderResult,
    TargetDescriptor, VolumeDraw,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Acquire(u32, u32, TargetFilter),
    Configure(usize),
    Draw(usize, String),
    Release(u32),
}

#[derive(Default)]
struct RecordingBackend {
    events: Vec<Event>,
    globals: Option<GlobalParams>,
    draws: Vec<VolumeDraw>,
    next_handle: u32,
    fail_acquire: bool,
    fail_configure: bool,
    fail_draw_at: Option<usize>,
    panic_draw_at: Option<usize>,
}

impl RecordingBackend {
    fn releases(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Release(_)))
            .count()
    }
}

impl CompositeBackend for RecordingBackend {
    type Temporary = u32;

    fn acquire_temporary(
        &mut self,
        target: &TargetDescriptor,
        filter: TargetFilter,
    ) -> RenderResult<u32> {
        if self.fail_acquire {
            return Err(RenderError::TextureCreationFailed("out of memory".into()));
        }
        self.events
            .push(Event::Acquire(target.width, target.height, filter));
        self.next_handle += 1;
        Ok(self.next_handle)
    }

    fn configure(&mut self, globals: &GlobalParams, draw_count: usize) -> RenderResult<()> {
        if self.fail_configure {
            return Err(RenderError::InvalidFrame("configure rejected".into()));
        }
        self.events.push(Event::Configure(draw_count));
        self.globals = Some(*globals);
        Ok(())
    }

    fn draw_volume(
        &mut self,
        _temporary: &u32,
        index: usize,
        draw: &VolumeDraw,
    ) -> RenderResult<()> {
        if self.panic_draw_at == Some(index) {
            panic!("backend panicked on draw {index}");
        }
        if self.fail_draw_at == Some(index) {
            return Err(RenderError::DrawFailed(format!("draw {index}")));
        }
        self.events.push(Event::Draw(index, draw.name.clone()));
        self.draws.push(draw.clone());
        Ok(())
    }

    fn release_temporary(&mut self, temporary: u32) {
        self.events.push(Event::Release(temporary));
    }
}

fn camera() -> FrameCamera {
    FrameCamera::perspective(
        Vec3::new(0.0, 1.0, 5.0),
        Vec3::ZERO,
        Vec3::Y,
        std::f32::consts::FRAC_PI_3,
        4.0 / 3.0,
        0.1,
        50.0,
    )
}

fn target() -> TargetDescriptor {
    TargetDescriptor::new(640, 480, wgpu::TextureFormat::Rgba16Float)
}

fn fixed(name: &str, x: f32) -> SharedVolume {
    InscatteringVolume::fixed(
        name,
        VolumeTransform::new(Vec3::new(x, 0.0, 0.0), Vec3::ZERO, 2.0),
        Vec3::new(1.0, 0.8, 0.6),
    )
    .into_shared()
}

#[test]
fn test_single_volume_frame_sequence() {
    let volume = fixed("A", 0.0);
    let mut backend = RecordingBackend::default();

    let report = run_frame(
        &mut backend,
        &camera(),
        &target(),
        &[volume],
        &InscatteringOptions::default(),
    )
    .expect("frame should succeed");

    assert_eq!(report.draws, 1);
    assert!(report.skipped.is_empty());
    assert_eq!(
        backend.events,
        vec![
            Event::Acquire(640, 480, TargetFilter::Nearest),
            Event::Configure(1),
            Event::Draw(0, "A".into()),
            Event::Release(1),
        ]
    );
    assert_eq!(backend.draws[0].radius, 1.0);
    assert_eq!(backend.draws[0].pass_index, 0);
}

#[test]
fn test_empty_registry_still_acquires_and_releases() {
    let mut backend = RecordingBackend::default();
    let report = run_frame(
        &mut backend,
        &camera(),
        &target(),
        &[],
        &InscatteringOptions::default(),
    )
    .unwrap();

    assert_eq!(report.draws, 0);
    assert_eq!(
        backend.events,
        vec![
            Event::Acquire(640, 480, TargetFilter::Nearest),
            Event::Configure(0),
            Event::Release(1),
        ]
    );
}

#[test]
fn test_draws_in_registry_order() {
    let (a, b, c) = (fixed("A", -1.0), fixed("B", 0.0), fixed("C", 1.0));
    let mut registry = VolumeRegistry::new();
    registry.add(&a).unwrap();
    registry.add(&b).unwrap();
    registry.add(&c).unwrap();
    registry.remove(&b);

    let mut backend = RecordingBackend::default();
    run_frame(
        &mut backend,
        &camera(),
        &target(),
        &registry.all(),
        &InscatteringOptions::default(),
    )
    .unwrap();

    let drawn: Vec<&str> = backend.draws.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(drawn, ["A", "C"]);
}

#[test]
fn test_draw_failure_releases_temporary() {
    let volumes = [fixed("A", 0.0), fixed("B", 1.0), fixed("C", 2.0)];
    let mut backend = RecordingBackend {
        fail_draw_at: Some(1),
        ..Default::default()
    };

    let result = run_frame(
        &mut backend,
        &camera(),
        &target(),
        &volumes,
        &InscatteringOptions::default(),
    );

    assert!(matches!(result, Err(RenderError::DrawFailed(_))));
    assert_eq!(backend.draws.len(), 1);
    assert_eq!(backend.releases(), 1);
    assert_eq!(backend.events.last(), Some(&Event::Release(1)));
}

#[test]
fn test_configure_failure_releases_temporary() {
    let mut backend = RecordingBackend {
        fail_configure: true,
        ..Default::default()
    };
    let result = run_frame(
        &mut backend,
        &camera(),
        &target(),
        &[fixed("A", 0.0)],
        &InscatteringOptions::default(),
    );

    assert!(result.is_err());
    assert!(backend.draws.is_empty());
    assert_eq!(backend.releases(), 1);
}

#[test]
fn test_invalid_camera_releases_temporary() {
    let broken = FrameCamera::new(Vec3::ZERO, Mat4::IDENTITY, Mat4::ZERO, 10.0);
    let mut backend = RecordingBackend::default();
    let result = run_frame(
        &mut backend,
        &broken,
        &target(),
        &[fixed("A", 0.0)],
        &InscatteringOptions::default(),
    );

    assert!(matches!(result, Err(RenderError::InvalidFrame(_))));
    assert_eq!(
        backend.events,
        vec![
            Event::Acquire(640, 480, TargetFilter::Nearest),
            Event::Release(1),
        ]
    );
}

#[test]
fn test_acquire_failure_has_nothing_to_release() {
    let mut backend = RecordingBackend {
        fail_acquire: true,
        ..Default::default()
    };
    let result = run_frame(
        &mut backend,
        &camera(),
        &target(),
        &[fixed("A", 0.0)],
        &InscatteringOptions::default(),
    );

    assert!(matches!(result, Err(RenderError::TextureCreationFailed(_))));
    assert!(backend.events.is_empty());
}

#[test]
fn test_panic_during_draw_releases_temporary() {
    let mut backend = RecordingBackend {
        panic_draw_at: Some(0),
        ..Default::default()
    };
    let volumes = [fixed("A", 0.0)];

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        run_frame(
            &mut backend,
            &camera(),
            &target(),
            &volumes,
            &InscatteringOptions::default(),
        )
    }));

    assert!(outcome.is_err());
    assert_eq!(backend.releases(), 1);
}

#[test]
fn test_each_frame_gets_a_fresh_temporary() {
    let mut backend = RecordingBackend::default();
    for _ in 0..3 {
        run_frame(
            &mut backend,
            &camera(),
            &target(),
            &[fixed("A", 0.0)],
            &InscatteringOptions::default(),
        )
        .unwrap();
    }
    let released: Vec<u32> = backend
        .events
        .iter()
        .filter_map(|e| match e {
            Event::Release(h) => Some(*h),
            _ => None,
        })
        .collect();
    assert_eq!(released, [1, 2, 3]);
}

#[test]
fn test_unbound_volume_reported_as_skipped() {
    let orphan =
        InscatteringVolume::light_derived("orphan", VolumeTransform::default()).into_shared();
    let mut backend = RecordingBackend::default();
    let report = run_frame(
        &mut backend,
        &camera(),
        &target(),
        &[orphan, fixed("A", 0.0)],
        &InscatteringOptions::default(),
    )
    .unwrap();

    assert_eq!(report.draws, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "orphan");
    assert_eq!(backend.events[1], Event::Configure(1));
}

#[test]
fn test_linear_filter_requested_from_options() {
    let mut backend = RecordingBackend::default();
    let options = InscatteringOptions::default().with_temporary_filter(TargetFilter::Linear);
    run_frame(&mut backend, &camera(), &target(), &[], &options).unwrap();
    assert_eq!(
        backend.events[0],
        Event::Acquire(640, 480, TargetFilter::Linear)
    );
}
