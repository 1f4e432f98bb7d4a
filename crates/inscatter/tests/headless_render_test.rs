//! Headless rendering integration tests.
//!
//! These tests render through the wgpu backend without a window. They require
//! a GPU adapter (real or software fallback); without one they print a note
//! and return early.

use inscatter::*;
use pollster::FutureExt;

const SIZE: u32 = 64;

fn camera() -> FrameCamera {
    FrameCamera::perspective(
        Vec3::ZERO,
        Vec3::NEG_Z,
        Vec3::Y,
        std::f32::consts::FRAC_PI_3,
        1.0,
        0.1,
        100.0,
    )
}

fn background() -> Vec4 {
    Vec4::new(0.0, 0.0, 0.0, 1.0)
}

fn sphere(name: &str, position: Vec3, diameter: f32, color: Vec3) -> SharedVolume {
    InscatteringVolume::fixed(
        name,
        VolumeTransform::new(position, Vec3::ZERO, diameter),
        color,
    )
    .into_shared()
}

/// All headless checks share one device, created once.
#[test]
fn headless_render_tests() {
    init_logging();

    let gpu = match GpuContext::new_headless().block_on() {
        Ok(gpu) => gpu,
        Err(e) => {
            eprintln!("Skipping headless tests: no GPU adapter available ({e})");
            return;
        }
    };
    let (device, queue) = (&gpu.device, &gpu.queue);

    // --- Test 1: Empty registry leaves the background untouched ---
    {
        let context = Context::default();
        let image =
            render_with_device(device, queue, &context, &camera(), SIZE, SIZE, background())
                .expect("empty frame");
        assert_eq!(image.report.draws, 0);
        assert_eq!(image.pixels.len(), (SIZE * SIZE * 4) as usize);
        assert!(image.pixels.chunks(4).all(|px| px == [0, 0, 0, 255]));
        assert_eq!(image.pixel(SIZE, 0), None);
    }

    // --- Test 2: A centered sphere brightens the center only ---
    {
        let context = Context::default();
        let volume = sphere(
            "center",
            Vec3::new(0.0, 0.0, -4.0),
            2.0,
            Vec3::new(0.5, 0.25, 0.0),
        );
        context.enable_volume(&volume).unwrap();

        let image =
            render_with_device(device, queue, &context, &camera(), SIZE, SIZE, background())
                .expect("sphere frame");
        assert_eq!(image.report.draws, 1);

        let center = image.pixel(SIZE / 2, SIZE / 2).unwrap();
        assert!(center[0] > 100, "center red too dark: {center:?}");
        assert!(center[0] > center[1] && center[1] > center[2]);
        assert_eq!(center[3], 255, "destination alpha must be preserved");
        assert_eq!(image.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    // --- Test 3: Volumes stay upright in every execution context ---
    {
        let above = sphere("above", Vec3::new(0.0, 1.5, -4.0), 1.0, Vec3::ONE);
        let contexts = [
            ("default", InscatteringOptions::default()),
            (
                "editor",
                InscatteringOptions::new().with_context(ExecutionContext::Editor),
            ),
            (
                "player",
                InscatteringOptions::new().with_context(ExecutionContext::Player),
            ),
        ];
        for (label, options) in contexts {
            let context = Context::new(options).unwrap();
            context.enable_volume(&above).unwrap();
            let image =
                render_with_device(device, queue, &context, &camera(), SIZE, SIZE, background())
                    .unwrap();
            assert!(
                image.pixel(SIZE / 2, 11).unwrap()[0] > 0,
                "{label}: volume above the axis must be drawn near the top"
            );
            assert_eq!(image.pixel(SIZE / 2, SIZE - 11).unwrap()[0], 0, "{label}");
        }
    }

    // --- Test 4: Unbound light volumes contribute nothing ---
    {
        let context = Context::default();
        let orphan = InscatteringVolume::light_derived(
            "orphan",
            VolumeTransform::new(Vec3::new(0.0, 0.0, -4.0), Vec3::ZERO, 2.0),
        )
        .into_shared();
        context.enable_volume(&orphan).unwrap();

        let image =
            render_with_device(device, queue, &context, &camera(), SIZE, SIZE, background())
                .unwrap();
        assert_eq!(image.report.draws, 0);
        assert_eq!(image.report.skipped.len(), 1);
        assert_eq!(image.pixel(SIZE / 2, SIZE / 2), Some([0, 0, 0, 255]));
    }

    // --- Test 5: Many volumes in one frame ---
    {
        let context = Context::default();
        let volumes: Vec<SharedVolume> = (0..40)
            .map(|i| {
                sphere(
                    &format!("v{i}"),
                    Vec3::new(0.0, 0.0, -4.0),
                    2.0,
                    Vec3::splat(0.01),
                )
            })
            .collect();
        for volume in &volumes {
            context.enable_volume(volume).unwrap();
        }
        let image =
            render_with_device(device, queue, &context, &camera(), SIZE, SIZE, background())
                .unwrap();
        assert_eq!(image.report.draws, 40);
        assert!(image.pixel(SIZE / 2, SIZE / 2).unwrap()[0] > 0);
    }

    // --- Test 6: Missing shader prevents installation ---
    {
        let context = Context::default();
        let result = InscatteringFeature::create_with_library(
            device,
            HEADLESS_FORMAT,
            &context,
            &ShaderLibrary::empty(),
        );
        assert!(matches!(
            result,
            Err(Error::Render(RenderError::ShaderNotFound(_)))
        ));
    }

    // --- Test 7: Two frames recorded into one encoder keep their own uniforms ---
    {
        let above = sphere("above", Vec3::new(0.0, 1.5, -4.0), 1.0, Vec3::ONE);
        let below = sphere("below", Vec3::new(0.0, -1.5, -4.0), 1.0, Vec3::ONE);
        let first = Context::default();
        first.enable_volume(&above).unwrap();
        let second = Context::default();
        second.enable_volume(&below).unwrap();

        let feature = InscatteringFeature::create(device, HEADLESS_FORMAT, &first).unwrap();
        let target_a = HeadlessTarget::new(device, SIZE, SIZE).unwrap();
        let target_b = HeadlessTarget::new(device, SIZE, SIZE).unwrap();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("two frame encoder"),
        });
        target_a.clear(&mut encoder, background());
        target_b.clear(&mut encoder, background());
        let report_a = feature
            .render(device, queue, &mut encoder, &target_a.frame_target(), &camera(), &first)
            .unwrap();
        let report_b = feature
            .render(device, queue, &mut encoder, &target_b.frame_target(), &camera(), &second)
            .unwrap();
        target_a.copy_to_readback(&mut encoder);
        target_b.copy_to_readback(&mut encoder);
        queue.submit(std::iter::once(encoder.finish()));

        let image_a = target_a.read(device, report_a).unwrap();
        let image_b = target_b.read(device, report_b).unwrap();
        assert!(image_a.pixel(SIZE / 2, 11).unwrap()[0] > 0, "first frame: above");
        assert_eq!(image_a.pixel(SIZE / 2, SIZE - 11).unwrap()[0], 0);
        assert!(image_b.pixel(SIZE / 2, SIZE - 11).unwrap()[0] > 0, "second frame: below");
        assert_eq!(image_b.pixel(SIZE / 2, 11).unwrap()[0], 0);
    }

    // --- Test 8: Oversized targets fail before reaching the device ---
    {
        let too_wide = device.limits().max_texture_dimension_2d + 1;
        assert!(matches!(
            HeadlessTarget::new(device, too_wide, 1),
            Err(Error::Render(RenderError::TextureCreationFailed(_)))
        ));
        let context = Context::default();
        assert!(matches!(
            render_with_device(device, queue, &context, &camera(), too_wide, 1, background()),
            Err(Error::Render(RenderError::TextureCreationFailed(_)))
        ));
    }
}
