/// Integration tests that exercise the full draw path:
/// vertex shader -> screen mapping -> binning -> tile dispatch -> pixels.
use glam::{Vec2, Vec3, Vec4};
use raster_engine::rendering::{Checkerboard, PassThrough, SolidColor};
use raster_engine::*;

const CLEAR: PixelRgba32 = PixelRgba32::BLACK;
const MODES: [DispatchMode; 3] = [
    DispatchMode::Immediate,
    DispatchMode::TiledSerial,
    DispatchMode::TiledParallel,
];

fn make_engine(viewport: Viewport, dispatch: DispatchMode) -> RasterEngine {
    let mut engine = RasterEngine::new(RasterConfig {
        dispatch,
        worker_threads: Some(2),
        ..RasterConfig::default()
    });
    engine.initialize().unwrap();
    engine.set_viewport(viewport.x, viewport.y, viewport.width, viewport.height);
    engine.set_render_target(vec![CLEAR; viewport.pixel_count()]);
    engine.set_depth_buffer(vec![DEPTH_FAR; viewport.pixel_count()]);
    engine.set_shaders(PassThrough, SolidColor(Vec4::ONE));
    engine
}

fn centered_quad(z: f32) -> Mesh {
    Mesh::quad(Vec2::splat(-0.5), Vec2::splat(0.5), z)
}

#[test]
fn quad_covers_exactly_the_four_center_pixels() {
    for mode in MODES {
        let mut engine = make_engine(Viewport::new(0, 0, 4, 4), mode);
        let stats = engine.draw(centered_quad(0.4).vertices()).unwrap();

        let color = engine.color_buffer().unwrap();
        let depth = engine.depth_buffer().unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let i = y * 4 + x;
                let inside = (1..3).contains(&x) && (1..3).contains(&y);
                if inside {
                    assert_eq!(color[i], PixelRgba32::WHITE, "{mode:?} ({x}, {y})");
                    assert!((depth[i] - 0.4).abs() < 1e-6, "{mode:?} ({x}, {y})");
                } else {
                    assert_eq!(color[i], CLEAR, "{mode:?} ({x}, {y})");
                    assert_eq!(depth[i], DEPTH_FAR, "{mode:?} ({x}, {y})");
                }
            }
        }
        assert_eq!(stats.triangles_submitted, 2);
        assert_eq!(stats.pixels_written, 4, "{mode:?}");
    }
}

#[test]
fn clockwise_quad_is_culled() {
    for mode in MODES {
        let mut engine = make_engine(Viewport::new(0, 0, 8, 8), mode);
        let mut vertices = centered_quad(0.4).vertices().to_vec();
        for tri in vertices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }

        let stats = engine.draw(&vertices).unwrap();
        assert_eq!(stats.culled, 2);
        assert_eq!(stats.pixels_written, 0);
        assert_eq!(stats.bin_entries, 0);
        assert!(engine.color_buffer().unwrap().iter().all(|&p| p == CLEAR));
        assert!(engine.depth_buffer().unwrap().iter().all(|&d| d == DEPTH_FAR));
    }
}

#[test]
fn clockwise_front_face_accepts_left_handed_winding() {
    let mut engine = make_engine(Viewport::new(0, 0, 8, 8), DispatchMode::TiledSerial);
    let mut engine_cw = RasterEngine::new(RasterConfig {
        front_face: FrontFace::Clockwise,
        worker_threads: Some(2),
        ..RasterConfig::default()
    });
    engine_cw.initialize().unwrap();
    engine_cw.set_viewport(0, 0, 8, 8);
    engine_cw.set_render_target(vec![CLEAR; 64]);
    engine_cw.set_depth_buffer(vec![DEPTH_FAR; 64]);
    engine_cw.set_shaders(PassThrough, SolidColor(Vec4::ONE));

    let ccw = centered_quad(0.4).vertices().to_vec();
    let mut cw = ccw.clone();
    for tri in cw.chunks_exact_mut(3) {
        tri.swap(1, 2);
    }

    engine.draw(&ccw).unwrap();
    engine_cw.draw(&cw).unwrap();
    assert_eq!(engine.color_buffer(), engine_cw.color_buffer());
    assert_eq!(engine.depth_buffer(), engine_cw.depth_buffer());
}

#[test]
fn depth_outside_coverage_stays_far() {
    let mut engine = make_engine(Viewport::new(0, 0, 32, 32), DispatchMode::TiledParallel);
    let triangle = [
        Vertex::new(Vec3::new(-0.9, -0.7, 0.2)),
        Vertex::new(Vec3::new(0.8, -0.4, 0.6)),
        Vertex::new(Vec3::new(-0.1, 0.9, 0.9)),
    ];
    let stats = engine.draw(&triangle).unwrap();
    assert!(stats.pixels_written > 0);

    let color = engine.color_buffer().unwrap();
    let depth = engine.depth_buffer().unwrap();
    let mut written = 0;
    for (pixel, &d) in color.iter().zip(depth) {
        if *pixel == PixelRgba32::WHITE {
            assert!(d > 0.0 && d <= 1.0);
            written += 1;
        } else {
            assert_eq!(d, DEPTH_FAR);
        }
    }
    assert_eq!(written, stats.pixels_written);
}

#[test]
fn nearer_geometry_wins() {
    for mode in MODES {
        let mut engine = make_engine(Viewport::new(0, 0, 16, 16), mode);
        engine.set_pixel_shader(|f: &Vertex| f.color.extend(1.0));

        let far = centered_quad(0.8).with_color(Vec3::new(1.0, 0.0, 0.0));
        let near = Mesh::quad(Vec2::splat(-1.0), Vec2::splat(0.0), 0.3)
            .with_color(Vec3::new(0.0, 0.0, 1.0));
        engine.draw(near.vertices()).unwrap();
        engine.draw(far.vertices()).unwrap();

        let color = engine.color_buffer().unwrap();
        // (5, 10) is covered by both quads, (10, 5) only by the far one.
        assert_eq!(color[10 * 16 + 5], PixelRgba32::new(0, 0, 255, 255), "{mode:?}");
        assert_eq!(color[5 * 16 + 10], PixelRgba32::new(255, 0, 0, 255), "{mode:?}");
    }
}

#[test]
fn viewport_origin_offsets_output() {
    let viewport = Viewport::new(2, 1, 4, 4);
    let mut engine = make_engine(viewport, DispatchMode::TiledParallel);
    engine.draw(centered_quad(0.4).vertices()).unwrap();

    let stride = viewport.stride();
    let color = engine.color_buffer().unwrap();
    let white: Vec<(usize, usize)> = (0..color.len())
        .filter(|&i| color[i] == PixelRgba32::WHITE)
        .map(|i| (i % stride, i / stride))
        .collect();
    assert_eq!(white, vec![(3, 2), (4, 2), (3, 3), (4, 3)]);
}

#[test]
fn offscreen_triangles_are_dropped() {
    let mut engine = make_engine(Viewport::new(0, 0, 16, 16), DispatchMode::TiledSerial);
    let offscreen = Mesh::quad(Vec2::new(1.5, 1.5), Vec2::new(2.5, 2.5), 0.5);

    let stats = engine.draw(offscreen.vertices()).unwrap();
    assert_eq!(stats.dropped, 2);
    assert_eq!(stats.tiles_dispatched, 0);
    assert_eq!(engine.bins().total_entries(), 0);
}

#[test]
fn bins_are_refilled_every_draw() {
    let mut engine = make_engine(Viewport::new(0, 0, 64, 32), DispatchMode::TiledParallel);
    let full = Mesh::quad(Vec2::splat(-1.0), Vec2::splat(1.0), 0.5);

    let first = engine.draw(full.vertices()).unwrap();
    assert_eq!(first.bin_entries, engine.bins().total_entries());
    assert_eq!(first.tiles_dispatched, engine.tile_rects().len());

    let small = Mesh::quad(Vec2::new(-1.0, 0.5), Vec2::new(-0.6, 1.0), 0.2);
    let second = engine.draw(small.vertices()).unwrap();
    assert_eq!(second.bin_entries, engine.bins().total_entries());
    assert!(second.bin_entries < first.bin_entries);
    assert_eq!(engine.bins().non_empty_tiles().collect::<Vec<_>>(), vec![0]);
}

#[test]
fn zero_w_triangles_are_rejected() {
    let mut engine = make_engine(Viewport::new(0, 0, 8, 8), DispatchMode::TiledParallel);
    let mut vertices = centered_quad(0.4).vertices().to_vec();
    vertices[0].position.w = 0.0;

    let stats = engine.draw(&vertices).unwrap();
    assert_eq!(stats.rejected, 1);
    assert!(stats.pixels_written > 0);
}

#[test]
fn clear_resets_both_buffers() {
    let mut engine = make_engine(Viewport::new(0, 0, 4, 4), DispatchMode::TiledSerial);
    engine.draw(centered_quad(0.4).vertices()).unwrap();

    let gray = PixelRgba32::new(0x32, 0x32, 0x32, 0xFF);
    engine.clear(gray);
    assert!(engine.color_buffer().unwrap().iter().all(|&p| p == gray));
    assert!(engine.depth_buffer().unwrap().iter().all(|&d| d == DEPTH_FAR));

    let color = engine.take_render_target().unwrap();
    assert_eq!(color.len(), 16);
    assert!(matches!(
        engine.draw(centered_quad(0.4).vertices()),
        Err(RasterError::NullBuffer(BufferKind::Color))
    ));
}

#[test]
fn checkerboard_output_is_opaque() {
    let viewport = Viewport::new(0, 0, 64, 64);
    let mut engine = make_engine(viewport, DispatchMode::TiledParallel);
    engine.set_render_target(vec![PixelRgba32::TRANSPARENT; viewport.pixel_count()]);
    engine.set_pixel_shader(Checkerboard {
        squares: 4.0,
        light_dir: Vec3::Z,
    });

    let quad = Mesh::quad(Vec2::splat(-1.0), Vec2::splat(1.0), 0.5);
    let stats = engine.draw(quad.vertices()).unwrap();
    assert_eq!(stats.pixels_written, viewport.pixel_count());

    let color = engine.color_buffer().unwrap();
    assert!(color.iter().all(|p| p.a == 0xFF));
    // Both square colors are present, so dark squares were written too.
    assert!(color.iter().any(|p| p.r == 0));
    assert!(color.iter().any(|p| p.r == 0xFF));
}

mod errors {
    use super::*;

    #[test]
    fn partial_triangle_is_rejected_before_any_write() {
        let mut engine = make_engine(Viewport::new(0, 0, 4, 4), DispatchMode::TiledParallel);
        let mut vertices = centered_quad(0.4).vertices().to_vec();
        vertices.pop();

        assert!(matches!(
            engine.draw(&vertices),
            Err(RasterError::InvalidVertexCount { count: 5 })
        ));
        assert!(engine.color_buffer().unwrap().iter().all(|&p| p == CLEAR));
        assert!(engine.depth_buffer().unwrap().iter().all(|&d| d == DEPTH_FAR));
    }

    #[test]
    fn missing_buffers() {
        let mut engine = make_engine(Viewport::new(0, 0, 4, 4), DispatchMode::TiledSerial);
        engine.take_depth_buffer();
        assert!(matches!(
            engine.draw(&[]),
            Err(RasterError::NullBuffer(BufferKind::Depth))
        ));
    }

    #[test]
    fn buffer_size_must_match_viewport() {
        let mut engine = make_engine(Viewport::new(0, 0, 4, 4), DispatchMode::TiledSerial);
        engine.set_viewport(1, 1, 4, 4);
        match engine.draw(&[]) {
            Err(RasterError::BufferSizeMismatch {
                kind: BufferKind::Color,
                expected: 25,
                actual: 16,
            }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn shaders_must_be_bound() {
        let mut engine = RasterEngine::default();
        engine.initialize().unwrap();
        engine.set_viewport(0, 0, 4, 4);
        engine.set_render_target(vec![CLEAR; 16]);
        engine.set_depth_buffer(vec![DEPTH_FAR; 16]);
        assert!(matches!(engine.draw(&[]), Err(RasterError::ShadersNotBound)));
    }

    #[test]
    fn initialize_is_required() {
        let mut engine = RasterEngine::default();
        engine.set_viewport(0, 0, 4, 4);
        engine.set_render_target(vec![CLEAR; 16]);
        engine.set_depth_buffer(vec![DEPTH_FAR; 16]);
        engine.set_shaders(PassThrough, SolidColor(Vec4::ONE));
        assert!(matches!(engine.draw(&[]), Err(RasterError::NotInitialized)));
    }

    #[test]
    fn errors_name_the_missing_binding_on_real_geometry() {
        let quad = centered_quad(0.4);

        let mut engine = make_engine(Viewport::new(0, 0, 4, 4), DispatchMode::TiledParallel);
        engine.take_depth_buffer();
        assert!(matches!(
            engine.draw(quad.vertices()),
            Err(RasterError::NullBuffer(BufferKind::Depth))
        ));
        assert!(engine.color_buffer().unwrap().iter().all(|&p| p == CLEAR));

        let mut engine = RasterEngine::default();
        engine.set_viewport(0, 0, 4, 4);
        engine.set_render_target(vec![CLEAR; 16]);
        engine.set_depth_buffer(vec![DEPTH_FAR; 16]);
        engine.set_shaders(PassThrough, SolidColor(Vec4::ONE));
        assert!(matches!(engine.draw(quad.vertices()), Err(RasterError::NotInitialized)));
        assert!(engine.color_buffer().unwrap().iter().all(|&p| p == CLEAR));
    }

    #[test]
    fn empty_viewport_is_an_error() {
        let mut engine = make_engine(Viewport::new(0, 0, 0, 4), DispatchMode::TiledParallel);
        assert!(matches!(engine.draw(&[]), Err(RasterError::EmptyViewport)));
    }

    #[test]
    fn empty_draw_is_fine() {
        let mut engine = make_engine(Viewport::new(0, 0, 4, 4), DispatchMode::TiledParallel);
        let stats = engine.draw(&[]).unwrap();
        assert_eq!(stats.triangles_submitted, 0);
        assert_eq!(stats.pixels_written, 0);
    }
}
