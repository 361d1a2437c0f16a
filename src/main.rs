/// Headless demo: renders a spinning mesh for a number of frames and writes
/// the final color and depth buffers as PNG images.
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glam::{Mat4, Vec2, Vec3};
use mimalloc::MiMalloc;
use raster_engine::rendering::framebuffer::{depth_to_debug_pixels, outline_rect};
use raster_engine::rendering::{Checkerboard, MvpVertexShader, NormalDebug, VertexColor};
use raster_engine::*;
use std::path::{Path, PathBuf};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const CLEAR_COLOR: PixelRgba32 = PixelRgba32::new(0x32, 0x32, 0x32, 0xFF);
const OVERLAY_COLOR: PixelRgba32 = PixelRgba32::new(0xFF, 0xD0, 0x00, 0xFF);
/// Stretches the narrow depth range of the scene in the debug view
const DEPTH_DEBUG_SCALE: f32 = 1.9;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MeshKind {
    Cube,
    Sphere,
    Quad,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DispatchArg {
    Immediate,
    Serial,
    Parallel,
}

impl From<DispatchArg> for DispatchMode {
    fn from(arg: DispatchArg) -> Self {
        match arg {
            DispatchArg::Immediate => DispatchMode::Immediate,
            DispatchArg::Serial => DispatchMode::TiledSerial,
            DispatchArg::Parallel => DispatchMode::TiledParallel,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ShaderKind {
    Checker,
    Normals,
    Color,
}

#[derive(Parser, Debug)]
#[command(name = "raster-demo")]
#[command(about = "Tile-binned CPU rasterizer demo")]
struct Cli {
    #[arg(long, default_value_t = 1280)]
    width: usize,

    #[arg(long, default_value_t = 720)]
    height: usize,

    /// Frames to render; the mesh turns a little every frame
    #[arg(short, long, default_value_t = 60)]
    frames: usize,

    /// Rotation per frame in radians
    #[arg(long, default_value_t = 0.014)]
    spin: f32,

    #[arg(short, long, value_enum, default_value_t = MeshKind::Cube)]
    mesh: MeshKind,

    #[arg(short, long, value_enum, default_value_t = ShaderKind::Checker)]
    shader: ShaderKind,

    #[arg(short, long, value_enum, default_value_t = DispatchArg::Parallel)]
    dispatch: DispatchArg,

    /// Worker threads (defaults to the detected core count)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Tile grid as columns and rows, e.g. `--tiles 16 8`
    #[arg(long, num_args = 2, value_names = ["COLS", "ROWS"])]
    tiles: Option<Vec<usize>>,

    /// Use left-handed view and projection matrices; front faces are then
    /// clockwise in NDC
    #[arg(long)]
    left_handed: bool,

    /// Color image output
    #[arg(short, long, default_value = "frame.png")]
    output: PathBuf,

    /// Depth debug image output
    #[arg(long)]
    depth_output: Option<PathBuf>,

    /// Outline the tile grid in the color image
    #[arg(long)]
    overlay: bool,

    /// Log filter, e.g. "debug" or "raster_engine=trace"
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let config = RasterConfig {
        dispatch: cli.dispatch.into(),
        front_face: if cli.left_handed {
            FrontFace::Clockwise
        } else {
            FrontFace::CounterClockwise
        },
        worker_threads: cli.workers,
        tile_grid: cli.tiles.as_deref().map(|t| (t[0], t[1])),
        ..RasterConfig::default()
    };

    let mut engine = RasterEngine::new(config);
    engine.initialize().context("initializing raster engine")?;
    engine.set_viewport(0, 0, cli.width, cli.height);
    engine.set_render_target(vec![CLEAR_COLOR; cli.width * cli.height]);
    engine.set_depth_buffer(vec![DEPTH_FAR; cli.width * cli.height]);

    match cli.shader {
        ShaderKind::Checker => engine.set_shaders(MvpVertexShader, Checkerboard::default()),
        ShaderKind::Normals => engine.set_shaders(MvpVertexShader, NormalDebug),
        ShaderKind::Color => engine.set_shaders(MvpVertexShader, VertexColor),
    }

    let mesh = match cli.mesh {
        MeshKind::Cube => Mesh::cube(1.0),
        MeshKind::Sphere => Mesh::uv_sphere(1.3, 24, 48),
        MeshKind::Quad => Mesh::quad(Vec2::splat(-1.5), Vec2::splat(1.5), 0.0),
    }
    .with_color(Vec3::new(0.9, 0.55, 0.2));

    log::info!(
        "Rendering {:?} ({} triangles) at {}x{} for {} frames, {:?} dispatch",
        cli.mesh,
        mesh.triangle_count(),
        cli.width,
        cli.height,
        cli.frames,
        engine.config().dispatch
    );

    let (view, projection) = camera(&cli);
    let mut total_ms = 0.0f32;
    let mut last = DrawStats::default();

    for frame in 0..cli.frames.max(1) {
        let model = Mat4::from_rotation_y(frame as f32 * cli.spin);
        engine.clear(CLEAR_COLOR);
        engine.set_transforms(model, view, projection);

        last = engine.draw(mesh.vertices())?;
        total_ms += last.elapsed_ms();

        log::debug!(
            "frame {frame}: {} px, {} tiles, {:.3}ms",
            last.pixels_written,
            last.tiles_dispatched,
            last.elapsed_ms()
        );
    }

    let frames = cli.frames.max(1);
    log::info!(
        "Average draw: {:.3}ms over {} frames (last: {} culled, {} bin entries, {} px, ~{} cycles)",
        total_ms / frames as f32,
        frames,
        last.culled,
        last.bin_entries,
        last.pixels_written,
        last.cycles
    );

    #[cfg(feature = "profiling")]
    FUNCTION_COUNTERS.snapshot().log_report();

    let mut color = engine
        .take_render_target()
        .context("render target was not bound")?;
    if cli.overlay {
        let stride = engine.viewport().stride();
        for rect in engine.tile_rects() {
            outline_rect(&mut color, stride, rect, OVERLAY_COLOR);
        }
    }
    write_png(&cli.output, &color, cli.width, cli.height)?;
    log::info!("Wrote {}", cli.output.display());

    if let Some(path) = &cli.depth_output {
        let depth = engine
            .depth_buffer()
            .context("depth buffer was not bound")?;
        write_png(path, &depth_to_debug_pixels(depth, DEPTH_DEBUG_SCALE), cli.width, cli.height)?;
        log::info!("Wrote {}", path.display());
    }

    Ok(())
}

/// View and projection for a camera at (0, 2, 5) looking at the origin
fn camera(cli: &Cli) -> (Mat4, Mat4) {
    let eye = Vec3::new(0.0, 2.0, 5.0);
    let fov = 75f32.to_radians();
    let aspect = cli.width as f32 / cli.height.max(1) as f32;
    let (near, far) = (0.05, 10.0);

    if cli.left_handed {
        (
            Mat4::look_at_lh(eye, Vec3::ZERO, Vec3::Y),
            Mat4::perspective_lh(fov, aspect, near, far),
        )
    } else {
        (
            Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y),
            Mat4::perspective_rh(fov, aspect, near, far),
        )
    }
}

fn write_png(path: &Path, pixels: &[PixelRgba32], width: usize, height: usize) -> Result<()> {
    let bytes: Vec<u8> = pixels.iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect();
    let image = image::RgbaImage::from_raw(width as u32, height as u32, bytes)
        .context("pixel buffer does not match image size")?;
    image
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
