//! Headless demo: loads an equirectangular image, orients the sphere and
//! renders one frame to a PNG with the software rasterizer.

use std::path::PathBuf;
use std::process::ExitCode;

use image::Rgba;

use sphere_viewer::grid::GridConfig;
use sphere_viewer::renderer::{SoftwareRasterizer, TileRasterizer};
use sphere_viewer::sphere::SphereConfig;
use sphere_viewer::viewer::{SphereViewer, ViewerMode};

struct Options {
    input: PathBuf,
    output: PathBuf,
    width: u32,
    height: u32,
    grid: GridConfig,
    yaw: f32,
    pitch: f32,
    zoom: f32,
}

fn usage() -> String {
    [
        "usage: sphere_viewer <image> [options]",
        "  --out <path>      output PNG (default out.png)",
        "  --size <WxH>      canvas size in pixels (default 800x800)",
        "  --grid <WxH>      sphere grid resolution (default 30x30)",
        "  --yaw <radians>   rotation about the polar axis (default 0)",
        "  --pitch <radians> tilt, clamped to +-pi/2 (default 0)",
        "  --zoom <factor>   zoom factor, clamped to 0.18..0.8 (default 0.4)",
    ]
    .join("\n")
}

fn parse_pair(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

fn parse_options() -> Result<Options, String> {
    let mut input = None;
    let mut output = PathBuf::from("out.png");
    let mut size = (800u32, 800u32);
    let mut grid = (30usize, 30usize);
    let mut yaw = 0.0f32;
    let mut pitch = 0.0f32;
    let mut zoom = sphere_viewer::INITIAL_ZOOM;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |name: &str| args.next().ok_or(format!("{name} needs a value"));
        match arg.as_str() {
            "--out" => output = PathBuf::from(value("--out")?),
            "--size" => {
                size = parse_pair(&value("--size")?).ok_or("--size expects WxH")?;
            }
            "--grid" => {
                let (w, h) = parse_pair(&value("--grid")?).ok_or("--grid expects WxH")?;
                grid = (w as usize, h as usize);
            }
            "--yaw" => yaw = value("--yaw")?.parse().map_err(|e| format!("--yaw: {e}"))?,
            "--pitch" => {
                pitch = value("--pitch")?
                    .parse()
                    .map_err(|e| format!("--pitch: {e}"))?
            }
            "--zoom" => {
                zoom = value("--zoom")?
                    .parse()
                    .map_err(|e| format!("--zoom: {e}"))?
            }
            _ if input.is_none() && !arg.starts_with("--") => {
                input = Some(PathBuf::from(arg.clone()))
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    let input = input.ok_or("no input image given")?;
    let grid = GridConfig::new(grid.0, grid.1).map_err(|e| e.to_string())?;
    Ok(Options {
        input,
        output,
        width: size.0,
        height: size.1,
        grid,
        yaw,
        pitch,
        zoom,
    })
}

fn run(opts: Options) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("loading {:?}", opts.input);
    let bitmap = image::open(&opts.input)?.to_rgba8();
    log::info!("loaded {}x{} image", bitmap.width(), bitmap.height());

    let mut viewer = SphereViewer::new(SphereConfig {
        grid: opts.grid,
        ..SphereConfig::default()
    });
    viewer.bind(&bitmap)?;
    viewer.set_mode(ViewerMode::Touch);
    viewer.set_rotation(opts.yaw, opts.pitch);
    viewer.set_zoom(opts.zoom);

    let mut raster = SoftwareRasterizer::new(opts.width, opts.height, Rgba([0, 0, 0, 255]));
    let canvas = raster.canvas_size();
    let mut painted = 0usize;
    for cmd in viewer.render(canvas)? {
        raster.draw_tile(cmd.tile, &cmd.quad);
        painted += 1;
    }
    log::info!(
        "painted {painted} of {} tiles at zoom {:.2}",
        opts.grid.width * opts.grid.cell_rows(),
        viewer.zoom()
    );

    raster.into_image().save(&opts.output)?;
    log::info!("wrote {:?}", opts.output);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let opts = match parse_options() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("{e}\n{}", usage());
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = run(opts) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
