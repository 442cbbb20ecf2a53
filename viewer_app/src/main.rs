//! Headless viewer driver
//!
//! Loads a mesh (or builds a demo dental arch), runs a scripted interaction
//! through the viewer on a recording device and reports what the device saw.
//!
//! ```text
//! viewer_app [MESH] [--config FILE] [--out FILE] [--binary] [--color]
//! ```

use std::rc::Rc;

use clap::{Arg, ArgAction, ArgMatches, Command};
use dental_scene::config::ConfigError;
use dental_scene::foundation::logging;
use dental_scene::io::{self, MeshData, WriteOptions};
use dental_scene::prelude::*;
use thiserror::Error;

const FRAME_S: f64 = 1.0 / 60.0;
const MAX_FRAMES: usize = 600;
const TEETH: usize = 14;

#[derive(Error, Debug)]
enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Mesh(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    mesh: Option<String>,
    config: Option<String>,
    out: Option<String>,
    binary: bool,
    color: bool,
}

fn command() -> Command {
    Command::new("viewer_app")
        .about("Runs a scripted orbit, zoom and home flight over a mesh on a recording device")
        .arg(
            Arg::new("mesh")
                .value_name("MESH")
                .help("OBJ, PLY or STL file to load; a demo arch is built when omitted"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Viewer settings, .toml or .ron"),
        )
        .arg(
            Arg::new("out")
                .short('o')
                .long("out")
                .value_name("FILE")
                .help("Write the loaded geometry here after the run"),
        )
        .arg(
            Arg::new("binary")
                .long("binary")
                .help("Write binary PLY or STL")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("color")
                .long("color")
                .help("Write face colours into binary STL")
                .action(ArgAction::SetTrue),
        )
}

impl Args {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            mesh: matches.get_one::<String>("mesh").cloned(),
            config: matches.get_one::<String>("config").cloned(),
            out: matches.get_one::<String>("out").cloned(),
            binary: matches.get_flag("binary"),
            color: matches.get_flag("color"),
        }
    }
}

/// Box standing in for a tooth crown, `size` across, ivory
fn tooth(size: Vec3) -> Geometry {
    let half = size / 2.0;
    let positions = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 == 0 { -half.x } else { half.x },
                if i & 2 == 0 { 0.0 } else { size.y },
                if i & 4 == 0 { -half.z } else { half.z },
            )
        })
        .collect();
    let mesh = MeshData {
        positions,
        colors: vec![Vec4::new(0.95, 0.93, 0.85, 1.0); 8],
        triangles: vec![
            [0, 2, 3], [0, 3, 1],
            [4, 5, 7], [4, 7, 6],
            [0, 1, 5], [0, 5, 4],
            [2, 6, 7], [2, 7, 3],
            [0, 4, 6], [0, 6, 2],
            [1, 3, 7], [1, 7, 5],
        ],
        ..MeshData::default()
    };
    mesh.into_geometry("tooth")
}

/// Teeth along a horseshoe, molars wider than incisors, one shared crown
fn build_arch(viewer: &mut Viewer<RecordingDevice>) -> Option<GeometryId> {
    let graph = viewer.graph_mut();
    let root = graph.root();
    let crown = graph.add_geometry(tooth(Vec3::new(1.0, 8.0, 1.0)));

    for i in 0..TEETH {
        let t = i as f32 / (TEETH - 1) as f32 * 2.0 - 1.0;
        let angle = t * 80.0_f32.to_radians();
        let width = 5.0 + 3.0 * t.abs();
        let position = Vec3::new(25.0 * angle.sin(), 0.0, -20.0 * angle.cos());

        let mut node = Node::new(format!("tooth_{}", i + 1));
        node.set_mv(
            Mat4::new_translation(&position)
                * Quat::from_axis_angle(&Vec3::y_axis(), -angle).to_homogeneous()
                * Mat4::new_nonuniform_scaling(&Vec3::new(width, 1.0, 7.0)),
        );
        let node = graph.add_node_to(root, node)?;
        graph.attach_geometry(node, crown);
    }
    graph.dirty_bounding(root);
    log::info!("Built demo arch with {} teeth", TEETH);
    Some(crown)
}

/// Run frames until the viewer goes idle, advancing the clock between them
fn settle(viewer: &mut Viewer<RecordingDevice>, clock: &ManualClock) -> usize {
    let mut frames = 0;
    while frames < MAX_FRAMES {
        frames += 1;
        if !viewer.frame() {
            break;
        }
        clock.advance(FRAME_S);
    }
    frames
}

fn orbit(viewer: &mut Viewer<RecordingDevice>, clock: &ManualClock) {
    let queue = viewer.events();
    let config = viewer.config().viewport;
    let center = Vec2::new(config.width as f32 / 2.0, config.height as f32 / 2.0);

    queue.push(Event::pointer(EventType::PointerPress, Buttons::LEFT, center));
    for step in 1..=10 {
        let point = center + Vec2::new(step as f32 * 8.0, step as f32 * 2.0);
        queue.push(Event::pointer(EventType::PointerMove, Buttons::LEFT, point));
    }
    queue.push(Event::pointer(EventType::PointerRelease, Buttons::empty(), center));
    let frames = settle(viewer, clock);
    log::info!(
        "Orbit: {} frames, rotation angle {:.3} rad",
        frames,
        viewer.manipulator().rotation().angle()
    );
}

fn zoom(viewer: &mut Viewer<RecordingDevice>, clock: &ManualClock) {
    let queue = viewer.events();
    let before = viewer.manipulator().distance();
    for _ in 0..3 {
        queue.push(Event::new(EventType::PointerScrollUp));
    }
    settle(viewer, clock);
    log::info!("Zoom: distance {:.3} -> {:.3}", before, viewer.manipulator().distance());
}

fn fly_home(viewer: &mut Viewer<RecordingDevice>, clock: &ManualClock) {
    if !viewer.reset_view() {
        log::warn!("Nothing to frame");
        return;
    }
    let frames = settle(viewer, clock);
    log::info!(
        "Home: {} frames, distance {:.3}",
        frames,
        viewer.manipulator().distance()
    );
}

fn run(args: &Args) -> Result<(), AppError> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load_from_file(path)?,
        None => ViewerConfig::default(),
    };
    if config.home_duration_s <= 0.0 {
        config.home_duration_s = 0.5;
    }

    let clock = Rc::new(ManualClock::new(0.0));
    let mut viewer = Viewer::new(RecordingDevice::new(), Box::new(Rc::clone(&clock)), config);

    let geometry = match &args.mesh {
        Some(path) => {
            let (id, status, message) = viewer.load_mesh(path);
            if status != Status::FileLoaded {
                return Err(AppError::Mesh(message));
            }
            id
        }
        None => build_arch(&mut viewer),
    };

    let frames = settle(&mut viewer, &clock);
    log::info!("Initial view after {} frames", frames);

    orbit(&mut viewer, &clock);
    zoom(&mut viewer, &clock);
    fly_home(&mut viewer, &clock);

    if let (Some(out), Some(id)) = (&args.out, geometry) {
        let options = WriteOptions::new()
            .with_binary(args.binary)
            .with_color_mode(args.color);
        let written = viewer
            .graph()
            .geometry(id)
            .map(|geometry| io::write(out, geometry, &options));
        match written {
            Some((Status::FileSaved, _)) => log::info!("Wrote {}", out),
            Some((status, message)) => log::warn!("Could not write {} ({:?}): {}", out, status, message),
            None => log::warn!("Geometry to write is gone"),
        }
    }

    let stats = viewer.device().stats();
    log::info!("Frames drawn: {}", viewer.frames());
    log::info!("Draw calls: {}", viewer.device().draw_calls());
    log::info!("Buffer uploads: {}", viewer.device().buffer_uploads());
    log::info!("Device: {:?}", stats);

    viewer.release();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level(log::LevelFilter::Info);
    log::info!("Starting dental viewer");

    let args = Args::from_matches(&command().get_matches());
    match run(&args) {
        Ok(()) => {
            log::info!("Viewer finished");
            Ok(())
        }
        Err(e) => {
            log::error!("Viewer failed: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        command()
            .try_get_matches_from(std::iter::once("viewer_app").chain(argv.iter().copied()))
            .map(|matches| Args::from_matches(&matches))
    }

    #[test]
    fn test_no_arguments_builds_demo() {
        assert_eq!(parse(&[]).unwrap(), Args::default());
    }

    #[test]
    fn test_all_options() {
        let args = parse(&["jaw.stl", "--config", "viewer.toml", "-o", "out.stl", "--binary", "--color"]).unwrap();
        assert_eq!(
            args,
            Args {
                mesh: Some("jaw.stl".to_string()),
                config: Some("viewer.toml".to_string()),
                out: Some("out.stl".to_string()),
                binary: true,
                color: true,
            }
        );
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--wireframe"]).is_err());
    }
}
