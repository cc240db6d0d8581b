use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use glam::Vec2;
use ply::PointCloud;
use splat_source::Source;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use viewer::{FrameState, InputState, SplatScene, ViewerConfig};

/// Loads a gaussian splat ply, flies the camera and reports the resulting frame.
#[derive(Parser)]
struct Args {
    /// Path or http(s) URL of a binary little endian ply
    input: String,

    /// JSON viewer config; missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only keep this many splats from the start of the file
    #[arg(long)]
    max_splats: Option<usize>,

    /// Vertical field of view in degrees
    #[arg(long)]
    fov: Option<f32>,

    /// Viewport width over height
    #[arg(long, default_value_t = 16.0 / 9.0)]
    aspect: f32,

    /// One tick per character: w/s forward/back, a/d left/right, e/q up/down, r resort
    #[arg(short, long, default_value = "")]
    keys: String,

    /// Pointer drag in pixels applied on the first tick
    #[arg(long, num_args = 2, value_names = ["DX", "DY"], allow_negative_numbers = true)]
    drag: Option<Vec<f32>>,

    /// Sort on a worker thread instead of during the tick
    #[arg(long)]
    background_sort: bool,

    /// Write the (capped) point cloud back out as ply
    #[arg(long)]
    export: Option<PathBuf>,

    /// Write the final frame uniforms and draw order as JSON
    #[arg(long)]
    dump_frame: Option<PathBuf>,
}

/// Input for one tick of the `--keys` script.
fn key_input(key: char) -> Option<InputState> {
    let mut input = InputState::default();
    match key.to_ascii_lowercase() {
        'w' => input.forward = true,
        's' => input.backward = true,
        'a' => input.left = true,
        'd' => input.right = true,
        'e' => input.up = true,
        'q' => input.down = true,
        'r' => input.resort_requested = true,
        _ => return None,
    }
    Some(input)
}

async fn load_scene(source: &Source, config: ViewerConfig, aspect: f32, export: Option<&PathBuf>) -> anyhow::Result<SplatScene> {
    let bytes = match source.load().await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%err, "could not load splats, continuing with an empty scene");
            return Ok(SplatScene::empty(config, aspect));
        }
    };

    let mut cloud = PointCloud::from_bytes(&bytes)?;
    if let Some(max) = config.max_splats {
        cloud.truncate(max);
    }

    if let Some(path) = export {
        tokio::fs::write(path, cloud.to_bytes())
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), points = cloud.len(), "exported point cloud");
    }

    Ok(SplatScene::from_cloud(&cloud, config, aspect)?)
}

fn frame_json(frame: &FrameState) -> serde_json::Value {
    serde_json::json!({
        "model_view": frame.uniforms.model_view,
        "projection": frame.uniforms.projection,
        "camera": frame.uniforms.camera,
        "vertex_count": frame.vertices.len(),
        "index_count": frame.index_count(),
        "draw_order": frame.draw_order.splats(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path).await?,
        None => ViewerConfig::default(),
    };
    if args.max_splats.is_some() {
        config.max_splats = args.max_splats;
    }
    if let Some(fov) = args.fov {
        config.fov_y_degrees = fov;
    }

    let source = Source::from_location(&args.input);
    let mut scene = load_scene(&source, config, args.aspect, args.export.as_ref()).await?;
    let (move_speed, rotate_sensitivity) = (scene.config().move_speed, scene.config().rotate_sensitivity);

    if let Some(drag) = args.drag.as_deref() {
        let mut input = InputState {
            pointer_pressed: true,
            ..Default::default()
        };
        input.drag(Vec2::new(drag[0], drag[1]));
        scene.apply_input(input.take_delta(move_speed, rotate_sensitivity));
    }

    let mut frame = scene.tick();
    for key in args.keys.chars() {
        let Some(mut input) = key_input(key) else {
            warn!(%key, "ignoring unknown key");
            continue;
        };
        let delta = input.take_delta(move_speed, rotate_sensitivity);
        scene.apply_input(delta);

        if args.background_sort && delta.resort {
            let handle = scene.spawn_resort();
            if handle.join().is_err() {
                anyhow::bail!("background sort panicked");
            }
            frame = scene.frame();
        } else {
            frame = scene.tick();
        }
    }

    info!(
        splats = scene.len(),
        vertices = frame.vertices.len(),
        indices = frame.index_count(),
        position = ?scene.camera().position,
        "frame ready"
    );

    if let Some(path) = &args.dump_frame {
        let json = serde_json::to_string_pretty(&frame_json(&frame))?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_single_directions() {
        assert!(key_input('w').unwrap().forward);
        assert!(key_input('Q').unwrap().down);
        assert!(key_input('r').unwrap().resort_requested);
        assert!(key_input('x').is_none());
    }

    #[test]
    fn args_parse_drag_pair() {
        let args = Args::parse_from(["viewer-cmd", "scene.ply", "--drag", "-12", "3.5", "--keys", "wwr"]);
        assert_eq!(args.drag, Some(vec![-12.0, 3.5]));
        assert_eq!(args.keys, "wwr");
        assert_eq!(args.input, "scene.ply");
    }
}
