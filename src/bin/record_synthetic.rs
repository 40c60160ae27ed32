//! Offline recording demo: a scripted video source and a synthetic pose
//! estimator stand in for the camera and the model. Records the whole
//! source in lock-step, exports recording.json, and composites a few
//! preview frames to PNG.

use anyhow::{Context, Result};

use stickfigure_recorder::assets::AssetStore;
use stickfigure_recorder::capture::FrameScheduler;
use stickfigure_recorder::config::RecorderConfig;
use stickfigure_recorder::pose::{PoseEstimator, RawKeypoint, RawPose};
use stickfigure_recorder::render::{SkeletonCompositor, Surface};
use stickfigure_recorder::source::VideoSource;

const CONFIG_PATH: &str = "recorder.toml";
const OUTPUT_PATH: &str = "recording.json";

/// 合成ソース: 640x480、2秒の「アップロード動画」
struct SyntheticSource {
    time: f64,
}

impl VideoSource for SyntheticSource {
    fn dimensions(&self) -> (u32, u32) {
        (640, 480)
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> Option<f64> {
        Some(2.0)
    }

    fn seek_to(&mut self, t: f64) -> Result<()> {
        self.time = t;
        Ok(())
    }
}

/// 歩行する人物を合成する推定器
struct SyntheticEstimator;

impl PoseEstimator for SyntheticEstimator {
    fn estimate(
        &mut self,
        source: &mut dyn VideoSource,
        _max_poses: usize,
    ) -> Result<Vec<RawPose>> {
        let t = source.current_time() as f32;
        let cx = 320.0 + (t * 1.5).sin() * 80.0;
        let cy = 240.0;
        let swing = (t * 6.0).sin() * 25.0;

        let kp = |name: &str, x: f32, y: f32| RawKeypoint {
            name: name.to_string(),
            x,
            y,
            score: 0.9,
        };
        let keypoints = vec![
            kp("nose", cx, cy - 130.0),
            kp("left_shoulder", cx - 40.0, cy - 90.0),
            kp("right_shoulder", cx + 40.0, cy - 90.0),
            kp("left_elbow", cx - 55.0, cy - 40.0 + swing),
            kp("right_elbow", cx + 55.0, cy - 40.0 - swing),
            kp("left_wrist", cx - 60.0, cy + 10.0 + swing),
            kp("right_wrist", cx + 60.0, cy + 10.0 - swing),
            kp("left_hip", cx - 30.0, cy + 20.0),
            kp("right_hip", cx + 30.0, cy + 20.0),
            kp("left_knee", cx - 30.0 - swing * 0.5, cy + 90.0),
            kp("right_knee", cx + 30.0 + swing * 0.5, cy + 90.0),
            kp("left_ankle", cx - 30.0 - swing, cy + 160.0),
            kp("right_ankle", cx + 30.0 + swing, cy + 160.0),
        ];
        Ok(vec![RawPose {
            score: Some(0.95),
            keypoints,
        }])
    }
}

fn surface_to_png(surface: &Surface, path: &str) -> Result<()> {
    let mut img = image::RgbaImage::new(surface.width() as u32, surface.height() as u32);
    for (i, pixel) in surface.buffer().iter().enumerate() {
        let x = (i % surface.width()) as u32;
        let y = (i / surface.width()) as u32;
        let r = ((pixel >> 16) & 0xFF) as u8;
        let g = ((pixel >> 8) & 0xFF) as u8;
        let b = (pixel & 0xFF) as u8;
        img.put_pixel(x, y, image::Rgba([r, g, b, 255]));
    }
    img.save(path).with_context(|| format!("failed to write {}", path))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let config = RecorderConfig::load_or_default(CONFIG_PATH);

    println!("=== Stickfigure Recorder - synthetic demo ({}) ===", env!("GIT_VERSION"));
    println!("framerate: {} fps, window: {}", config.framerate, config.smoothing_window);

    let mut scheduler = FrameScheduler::from_config(&config);
    scheduler.set_items(config.overlay_items());
    let mut source = SyntheticSource { time: 0.0 };
    let mut estimator = SyntheticEstimator;

    let recording = scheduler
        .run_offline(Some(&mut estimator), &mut source)?
        .context("no frames captured")?;
    println!(
        "captured {} frames ({}x{} @ {} fps)",
        recording.frames.len(),
        recording.export_width,
        recording.export_height,
        recording.framerate
    );

    std::fs::write(OUTPUT_PATH, serde_json::to_string_pretty(&recording)?)?;
    println!("wrote {}", OUTPUT_PATH);

    // 先頭・中間・末尾のフレームをプレビュー出力
    let mut assets = AssetStore::new(&config.assets_dir);
    let compositor = SkeletonCompositor::new(config.background_opacity);
    let last = recording.frames.len() - 1;
    for index in [0, last / 2, last] {
        let frame = &recording.frames[index];
        let mut surface = Surface::new(
            recording.export_width as usize,
            recording.export_height as usize,
        );
        compositor.paint_frame(&mut surface, frame, &mut assets);
        let path = format!("frame_{:04}.png", frame.frame_index);
        surface_to_png(&surface, &path)?;
        println!("wrote {}", path);
    }
    Ok(())
}
