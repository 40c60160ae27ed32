//! Capture loop: drives per-tick estimation, tracker assignment, and frame
//! accumulation for both live (wall-clock paced) and uploaded (lock-step
//! frame-stepped) sources.
//!
//! Single cooperative context: one tick at a time, at most one estimator
//! call in flight (the call blocks the tick), so tracker state and the
//! recording buffer are never touched concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::config::RecorderConfig;
use crate::pose::{adapt_pose, DetectionMode, Pose, PoseEstimator};
use crate::recording::{Frame, OverlayItem, Recording, RecordingBuffer, TrackedPose};
use crate::source::VideoSource;
use crate::tracker::TrackerAssignment;

/// 録画中フラグ
///
/// 停止は協調的: フラグを下ろすだけで、実行中の推定呼び出しは完走させ、
/// 解決時点でフラグを確認して結果を破棄する。
#[derive(Clone)]
pub struct RecordingFlag(Arc<AtomicBool>);

impl RecordingFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_recording(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for RecordingFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// 1ティックの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// フレームは追記されなかった（ソース未準備・ウォームアップ・停止済み）
    Skipped,
    /// フレームを追記した
    Captured,
    /// オフラインソースの終端に到達した（正常終了）
    Finished,
}

/// キャプチャループのスケジューラ
pub struct FrameScheduler {
    buffer: RecordingBuffer,
    assignment: TrackerAssignment,
    mode: DetectionMode,
    framerate: f32,
    items: Vec<OverlayItem>,
    flag: RecordingFlag,
}

impl FrameScheduler {
    pub fn new(framerate: f32, mode: DetectionMode, smoothing_window: usize) -> Self {
        Self {
            buffer: RecordingBuffer::new(),
            assignment: TrackerAssignment::new(smoothing_window),
            mode,
            framerate,
            items: Vec::new(),
            flag: RecordingFlag::new(),
        }
    }

    pub fn from_config(config: &RecorderConfig) -> Self {
        Self::new(config.framerate, config.detection_mode, config.smoothing_window)
    }

    /// 毎フレームへ焼き込むオーバーレイアイテムを設定する
    pub fn set_items(&mut self, items: Vec<OverlayItem>) {
        self.items = items;
    }

    /// 協調停止用フラグのハンドル
    pub fn flag(&self) -> RecordingFlag {
        self.flag.clone()
    }

    /// 直近に追記されたフレーム。プレビュー合成はこれだけを読む。
    pub fn last_frame(&self) -> Option<&Frame> {
        self.buffer.last()
    }

    pub fn frame_count(&self) -> usize {
        self.buffer.len()
    }

    /// 1ティック実行する
    ///
    /// - ソース寸法が 0 なら何もしない（未準備）
    /// - 推定器が未設定でも空ポーズのフレームを作る（タイミング維持）
    /// - 推定完了時点で停止済みなら結果を破棄する
    /// - 録画開始直後の1ティック目（elapsed_since_start == 0）は
    ///   ウォームアップとして破棄する
    /// - オフライン時は追記後に 1/fps だけソースを進め、終端を超えたら
    ///   Finished を返す（正常終了）
    ///
    /// 推定器のエラーはそのまま呼び出し元へ伝播し、バッファは変更され
    /// ない。
    pub fn tick(
        &mut self,
        estimator: Option<&mut dyn PoseEstimator>,
        source: &mut dyn VideoSource,
        _elapsed_since_last_ms: f64,
        elapsed_since_start_ms: f64,
        is_live: bool,
    ) -> Result<TickOutcome> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Ok(TickOutcome::Skipped);
        }

        let mut poses: Vec<Pose> = match estimator {
            None => Vec::new(),
            Some(est) => {
                let mut raw = est.estimate(source, self.mode.max_poses())?;
                raw.truncate(self.mode.max_poses());
                raw.iter().map(adapt_pose).collect()
            }
        };

        let tracker_ids = self.assignment.assign(&mut poses);

        if !self.flag.is_recording() {
            return Ok(TickOutcome::Skipped);
        }
        if elapsed_since_start_ms == 0.0 {
            return Ok(TickOutcome::Skipped);
        }

        let tracked = poses
            .into_iter()
            .zip(tracker_ids)
            .map(|(pose, id)| TrackedPose::new(pose, id))
            .collect();
        self.buffer.append(Frame {
            frame_index: 0, // バッファが採番する
            t: elapsed_since_start_ms,
            video_width: width,
            video_height: height,
            poses: tracked,
            items: self.items.clone(),
            dropped: false,
        });

        if !is_live {
            let next = source.current_time() + 1.0 / self.framerate as f64;
            match source.duration() {
                Some(duration) if next >= duration => return Ok(TickOutcome::Finished),
                _ => source.seek_to(next)?,
            }
        }
        Ok(TickOutcome::Captured)
    }

    /// 録画を確定する。フレームが0なら None。
    pub fn stop(&mut self) -> Option<Recording> {
        self.flag.stop();
        self.buffer.stop(self.framerate)
    }

    /// オフラインソースをロックステップで最後まで録画する
    ///
    /// ソース終端（または外部からのフラグ停止）まで回し、確定した録画を
    /// 返す。各ティックはシーク完了を待ってから次へ進む。
    pub fn run_offline(
        &mut self,
        mut estimator: Option<&mut dyn PoseEstimator>,
        source: &mut dyn VideoSource,
    ) -> Result<Option<Recording>> {
        let mut start: Option<Instant> = None;
        let mut last_tick: Option<Instant> = None;
        while self.flag.is_recording() {
            let now = Instant::now();
            let since_start = match start {
                None => {
                    start = Some(now);
                    0.0
                }
                Some(s) => now.duration_since(s).as_secs_f64() * 1000.0,
            };
            let since_last = last_tick
                .map(|t| now.duration_since(t).as_secs_f64() * 1000.0)
                .unwrap_or(0.0);
            last_tick = Some(now);

            let outcome = match estimator {
                Some(ref mut est) => {
                    self.tick(Some(&mut **est), source, since_last, since_start, false)?
                }
                None => self.tick(None, source, since_last, since_start, false)?,
            };
            if outcome == TickOutcome::Finished {
                break;
            }
        }
        Ok(self.stop())
    }

    /// ライブソースを壁時計ペースで録画する
    ///
    /// 外部スレッドが flag().stop() を呼ぶまで framerate のペースで
    /// ティックを発行する。処理が遅れた場合、落ちたスロットは再試行
    /// しない（スキップのみ）。
    pub fn run_live(
        &mut self,
        mut estimator: Option<&mut dyn PoseEstimator>,
        source: &mut dyn VideoSource,
    ) -> Result<Option<Recording>> {
        let period = Duration::from_secs_f64(1.0 / self.framerate as f64);
        let mut deadline = Instant::now();
        let mut start: Option<Instant> = None;
        let mut last_tick: Option<Instant> = None;

        while self.flag.is_recording() {
            let now = Instant::now();
            if now < deadline {
                thread::sleep(deadline - now);
            }
            let now = Instant::now();
            deadline += period;
            if deadline < now {
                // 遅延分のスロットは捨てて現在へ追いつく
                let behind = now.duration_since(deadline);
                let skipped = behind.as_secs_f64() / period.as_secs_f64();
                deadline += period * (skipped as u32 + 1);
                log::debug!("capture loop behind, skipping {} slot(s)", skipped as u32 + 1);
            }

            let since_start = match start {
                None => {
                    start = Some(now);
                    0.0
                }
                Some(s) => now.duration_since(s).as_secs_f64() * 1000.0,
            };
            let since_last = last_tick
                .map(|t| now.duration_since(t).as_secs_f64() * 1000.0)
                .unwrap_or(0.0);
            last_tick = Some(now);

            match estimator {
                Some(ref mut est) => {
                    self.tick(Some(&mut **est), source, since_last, since_start, true)?;
                }
                None => {
                    self.tick(None, source, since_last, since_start, true)?;
                }
            }
        }
        Ok(self.stop())
    }
}
