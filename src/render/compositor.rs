use std::collections::HashMap;

use image::RgbaImage;

use crate::assets::AssetStore;
use crate::pose::{dist_between, KeypointName};
use crate::recording::{Frame, OverlayItem, TrackedPose};

use super::skeleton::{
    BACKGROUND_COLOR, DISPLAY_CONFIDENCE, DROPPED_BACKGROUND_COLOR, HEAD_ASSET,
    HEAD_FALLBACK_COLOR, HEAD_FALLBACK_RADIUS, HEAD_OFFSET_X, HEAD_OFFSET_Y, HEAD_SIZE,
    LIMB_BONES, LIMB_FALLBACK_ALPHA, LIMB_FALLBACK_COLOR, TORSO_ASSET, TORSO_THICKNESS,
};
use super::surface::Surface;

/// レターボックス/ピラーボックス変換
///
/// ソース映像のピクセル矩形をアスペクト比を保ったまま合成先に収め、
/// 余白側の軸で中央寄せする。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x_offset: f32,
    pub y_offset: f32,
    pub draw_width: f32,
    pub draw_height: f32,
    video_width: f32,
    video_height: f32,
}

impl Viewport {
    pub fn compute(canvas_width: u32, canvas_height: u32, video_width: u32, video_height: u32) -> Self {
        let mut draw_width = canvas_width as f32;
        let mut draw_height = canvas_height as f32;
        let video_width = video_width as f32;
        let video_height = video_height as f32;
        let mut x_offset = 0.0;
        let mut y_offset = 0.0;

        let video_width_in_draw = video_width / video_height * draw_height;
        let video_height_in_draw = video_height / video_width * draw_width;

        if draw_width > video_width_in_draw {
            x_offset = ((draw_width - video_width_in_draw) / 2.0).floor();
            draw_width = video_width_in_draw;
        } else if draw_height > video_height_in_draw {
            y_offset = ((draw_height - video_height_in_draw) / 2.0).floor();
            draw_height = video_height_in_draw;
        }

        Self {
            x_offset,
            y_offset,
            draw_width,
            draw_height,
            video_width,
            video_height,
        }
    }

    /// 映像ピクセル座標を合成先座標へ写す
    pub fn to_draw(&self, position: (f32, f32)) -> (f32, f32) {
        (
            self.x_offset + position.0 * self.draw_width / self.video_width,
            self.y_offset + position.1 * self.draw_height / self.video_height,
        )
    }
}

/// スケルトン合成器
///
/// 呼び出しごとにステートレス: 追記済みの不変フレームだけを読み、
/// トラッカー状態には触れない。
pub struct SkeletonCompositor {
    background_opacity: f32,
}

impl SkeletonCompositor {
    pub fn new(background_opacity: f32) -> Self {
        Self { background_opacity }
    }

    /// 1フレームをサーフェスへ合成する
    pub fn paint_frame(&self, surface: &mut Surface, frame: &Frame, assets: &mut AssetStore) {
        let viewport = Viewport::compute(
            surface.width() as u32,
            surface.height() as u32,
            frame.video_width,
            frame.video_height,
        );

        if frame.dropped {
            surface.fill(DROPPED_BACKGROUND_COLOR);
        } else {
            // 黒クリアへ背景色を不透明度分だけ乗せた結果を直接塗る
            let alpha = self.background_opacity.clamp(0.0, 1.0);
            let scale = |c: u32| ((c & 0xFF) as f32 * alpha) as u32;
            let r = scale(BACKGROUND_COLOR >> 16);
            let g = scale(BACKGROUND_COLOR >> 8);
            let b = scale(BACKGROUND_COLOR);
            surface.fill((r << 16) | (g << 8) | b);
        }

        for pose in &frame.poses {
            paint_pose(surface, pose, &viewport, assets);
        }
        for item in &frame.items {
            draw_item(surface, *item, assets);
        }
    }
}

/// 1人分のスケルトンを描画する
fn paint_pose(
    surface: &mut Surface,
    pose: &TrackedPose,
    viewport: &Viewport,
    assets: &mut AssetStore,
) {
    if pose.keypoints.is_empty() {
        log::warn!("no keypoints this frame");
        return;
    }

    let kp: HashMap<KeypointName, (f32, f32)> = pose
        .keypoints
        .iter()
        .filter(|k| k.is_valid(DISPLAY_CONFIDENCE))
        .map(|k| (k.name, k.position()))
        .collect();

    let midpoint = |a: Option<&(f32, f32)>, b: Option<&(f32, f32)>| -> Option<(f32, f32)> {
        match (a, b) {
            (Some(a), Some(b)) => Some(((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)),
            _ => None,
        }
    };
    let mid_shoulder = midpoint(
        kp.get(&KeypointName::LeftShoulder),
        kp.get(&KeypointName::RightShoulder),
    );
    let mid_hip = midpoint(kp.get(&KeypointName::LeftHip), kp.get(&KeypointName::RightHip));

    // 胴体: 両中点が揃ったときだけ
    if let (Some(shoulder), Some(hip)) = (mid_shoulder, mid_hip) {
        let image = assets.get(TORSO_ASSET);
        draw_limb(
            surface,
            image,
            viewport.to_draw(shoulder),
            viewport.to_draw(hip),
            TORSO_THICKNESS,
        );
    }

    // 四肢: 端点が欠けたボーンはスキップ（エラーではない）
    for bone in &LIMB_BONES {
        let (Some(&a), Some(&b)) = (kp.get(&bone.from), kp.get(&bone.to)) else {
            log::warn!("limb skipped: missing keypoints {:?}->{:?}", bone.from, bone.to);
            continue;
        };
        let image = assets.get(bone.asset);
        draw_limb(
            surface,
            image,
            viewport.to_draw(a),
            viewport.to_draw(b),
            bone.thickness,
        );
    }

    // 頭部: 鼻、なければ肩中点
    if let Some(head_ref) = kp.get(&KeypointName::Nose).copied().or(mid_shoulder) {
        let (hx, hy) = viewport.to_draw(head_ref);
        match assets.get(HEAD_ASSET) {
            Some(image) => stamp_image(
                surface,
                image,
                hx - HEAD_OFFSET_X,
                hy - HEAD_OFFSET_Y,
                HEAD_SIZE,
                HEAD_SIZE,
            ),
            None => surface.fill_circle(hx as i32, hy as i32, HEAD_FALLBACK_RADIUS, HEAD_FALLBACK_COLOR),
        }
    }
}

/// ボーンを1本スタンプする
///
/// 始点から終点への角度・長さでスプライトを回転・伸縮して描く。
/// スプライトがなければ同寸法の半透明矩形で代替する。
fn draw_limb(
    surface: &mut Surface,
    image: Option<&RgbaImage>,
    a: (f32, f32),
    b: (f32, f32),
    thickness: f32,
) {
    let length = dist_between(a, b);
    if length < 1.0 {
        return;
    }
    let angle = (b.1 - a.1).atan2(b.0 - a.0);
    let (sin_t, cos_t) = angle.sin_cos();
    let half = thickness / 2.0;

    // 回転矩形の4隅から走査範囲を決め、逆回転でボーン座標系へ戻す
    let corners = [
        (0.0, -half),
        (length, -half),
        (length, half),
        (0.0, half),
    ]
    .map(|(u, v): (f32, f32)| (a.0 + u * cos_t - v * sin_t, a.1 + u * sin_t + v * cos_t));
    let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min).floor() as i32;
    let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max).ceil() as i32;
    let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min).floor() as i32;
    let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max).ceil() as i32;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 + 0.5 - a.0;
            let dy = y as f32 + 0.5 - a.1;
            let u = dx * cos_t + dy * sin_t;
            let v = -dx * sin_t + dy * cos_t;
            if u < 0.0 || u >= length || v < -half || v >= half {
                continue;
            }
            match image {
                Some(img) => {
                    let sx = ((u / length * img.width() as f32) as u32).min(img.width() - 1);
                    let sy = (((v + half) / thickness * img.height() as f32) as u32)
                        .min(img.height() - 1);
                    let [r, g, b_, alpha] = img.get_pixel(sx, sy).0;
                    if alpha == 0 {
                        continue;
                    }
                    let color = ((r as u32) << 16) | ((g as u32) << 8) | b_ as u32;
                    surface.blend_pixel(x, y, color, alpha as f32 / 255.0);
                }
                None => surface.blend_pixel(x, y, LIMB_FALLBACK_COLOR, LIMB_FALLBACK_ALPHA),
            }
        }
    }
}

/// 軸平行の矩形へスプライトを伸縮してスタンプする
fn stamp_image(surface: &mut Surface, image: &RgbaImage, x: f32, y: f32, width: f32, height: f32) {
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let x1 = (x + width).ceil() as i32;
    let y1 = (y + height).ceil() as i32;
    for py in y0..y1 {
        for px in x0..x1 {
            let u = (px as f32 + 0.5 - x) / width;
            let v = (py as f32 + 0.5 - y) / height;
            if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                continue;
            }
            let sx = ((u * image.width() as f32) as u32).min(image.width() - 1);
            let sy = ((v * image.height() as f32) as u32).min(image.height() - 1);
            let [r, g, b, alpha] = image.get_pixel(sx, sy).0;
            if alpha == 0 {
                continue;
            }
            let color = ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
            surface.blend_pixel(px, py, color, alpha as f32 / 255.0);
        }
    }
}

/// オーバーレイアイテムを中央へ描画する
fn draw_item(surface: &mut Surface, item: OverlayItem, assets: &mut AssetStore) {
    let width = surface.width() as f32;
    let height = surface.height() as f32;
    let padding = width * 0.01;
    let sign_size = width.min(height) - padding * 2.0;
    let x = (width - sign_size) / 2.0;
    let y = (height - sign_size) / 2.0;

    match assets.get(item.asset_name()) {
        Some(image) => stamp_image(surface, image, x, y, sign_size, sign_size),
        None => {
            // プレースホルダ: 半透明グレーの矩形
            for py in y as i32..(y + sign_size) as i32 {
                for px in x as i32..(x + sign_size) as i32 {
                    surface.blend_pixel(px, py, 0x888888, 0.5);
                }
            }
        }
    }
}
