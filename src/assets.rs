use std::collections::HashMap;
use std::path::PathBuf;

use image::RgbaImage;

/// スプライト画像のキャッシュ付きローダー
///
/// `<root>/<name>.png` を名前ごとに一度だけ読み込む。失敗も None として
/// キャッシュし、毎フレーム再試行しない。呼び出し側は None を受けて
/// フォールバック描画へ切り替える（描画を中断しない）。
pub struct AssetStore {
    root: PathBuf,
    cache: HashMap<String, Option<RgbaImage>>,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    /// 名前でスプライトを取得する。ロード失敗時は None。
    pub fn get(&mut self, name: &str) -> Option<&RgbaImage> {
        if !self.cache.contains_key(name) {
            let path = self.root.join(format!("{}.png", name));
            let loaded = match image::open(&path) {
                Ok(img) => Some(img.to_rgba8()),
                Err(e) => {
                    log::warn!("failed to load sprite {:?}: {}", path, e);
                    None
                }
            };
            self.cache.insert(name.to_string(), loaded);
        }
        self.cache.get(name).and_then(|entry| entry.as_ref())
    }
}
