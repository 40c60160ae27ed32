use anyhow::Result;

/// 映像ソースのシーム
///
/// ライブカメラまたはアップロード動画。取得機構そのものはこのコアの
/// 範囲外で、スケジューラが必要とする情報だけを公開する。
pub trait VideoSource {
    /// 現在のピクセル寸法。(0, 0) はソース未準備を意味する。
    fn dimensions(&self) -> (u32, u32);

    /// 現在の再生位置（秒）
    fn current_time(&self) -> f64;

    /// 総再生時間（秒）。ライブソースは None。
    fn duration(&self) -> Option<f64>;

    /// 指定位置へシークし、完了通知までブロックする。
    /// オフライン（コマ送り）モードでのみ呼ばれる。
    fn seek_to(&mut self, t: f64) -> Result<()>;
}
