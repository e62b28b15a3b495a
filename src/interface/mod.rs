//! 外部协作者接口
//!
//! 核心只通过这些 trait 与音频、特效、渲染、时钟交互，
//! 自身不持有任何窗口或设备状态。

use glam::{DVec3, Vec4};

// ============================================================================
// 音频
// ============================================================================

/// 核心会请求播放的音效
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundId {
    /// 动作命中节拍（两种随机变体）
    NoteHit(u8),
    /// 空翻
    Wooa,
    /// 撞击舞台（两种随机变体）
    Impact(u8),
    /// 僵尸吼叫（两种随机变体）
    Zombie(u8),
}

/// 音频协作者：即发即忘
pub trait AudioSink {
    fn play(&mut self, sound: SoundId, volume: f64);
}

// ============================================================================
// 特效
// ============================================================================

/// 粒子特效协作者
pub trait EffectSink {
    /// 在 `pos` 附近生成烟雾，`count` 可为小数（由实现决定取整方式）
    fn add_smoke(&mut self, pos: DVec3, color: Vec4, duration: f64, count: f64, size: f64);
}

// ============================================================================
// 渲染
// ============================================================================

/// 世界空间顶点
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderVertex {
    pub position: DVec3,
    pub normal: DVec3,
}

/// 渲染协作者
pub trait RenderSink {
    /// 绘制一个材质分组的三角形（每 3 个顶点一个三角形）
    fn draw_triangles(&mut self, vertices: &[RenderVertex], color: Vec4);
    /// 调试线段
    fn draw_line(&mut self, a: DVec3, b: DVec3, color: Vec4);
}

/// 什么都不做的协作者，用于无头模拟与测试
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, _sound: SoundId, _volume: f64) {}
}

impl EffectSink for NullSink {
    fn add_smoke(&mut self, _pos: DVec3, _color: Vec4, _duration: f64, _count: f64, _size: f64) {}
}

impl RenderSink for NullSink {
    fn draw_triangles(&mut self, _vertices: &[RenderVertex], _color: Vec4) {}
    fn draw_line(&mut self, _a: DVec3, _b: DVec3, _color: Vec4) {}
}

// ============================================================================
// 时钟
// ============================================================================

/// 单帧最大时长（秒）
pub const MAX_FRAME_DT: f64 = 0.1;

/// 把实际帧时长钳制到 [0, 0.1]
#[inline]
pub fn clamp_frame_dt(dt: f64) -> f64 {
    if dt.is_nan() {
        return 0.0;
    }
    dt.clamp(0.0, MAX_FRAME_DT)
}

/// 把一帧时长切分为固定子步
///
/// 每步取 `min(剩余, step)`，最后一步可能更短。
pub fn substeps(frame_dt: f64, step: f64) -> impl Iterator<Item = f64> {
    debug_assert!(step > 0.0);
    let mut remaining = frame_dt;
    std::iter::from_fn(move || {
        // 累减误差留下的极小余量不再单独成步
        if remaining <= 1e-12 {
            return None;
        }
        let dt = remaining.min(step);
        remaining -= step;
        Some(dt)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clamp_frame_dt() {
        assert_eq!(clamp_frame_dt(-1.0), 0.0);
        assert_eq!(clamp_frame_dt(0.5), MAX_FRAME_DT);
        assert_eq!(clamp_frame_dt(f64::NAN), 0.0);
        assert_relative_eq!(clamp_frame_dt(0.016), 0.016);
    }

    #[test]
    fn test_substeps() {
        let steps: Vec<f64> = substeps(0.0125, 0.005).collect();
        assert_eq!(steps.len(), 3);
        assert_relative_eq!(steps[0], 0.005);
        assert_relative_eq!(steps[2], 0.0025, epsilon = 1e-12);
        assert_relative_eq!(steps.iter().sum::<f64>(), 0.0125, epsilon = 1e-12);
        assert_eq!(substeps(0.0, 0.005).count(), 0);
    }
}
