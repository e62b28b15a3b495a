//! 线性混合蒙皮
//!
//! 每个网格顶点在加载时绑定到附近的若干骨骼，并以骨骼局部坐标
//! (x, u, v) 记录静止位置与法线；运行时由当前骨骼坐标系重建。

mod binding;
mod posture;

pub use binding::bind_vertices;
pub use posture::{TUBE_HIGHLIGHT_COLOR, TUBE_COLOR, TUBE_SIDES};

use glam::DVec3;

/// 顶点对单根骨骼的绑定
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attachment {
    /// 骨骼表下标
    pub bone: usize,
    pub weight: f64,
    /// 位置：沿骨骼比例、up 偏移、perp 偏移
    pub x: f64,
    pub u: f64,
    pub v: f64,
    /// 法线的同样分解
    pub nx: f64,
    pub nu: f64,
    pub nv: f64,
}

/// 蒙皮顶点
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkinVertex {
    pub attachments: Vec<Attachment>,
    /// 当前世界坐标（`calc_posture` 更新）
    pub pos: DVec3,
    /// 当前法线（未归一化）
    pub normal: DVec3,
}

impl SkinVertex {
    pub fn total_weight(&self) -> f64 {
        self.attachments.iter().map(|a| a.weight).sum()
    }
}
