//! 舞台碰撞模型
//!
//! 舞台由若干凸碰撞块组成，每块是若干半空间的交集。

mod builtin;

pub use builtin::{graveyard, saha, StageId};

use glam::DVec3;

use crate::geometry::{Plane, NORMALIZE_EPSILON};

/// 平地舞台出生点（骨盆）离地高度
const FLAT_SPAWN_HEIGHT: f64 = 7.0;

/// 凸碰撞块
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub walls: Vec<Plane>,
}

/// 点相对碰撞块表面的查询结果
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceContact {
    /// 表面上最近点
    pub nearest: DVec3,
    /// 推出方向（单位向量）
    pub normal: DVec3,
    /// 到表面的距离；点在块内部时为负的穿透深度
    pub distance: f64,
    /// 违反最多的平面法线，用于判断是否着地
    pub plane_normal: DVec3,
}

impl Block {
    pub fn new(walls: Vec<Plane>) -> Self {
        Self { walls }
    }

    /// 计算点到块表面的最近点
    ///
    /// 依次投影到每个被违反的平面上，重复 `passes` 轮。
    /// 点在块内部时分离向量退化，改用违反最多的平面直接求解。
    /// 没有平面的块返回 `None`。
    pub fn nearest_surface(&self, p: DVec3, passes: usize) -> Option<SurfaceContact> {
        let mut nearest = p;
        let mut nearest_d = f64::NEG_INFINITY;
        let mut inside: Option<&Plane> = None;

        for _ in 0..passes.max(1) {
            for wall in &self.walls {
                let d = wall.signed_distance(nearest);
                if d > 0.0 {
                    nearest -= wall.normal * d;
                }
                if d > nearest_d {
                    inside = Some(wall);
                    nearest_d = d;
                }
            }
        }

        let inside = inside?;
        let sep = p - nearest;
        let l = sep.length();
        let (distance, normal) = if l < NORMALIZE_EPSILON {
            (inside.signed_distance(p), inside.normal)
        } else {
            (l, sep * (1.0 / l))
        };

        Some(SurfaceContact {
            nearest,
            normal,
            distance,
            plane_normal: inside.normal,
        })
    }

    /// 点是否在块内部（含边界）
    pub fn contains(&self, p: DVec3) -> bool {
        self.walls.iter().all(|w| w.contains(p))
    }
}

/// 舞台
#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    /// 舞台模型文件名（渲染协作者加载）
    pub model: String,
    /// 模型缩放
    pub scale: f64,
    /// 角色出生点
    pub origin: DVec3,
    /// 可活动范围（|x|、|z| 超出后角色复位）
    pub size: f64,
    pub blocks: Vec<Block>,
}

impl Stage {
    /// 只有一块水平地板的舞台，出生点在地板上方站立高度处
    pub fn flat(floor_height: f64, size: f64) -> Self {
        Self {
            model: String::new(),
            scale: 1.0,
            origin: DVec3::new(0.0, floor_height + FLAT_SPAWN_HEIGHT, 0.0),
            size,
            blocks: vec![Block::new(vec![Plane::new(DVec3::Y, floor_height)])],
        }
    }

    /// 位置是否超出可活动范围
    #[inline]
    pub fn is_out_of_bounds(&self, p: DVec3) -> bool {
        p.x.abs() > self.size || p.z.abs() > self.size
    }
}
