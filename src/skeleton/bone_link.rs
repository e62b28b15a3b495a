//! 骨骼连杆
//!
//! BoneLink 连接两个关节，同时维护一个随姿态更新的正交局部坐标系，
//! 蒙皮顶点以该坐标系表达。

use glam::DVec3;

use crate::geometry::normalize;

use super::definitions::BoneDef;
use super::{Joint, JointId};

// ============================================================================
// 锁定关系
// ============================================================================

/// 锁定方向
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockDirection {
    /// up 轴朝向 `dir × other.dir`
    Positive,
    /// up 轴朝向 `-(dir × other.dir)`
    Negative,
    /// 直接跟随另一根骨骼的 up 轴
    Absolute,
}

impl LockDirection {
    /// 耦合符号：+1、-1、0
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            LockDirection::Positive => 1.0,
            LockDirection::Negative => -1.0,
            LockDirection::Absolute => 0.0,
        }
    }
}

/// 与共享关节的另一根骨骼之间的扭转耦合
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoneLock {
    /// 另一根骨骼在骨骼表中的下标
    pub other: usize,
    pub direction: LockDirection,
}

// ============================================================================
// 骨骼
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct BoneLink {
    // ========================================
    // 静态数据（加载后不变）
    // ========================================
    pub a: JointId,
    pub b: JointId,
    /// 碰撞 / 蒙皮半径
    pub width: f64,
    /// 弹簧强度
    pub strength: f64,
    /// 优先级权重（来自骨骼表）
    pub priority: f64,
    /// 静止长度
    pub rest_length: f64,
    /// 锁定关系（加载时一次性建立）
    pub locks: Vec<BoneLock>,

    // ========================================
    // 动态数据（每子步更新）
    // ========================================
    /// a → b 向量（未归一化）
    pub dir: DVec3,
    pub up: DVec3,
    pub perp: DVec3,
}

impl BoneLink {
    /// 根据定义和当前关节位置创建骨骼
    pub fn from_def(def: &BoneDef, joints: &[Joint]) -> Self {
        let mut bone = Self {
            a: def.a,
            b: def.b,
            width: def.width,
            strength: def.strength,
            priority: def.priority,
            rest_length: 0.0,
            locks: Vec::new(),
            dir: DVec3::ZERO,
            up: DVec3::Y,
            perp: DVec3::X,
        };
        bone.reset_frame(joints);
        bone.rest_length = bone.dir.length();
        bone
    }

    #[inline]
    pub fn contains(&self, joint: JointId) -> bool {
        self.a == joint || self.b == joint
    }

    /// 是否与另一根骨骼共享端点
    #[inline]
    pub fn shares_joint(&self, other: &BoneLink) -> bool {
        self.contains(other.a) || self.contains(other.b)
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.dir.length()
    }

    /// 从关节位置重建坐标系：perp = dir × Z，up = perp × dir
    pub fn reset_frame(&mut self, joints: &[Joint]) {
        self.dir = joints[self.b.index()].pos - joints[self.a.index()].pos;
        self.rebuild_frame();
    }

    /// 重新正交化 up / perp，保持与 dir 垂直
    ///
    /// up 与 dir 平行导致叉积退化时，按参考轴重建。
    pub fn orthonormalize(&mut self) {
        let perp = normalize(self.dir.cross(self.up));
        if perp == DVec3::ZERO {
            self.rebuild_frame();
            return;
        }
        self.perp = perp;
        self.up = normalize(self.perp.cross(self.dir));
    }

    fn rebuild_frame(&mut self) {
        if self.dir.length_squared() == 0.0 {
            // 零长度骨骼保留原坐标系
            return;
        }
        let mut perp = normalize(self.dir.cross(DVec3::Z));
        if perp == DVec3::ZERO {
            perp = normalize(self.dir.cross(DVec3::X));
        }
        self.perp = perp;
        self.up = normalize(self.perp.cross(self.dir));
    }

    /// 骨骼上参数 x 处的点
    #[inline]
    pub fn point_at(&self, joints: &[Joint], x: f64) -> DVec3 {
        joints[self.a.index()].pos + self.dir * x
    }

    /// 骨骼上参数 x 处的插值速度
    #[inline]
    pub fn velocity_at(&self, joints: &[Joint], x: f64) -> DVec3 {
        joints[self.a.index()].vel * (1.0 - x) + joints[self.b.index()].vel * x
    }

    /// 局部坐标 (x, u, v) → 世界坐标
    #[inline]
    pub fn local_to_world(&self, joints: &[Joint], x: f64, u: f64, v: f64) -> DVec3 {
        joints[self.a.index()].pos + self.dir * x + self.up * u + self.perp * v
    }

    /// 局部方向 (x, u, v) → 世界方向
    #[inline]
    pub fn local_to_world_vector(&self, x: f64, u: f64, v: f64) -> DVec3 {
        self.dir * x + self.up * u + self.perp * v
    }

    /// 世界坐标 → 局部坐标 (沿骨骼比例, up 偏移, perp 偏移)
    #[inline]
    pub fn world_to_local(&self, joints: &[Joint], p: DVec3) -> DVec3 {
        let rel = p - joints[self.a.index()].pos;
        self.world_to_local_vector(rel)
    }

    /// 世界方向 → 局部方向
    #[inline]
    pub fn world_to_local_vector(&self, v: DVec3) -> DVec3 {
        DVec3::new(
            v.dot(self.dir) / self.dir.length_squared(),
            v.dot(self.up),
            v.dot(self.perp),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn joints(a: DVec3, b: DVec3) -> Vec<Joint> {
        vec![Joint::at(a), Joint::at(b)]
    }

    fn def() -> BoneDef {
        BoneDef {
            a: JointId::LeftHand,
            b: JointId::RightHand,
            width: 0.5,
            strength: 1.0,
            priority: 0.0,
        }
    }

    #[test]
    fn test_frame_is_orthonormal() {
        let j = joints(DVec3::ZERO, DVec3::new(1.0, 2.0, 0.5));
        let bone = BoneLink::from_def(&def(), &j);
        assert_relative_eq!(bone.rest_length, (1.0f64 + 4.0 + 0.25).sqrt());
        assert_relative_eq!(bone.up.length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(bone.perp.length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(bone.up.dot(bone.perp), 0.0, epsilon = 1e-12);
        assert_relative_eq!(bone.up.dot(bone.dir), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_frame_along_z_axis() {
        let j = joints(DVec3::ZERO, DVec3::new(0.0, 0.0, 3.0));
        let bone = BoneLink::from_def(&def(), &j);
        assert_relative_eq!(bone.perp.length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(bone.up.length(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_orthonormalize_degenerate_up() {
        let j = joints(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0));
        let mut bone = BoneLink::from_def(&def(), &j);
        bone.up = DVec3::X;
        bone.orthonormalize();
        assert_relative_eq!(bone.up.dot(bone.dir), 0.0, epsilon = 1e-12);
        assert_relative_eq!(bone.up.length(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_local_roundtrip() {
        let j = joints(DVec3::new(1.0, 1.0, 0.0), DVec3::new(1.0, 4.0, 1.0));
        let bone = BoneLink::from_def(&def(), &j);
        let p = DVec3::new(0.3, 2.0, -0.7);
        let l = bone.world_to_local(&j, p);
        let back = bone.local_to_world(&j, l.x, l.y, l.z);
        assert_relative_eq!(back.x, p.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-12);
        assert_relative_eq!(back.z, p.z, epsilon = 1e-12);
    }
}
