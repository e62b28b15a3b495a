//! 骨骼系统 - 固定拓扑的人形布娃娃
//!
//! 核心设计思想：
//! - Joint: 质点，带位置/速度/加速度累加器与碰撞半径
//! - BoneLink: 连接两个关节的弹簧，带局部坐标系（dir / up / perp）
//! - Skeleton: 拥有定长关节数组、骨骼表与蒙皮数据
//!
//! 骨骼通过 `JointId` 索引关节，不持有引用，关节数组定长不会重新分配。

mod bone_link;
mod bone_set;
mod definitions;

pub use bone_link::{BoneLink, BoneLock, LockDirection};
pub use bone_set::Skeleton;
pub use definitions::{BoneDef, BONE_COUNT, BONE_DEFS, JOINT_REST_OFFSETS};

use glam::DVec3;

/// 关节数量
pub const JOINT_COUNT: usize = 16;

// ============================================================================
// 关节标识
// ============================================================================

/// 关节索引（数值即关节数组下标）
#[repr(usize)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JointId {
    LeftHand,
    RightHand,
    LeftElbow,
    RightElbow,
    LeftShoulder,
    RightShoulder,
    Neck,
    Back,
    Head,

    // 下半身
    LeftFoot,
    RightFoot,
    LeftKnee,
    RightKnee,
    LeftHip,
    RightHip,
    Pelvis,
}

impl JointId {
    pub const ALL: [JointId; JOINT_COUNT] = [
        JointId::LeftHand,
        JointId::RightHand,
        JointId::LeftElbow,
        JointId::RightElbow,
        JointId::LeftShoulder,
        JointId::RightShoulder,
        JointId::Neck,
        JointId::Back,
        JointId::Head,
        JointId::LeftFoot,
        JointId::RightFoot,
        JointId::LeftKnee,
        JointId::RightKnee,
        JointId::LeftHip,
        JointId::RightHip,
        JointId::Pelvis,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// 头以下的关节（脚、膝、髋、骨盆）
    #[inline]
    pub fn is_lower_body(self) -> bool {
        self.index() > JointId::Head.index()
    }

    /// 静止姿态偏移
    #[inline]
    pub fn rest_offset(self) -> DVec3 {
        JOINT_REST_OFFSETS[self.index()]
    }
}

// ============================================================================
// 关节
// ============================================================================

/// 关节（质点）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Joint {
    pub pos: DVec3,
    pub vel: DVec3,
    /// 加速度累加器，每子步积分后清零
    pub accel: DVec3,
    /// 碰撞半径（相连骨骼宽度的最大值），0 表示不参与碰撞
    pub width: f64,
    /// 本子步是否接触朝上的表面
    pub on_ground: bool,
}

impl Joint {
    pub fn at(pos: DVec3) -> Self {
        Self {
            pos,
            vel: DVec3::ZERO,
            accel: DVec3::ZERO,
            width: 0.0,
            on_ground: false,
        }
    }

    #[inline]
    pub fn collides(&self) -> bool {
        self.width > 0.0
    }

    #[inline]
    pub fn speed_sqr(&self) -> f64 {
        self.vel.length_squared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_ids_match_table() {
        for (i, id) in JointId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(JointId::from_index(i), Some(*id));
        }
        assert_eq!(JointId::from_index(JOINT_COUNT), None);
        assert_eq!(JointId::Pelvis.rest_offset(), DVec3::ZERO);
    }

    #[test]
    fn test_lower_body() {
        assert!(!JointId::Head.is_lower_body());
        assert!(!JointId::LeftHand.is_lower_body());
        assert!(JointId::LeftFoot.is_lower_body());
        assert!(JointId::Pelvis.is_lower_body());
    }
}
