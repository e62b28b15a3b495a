//! 固定的人形拓扑：关节静止偏移与骨骼表

use glam::DVec3;

use super::JointId::{self, *};
use super::JOINT_COUNT;

/// 关节静止姿态（相对骨盆/原点），顺序与 [`JointId`] 一致
pub const JOINT_REST_OFFSETS: [DVec3; JOINT_COUNT] = [
    DVec3::new(-7.0, 2.5, 1.0), // 手
    DVec3::new(7.0, 2.5, 1.0),
    DVec3::new(-4.0, 3.8, 0.0), // 肘
    DVec3::new(4.0, 3.8, 0.0),
    DVec3::new(-1.8, 4.0, 0.0), // 肩
    DVec3::new(1.8, 4.0, 0.0),
    DVec3::new(0.0, 5.5, 0.0), // 颈
    DVec3::new(0.0, 4.5, 0.0), // 背
    DVec3::new(0.0, 7.0, 0.0), // 头
    // 下半身
    DVec3::new(-1.5, -6.5, 0.0), // 脚
    DVec3::new(1.5, -6.5, 0.0),
    DVec3::new(-1.0, -3.0, 0.0), // 膝
    DVec3::new(1.0, -3.0, 0.0),
    DVec3::new(-1.0, -0.5, 0.0), // 髋
    DVec3::new(1.0, -0.5, 0.0),
    DVec3::new(0.0, 0.0, 0.0), // 骨盆
];

/// 骨骼定义
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneDef {
    pub a: JointId,
    pub b: JointId,
    /// 碰撞半径，0 表示不参与碰撞与蒙皮
    pub width: f64,
    /// 弹簧强度（乘以配置中的 spring_scale）
    pub strength: f64,
    pub priority: f64,
}

const fn bone(a: JointId, b: JointId, width: f64, strength: f64, priority: f64) -> BoneDef {
    BoneDef { a, b, width, strength, priority }
}

pub const BONE_COUNT: usize = 29;

pub const BONE_DEFS: [BoneDef; BONE_COUNT] = [
    // 手臂
    bone(LeftHand, LeftElbow, 0.3, 1.0, 0.0),
    bone(LeftElbow, LeftShoulder, 0.5, 1.0, 0.0),
    bone(RightHand, RightElbow, 0.3, 1.0, 0.0),
    bone(RightElbow, RightShoulder, 0.5, 1.0, 0.0),
    // 躯干
    bone(Pelvis, Back, 0.4, 1.0, 1.0),
    bone(RightShoulder, RightHip, 0.4, 1.0, 1.0),
    bone(LeftShoulder, LeftHip, 0.4, 1.0, 1.0),
    bone(LeftShoulder, Back, 0.6, 1.0, 1.0),
    bone(RightShoulder, Back, 0.6, 1.0, 1.0),
    bone(LeftShoulder, RightShoulder, 0.0, 1.0, 0.0),
    // 头
    bone(Neck, Head, 1.0, 1.0, 0.0),
    bone(Back, Neck, 0.5, 1.0, 0.0),
    // 腿
    bone(LeftFoot, LeftKnee, 0.5, 1.0, 0.0),
    bone(RightFoot, RightKnee, 0.5, 1.0, 0.0),
    bone(LeftKnee, LeftHip, 1.0, 1.0, 0.0),
    bone(RightKnee, RightHip, 1.0, 1.0, 0.0),
    // 交叉支撑
    bone(LeftHip, Back, 0.0, 1.0, 1.0),
    bone(RightHip, Back, 0.0, 1.0, 1.0),
    bone(Pelvis, RightShoulder, 0.0, 1.0, 1.0),
    bone(Pelvis, LeftShoulder, 0.0, 1.0, 1.0),
    bone(LeftHip, RightHip, 0.0, 1.0, 0.0),
    bone(LeftHip, Pelvis, 0.0, 1.0, 0.0),
    bone(RightHip, Pelvis, 0.0, 1.0, 0.0),
    // 保持抬头
    bone(Head, LeftHip, 0.0, 0.3, 0.0),
    bone(Head, RightHip, 0.0, 0.3, 0.0),
    // 保持四肢伸直
    bone(LeftFoot, LeftShoulder, 0.0, 0.2, 0.0),
    bone(RightFoot, RightShoulder, 0.0, 0.2, 0.0),
    bone(LeftHand, RightShoulder, 0.0, 0.2, 0.0),
    bone(RightHand, LeftShoulder, 0.0, 0.2, 0.0),
];
