//! 动作识别
//!
//! 从关节运动学中识别离散的舞蹈动作。每种动作用一个锁存标志实现迟滞：
//! 超过触发阈值时报告一次，降到复位阈值以下后才能再次报告。

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use bitflags::bitflags;
use glam::DVec3;

use crate::geometry::wrap_angle;
use crate::skeleton::{JointId, Skeleton};

use super::MoveKind;

bitflags! {
    /// 识别器锁存状态
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ClassifierFlags: u8 {
        /// 被拖动的关节正在快速移动
        const MOVING = 1 << 0;
        /// 骨盆正在上升
        const JUMPING = 1 << 1;
        /// 正在原地旋转（站立辅助改为拉向旋转锚点）
        const SPINNING = 1 << 2;
        /// 站立辅助开启
        const STANDING = 1 << 3;
    }
}

/// 识别阈值
#[derive(Clone, Debug, PartialEq)]
pub struct MoveThresholds {
    /// 拖动关节速度平方超过此值触发肢体动作
    pub limb_trigger_sqr: f64,
    /// 拖动关节速度平方低于此值复位
    pub limb_reset_sqr: f64,
    /// 骨盆竖直速度超过此值触发跳跃
    pub jump_trigger: f64,
    pub jump_reset: f64,
    /// 累计转角超过此值开始旋转
    pub spin_start: f64,
    /// 开始旋转要求背部高出骨盆的距离
    pub spin_min_height: f64,
    /// 转动完成的最小累计转角（每满一次计一倍）
    pub turn_unit: f64,
    /// 累计俯仰超过此值触发空翻
    pub flip_angle: f64,
    /// 角速度低于此值视为停止
    pub rest_rate: f64,
    /// 拖拽弹簧
    pub drag_stiffness: f64,
    pub drag_damping: f64,
    /// 站立辅助
    pub stand_strength: f64,
    pub spin_strength: f64,
    pub stand_pelvis_height: f64,
    pub stand_back_height: f64,
    pub stand_min_floor: f64,
    pub feet_weight: f64,
}

impl Default for MoveThresholds {
    fn default() -> Self {
        Self {
            limb_trigger_sqr: 500.0,
            limb_reset_sqr: 100.0,
            jump_trigger: 10.0,
            jump_reset: 5.0,
            spin_start: FRAC_PI_4,
            spin_min_height: 3.0,
            turn_unit: FRAC_PI_2,
            flip_angle: PI * 2.0,
            rest_rate: 0.1,
            drag_stiffness: 200.0,
            drag_damping: 10.0,
            stand_strength: 200.0,
            spin_strength: 500.0,
            stand_pelvis_height: 7.0,
            stand_back_height: 5.0,
            stand_min_floor: -20.0,
            feet_weight: 20.0,
        }
    }
}

/// 识别出的动作及倍数（转身按整圈数计倍，其余为 1）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectedMove {
    pub kind: MoveKind,
    pub mult: u32,
}

impl DetectedMove {
    fn single(kind: MoveKind) -> Self {
        Self { kind, mult: 1 }
    }
}

/// 拖拽目标
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragTarget {
    pub joint: JointId,
    pub pos: DVec3,
    pub vel: DVec3,
}

#[derive(Clone, Debug)]
pub struct MoveClassifier {
    pub thresholds: MoveThresholds,
    flags: ClassifierFlags,
    /// 累计转角
    rotation: f64,
    last_turn: f64,
    /// 累计俯仰
    flip: f64,
    last_pitch: f64,
    /// 开始旋转时骨盆位置
    spin_anchor: DVec3,
}

/// 肩线的偏航角
fn yaw(skeleton: &Skeleton) -> f64 {
    let d = skeleton.joint(JointId::RightShoulder).pos - skeleton.joint(JointId::LeftShoulder).pos;
    d.x.atan2(d.z)
}

/// 背部相对骨盆的俯仰角
fn pitch(skeleton: &Skeleton) -> f64 {
    let d = skeleton.joint(JointId::Back).pos - skeleton.joint(JointId::Pelvis).pos;
    (d.x + d.z).atan2(d.y)
}

impl MoveClassifier {
    pub fn new(thresholds: MoveThresholds) -> Self {
        Self {
            thresholds,
            flags: ClassifierFlags::STANDING,
            rotation: 0.0,
            last_turn: 0.0,
            flip: 0.0,
            last_pitch: 0.0,
            spin_anchor: DVec3::ZERO,
        }
    }

    /// 清空锁存与累计量，并以当前姿态作为角度基准
    pub fn reset(&mut self, skeleton: &Skeleton) {
        self.flags = ClassifierFlags::STANDING;
        self.rotation = 0.0;
        self.flip = 0.0;
        self.last_turn = yaw(skeleton);
        self.last_pitch = pitch(skeleton);
        self.spin_anchor = skeleton.joint(JointId::Pelvis).pos;
    }

    #[inline]
    pub fn flags(&self) -> ClassifierFlags {
        self.flags
    }

    #[inline]
    pub fn is_standing(&self) -> bool {
        self.flags.contains(ClassifierFlags::STANDING)
    }

    pub fn set_standing(&mut self, standing: bool) {
        self.flags.set(ClassifierFlags::STANDING, standing);
    }

    pub fn toggle_standing(&mut self) {
        self.flags.toggle(ClassifierFlags::STANDING);
    }

    #[inline]
    pub fn is_spinning(&self) -> bool {
        self.flags.contains(ClassifierFlags::SPINNING)
    }

    /// 当前累计转角
    #[inline]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// 拖动关节的速度检测
    ///
    /// 躯干关节被快速拖动时关闭站立辅助而不报告动作。
    pub fn classify_drag(&mut self, joint: JointId, speed_sqr: f64) -> Option<DetectedMove> {
        if speed_sqr > self.thresholds.limb_trigger_sqr {
            let mut detected = None;
            if !self.flags.contains(ClassifierFlags::MOVING) {
                match MoveKind::for_dragged_joint(joint) {
                    Some(kind) => detected = Some(DetectedMove::single(kind)),
                    None => self.flags.remove(ClassifierFlags::STANDING),
                }
            }
            self.flags.insert(ClassifierFlags::MOVING);
            detected
        } else {
            if speed_sqr < self.thresholds.limb_reset_sqr {
                self.flags.remove(ClassifierFlags::MOVING);
            }
            None
        }
    }

    /// 骨盆竖直速度检测
    pub fn classify_jump(&mut self, pelvis_vel_y: f64) -> Option<DetectedMove> {
        if pelvis_vel_y > self.thresholds.jump_trigger {
            let first = !self.flags.contains(ClassifierFlags::JUMPING);
            self.flags.insert(ClassifierFlags::JUMPING);
            first.then(|| DetectedMove::single(MoveKind::Jump))
        } else {
            if pelvis_vel_y < self.thresholds.jump_reset {
                self.flags.remove(ClassifierFlags::JUMPING);
            }
            None
        }
    }

    /// 肩线偏航累计
    ///
    /// 转动停止（角速度 < `rest_rate`）时结算累计转角。
    pub fn classify_turn(&mut self, skeleton: &Skeleton, dt: f64) -> Option<DetectedMove> {
        if dt <= 0.0 {
            return None;
        }
        let th = &self.thresholds;
        let a = yaw(skeleton);
        let turn = wrap_angle(a - self.last_turn) / dt;
        self.last_turn = a;

        let back = skeleton.joint(JointId::Back).pos;
        let pelvis = skeleton.joint(JointId::Pelvis).pos;
        if self.rotation.abs() > th.spin_start && back.y > pelvis.y + th.spin_min_height {
            if !self.flags.contains(ClassifierFlags::SPINNING) {
                self.spin_anchor = pelvis;
            }
            self.flags.insert(ClassifierFlags::SPINNING);
        }

        let mut detected = None;
        if turn.abs() < th.rest_rate {
            let mult = (self.rotation.abs() / th.turn_unit) as u32;
            if self.rotation > th.turn_unit {
                detected = Some(DetectedMove { kind: MoveKind::TurnLeft, mult });
            } else if self.rotation < -th.turn_unit {
                detected = Some(DetectedMove { kind: MoveKind::TurnRight, mult });
            }
            self.flags.remove(ClassifierFlags::SPINNING);
            self.rotation = 0.0;
        }
        self.rotation += turn * dt;
        detected
    }

    /// 背部俯仰累计，超过一整圈报告空翻
    pub fn classify_flip(&mut self, skeleton: &Skeleton, dt: f64) -> Option<DetectedMove> {
        if dt <= 0.0 {
            return None;
        }
        let a = pitch(skeleton);
        let rate = wrap_angle(a - self.last_pitch) / dt;
        self.last_pitch = a;

        let mut detected = None;
        if self.flip.abs() > self.thresholds.flip_angle {
            detected = Some(DetectedMove::single(MoveKind::Flip));
            self.flip = 0.0;
        }
        if rate.abs() < self.thresholds.rest_rate {
            self.flip = 0.0;
        }
        self.flip += rate * dt;
        detected
    }

    /// 拖拽弹簧：把关节拉向指针位置并匹配指针速度
    pub fn apply_drag(&self, skeleton: &mut Skeleton, target: &DragTarget) {
        let joint = skeleton.joint(target.joint);
        let accel = (target.pos - joint.pos) * self.thresholds.drag_stiffness
            + (target.vel - joint.vel) * self.thresholds.drag_damping;
        skeleton.push(target.joint, accel);
    }

    /// 站立辅助
    ///
    /// 旋转中或（站立模式且有着地的下半身关节高于 `stand_min_floor`）时，
    /// 把骨盆和背部拉到脚上方，并给脚加额外重量。返回是否生效。
    pub fn apply_standing_assist(&self, skeleton: &mut Skeleton) -> bool {
        let th = &self.thresholds;
        let floor = skeleton.floor_height();
        let spinning = self.is_spinning();
        let standing = self.is_standing() && floor.is_some_and(|f| f > th.stand_min_floor);
        if !spinning && !standing {
            return false;
        }

        let pelvis = skeleton.joint(JointId::Pelvis).pos;
        let (mut target, strength) = if spinning {
            (self.spin_anchor, th.spin_strength)
        } else {
            let floor = floor.unwrap_or(pelvis.y - th.stand_pelvis_height);
            (
                DVec3::new(pelvis.x, floor + th.stand_pelvis_height, pelvis.z),
                th.stand_strength,
            )
        };

        skeleton.push(JointId::Pelvis, (target - pelvis) * strength);
        target.y += th.stand_back_height;
        let back = skeleton.joint(JointId::Back).pos;
        skeleton.push(JointId::Back, (target - back) * strength);

        let feet = DVec3::new(0.0, -th.feet_weight, 0.0);
        skeleton.push(JointId::LeftFoot, feet);
        skeleton.push(JointId::RightFoot, feet);
        true
    }

    /// 一个子步的完整识别：拖拽 → 跳跃 → 转身 → 空翻 → 站立辅助
    ///
    /// 识别到的动作按发生顺序追加到 `out`。
    pub fn step(
        &mut self,
        skeleton: &mut Skeleton,
        drag: Option<&DragTarget>,
        dt: f64,
        out: &mut Vec<DetectedMove>,
    ) {
        if let Some(target) = drag {
            self.apply_drag(skeleton, target);
            let speed_sqr = skeleton.joint(target.joint).speed_sqr();
            out.extend(self.classify_drag(target.joint, speed_sqr));
        }
        out.extend(self.classify_jump(skeleton.joint(JointId::Pelvis).vel.y));
        out.extend(self.classify_turn(skeleton, dt));
        out.extend(self.classify_flip(skeleton, dt));
        self.apply_standing_assist(skeleton);
    }
}

impl Default for MoveClassifier {
    fn default() -> Self {
        Self::new(MoveThresholds::default())
    }
}
