//! 菜单背景里跳舞的角色
//!
//! 不做动作识别：双手、背部和骨盆被弹簧拉向随时间摆动的目标，
//! 只与一块水平地板碰撞。

use glam::DVec3;
use rand::Rng;

use crate::geometry::Plane;
use crate::interface::{clamp_frame_dt, substeps, NullSink};
use crate::skeleton::{JointId, Skeleton};
use crate::stage::Block;

const FLOOR_Y: f64 = 0.0;
const SPAWN: DVec3 = DVec3::new(0.0, 7.0, 0.0);
const SUBSTEP: f64 = 0.001;
const HAND_PULL: f64 = 100.0;
const BODY_PULL: f64 = 200.0;
const FEET_WEIGHT: f64 = 20.0;

#[derive(Debug)]
pub struct MenuDancer {
    skeleton: Skeleton,
    floor: Block,
    time: f64,
}

impl MenuDancer {
    pub fn new(mut skeleton: Skeleton) -> Self {
        skeleton.reset(SPAWN);
        Self {
            skeleton,
            floor: Block::new(vec![Plane::new(DVec3::Y, FLOOR_Y)]),
            time: 0.0,
        }
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn into_skeleton(self) -> Skeleton {
        self.skeleton
    }

    /// 双手目标的竖直摆动量
    #[inline]
    fn sway(&self) -> f64 {
        (self.time * 3.0).sin() * 5.0
    }

    /// 推进一帧并更新蒙皮
    pub fn frame<R: Rng + ?Sized>(&mut self, frame_dt: f64, rng: &mut R) {
        let frame_dt = clamp_frame_dt(frame_dt);
        self.time += frame_dt;
        let y = self.sway();
        let hands = [
            (JointId::LeftHand, DVec3::new(-7.0, 10.0 + y, 0.0)),
            (JointId::RightHand, DVec3::new(7.0, 10.0 - y, 0.0)),
            (JointId::Back, DVec3::new(0.0, FLOOR_Y + 12.0, 0.0)),
            (JointId::Pelvis, DVec3::new(0.0, FLOOR_Y + 7.0, 0.0)),
        ];

        for dt in substeps(frame_dt, SUBSTEP) {
            for (i, (id, target)) in hands.iter().enumerate() {
                let k = if i < 2 { HAND_PULL } else { BODY_PULL };
                let accel = (*target - self.skeleton.joint(*id).pos) * k;
                self.skeleton.push(*id, accel);
            }
            let feet = DVec3::new(0.0, -FEET_WEIGHT, 0.0);
            self.skeleton.push(JointId::LeftFoot, feet);
            self.skeleton.push(JointId::RightFoot, feet);

            self.skeleton.clear_ground_contacts();
            self.skeleton.apply_block(&self.floor, 0.0, &mut NullSink);
            self.skeleton.animate(dt, rng);
        }
        self.skeleton.calc_posture();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PhysicsConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_dancer_stays_upright() {
        let s = Skeleton::without_skin(DVec3::new(30.0, 40.0, 0.0), PhysicsConfig::default());
        let mut dancer = MenuDancer::new(s);
        assert_eq!(dancer.skeleton().joint(JointId::Pelvis).pos, SPAWN);

        let mut rng = StdRng::seed_from_u64(31);
        for _ in 0..150 {
            dancer.frame(0.02, &mut rng);
        }
        let s = dancer.skeleton();
        let pelvis = s.joint(JointId::Pelvis).pos;
        let back = s.joint(JointId::Back).pos;
        assert!(back.y > pelvis.y);
        assert!(pelvis.y > 3.0 && pelvis.y < 11.0);
        for joint in s.joints() {
            assert!(joint.pos.is_finite());
            assert!(joint.pos.y > FLOOR_Y - 1.0);
        }
    }

    #[test]
    fn test_hands_sway_in_opposition() {
        let s = Skeleton::without_skin(SPAWN, PhysicsConfig::default());
        let mut dancer = MenuDancer::new(s);
        dancer.time = 0.5;
        let y = dancer.sway();
        assert!(y > 0.0);
        assert!((y - (1.5f64).sin() * 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_ground_flags_follow_floor_contact() {
        let s = Skeleton::without_skin(SPAWN, PhysicsConfig::default());
        let mut dancer = MenuDancer::new(s);
        let mut rng = StdRng::seed_from_u64(32);
        dancer.frame(0.05, &mut rng);
        assert!(dancer.skeleton().joint(JointId::LeftFoot).on_ground);

        // 抬离地板后，下一帧的着地标记随之清除
        for joint in dancer.skeleton.joints.iter_mut() {
            joint.pos.y += 50.0;
        }
        dancer.frame(0.001, &mut rng);
        assert!(dancer.skeleton().joints().iter().all(|j| !j.on_ground));
    }
}
