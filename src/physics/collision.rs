//! 关节与舞台凸块的碰撞响应

use glam::Vec4;

use crate::interface::EffectSink;
use crate::skeleton::Skeleton;
use crate::stage::{Block, Stage};

/// 关节擦地时的烟雾颜色
pub const GROUND_SMOKE_COLOR: Vec4 = Vec4::new(0.4, 0.4, 0.4, 0.3);
const GROUND_SMOKE_DURATION: f64 = 5.0;
const GROUND_SMOKE_SIZE: f64 = 3.0;
const GROUND_SMOKE_RATE: f64 = 0.1;

/// 撞击音效在本子步播放的概率
#[inline]
pub fn impact_sound_chance(dt: f64, hit: f64) -> f64 {
    dt * hit * 0.01
}

impl Skeleton {
    /// 清除所有关节的着地标记（每子步碰撞前调用）
    pub fn clear_ground_contacts(&mut self) {
        for joint in &mut self.joints {
            joint.on_ground = false;
        }
    }

    /// 对单个凸块做碰撞响应
    ///
    /// 距表面小于关节半径的关节受到摩擦与反弹加速度，
    /// 表面朝上时标记着地。返回接触关节中最大的速度平方。
    pub fn apply_block<E: EffectSink + ?Sized>(
        &mut self,
        block: &Block,
        dt: f64,
        effects: &mut E,
    ) -> f64 {
        let cfg = &self.config;
        let mut hit = 0.0f64;

        for joint in self.joints.iter_mut().filter(|j| j.collides()) {
            let Some(contact) = block.nearest_surface(joint.pos, cfg.block_passes) else {
                continue;
            };
            if contact.distance >= joint.width {
                continue;
            }

            if contact.plane_normal.y > cfg.ground_normal_y {
                joint.on_ground = true;
            }

            let speed_sqr = joint.speed_sqr();
            effects.add_smoke(
                contact.nearest,
                GROUND_SMOKE_COLOR,
                GROUND_SMOKE_DURATION,
                dt * speed_sqr * GROUND_SMOKE_RATE,
                GROUND_SMOKE_SIZE,
            );
            hit = hit.max(speed_sqr);

            joint.accel -= joint.vel * cfg.ground_friction;
            joint.accel += contact.normal * ((joint.width - contact.distance) * cfg.ground_stiffness);
        }

        hit
    }

    /// 依次对舞台所有凸块做碰撞响应，返回最大撞击速度平方
    pub fn apply_stage<E: EffectSink + ?Sized>(
        &mut self,
        stage: &Stage,
        dt: f64,
        effects: &mut E,
    ) -> f64 {
        stage
            .blocks
            .iter()
            .map(|block| self.apply_block(block, dt, effects))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Plane;
    use crate::interface::NullSink;
    use crate::physics::PhysicsConfig;
    use crate::skeleton::JointId;
    use approx::assert_relative_eq;
    use glam::DVec3;

    #[derive(Default)]
    struct SmokeLog(Vec<(DVec3, f64)>);

    impl EffectSink for SmokeLog {
        fn add_smoke(&mut self, pos: DVec3, _color: Vec4, _duration: f64, count: f64, _size: f64) {
            self.0.push((pos, count));
        }
    }

    fn floor() -> Block {
        Block::new(vec![Plane::new(DVec3::Y, 0.0)])
    }

    #[test]
    fn test_penetrating_joint_is_pushed_out() {
        let mut s = Skeleton::without_skin(DVec3::new(0.0, 6.3, 0.0), PhysicsConfig::default());
        s.joint_mut(JointId::LeftFoot).vel = DVec3::new(0.0, -3.0, 0.0);
        let mut smoke = SmokeLog::default();

        let hit = s.apply_block(&floor(), 0.001, &mut smoke);

        // 脚在 y = -0.2，半径 0.5
        let foot = s.joint(JointId::LeftFoot);
        assert!(foot.on_ground);
        assert!(foot.accel.y > 0.0);
        assert_relative_eq!(foot.accel.y, 30.0 + 0.7 * 1000.0, epsilon = 1e-9);
        assert_relative_eq!(hit, 9.0);
        assert!(!s.joint(JointId::Head).on_ground);
        assert_eq!(smoke.0.len(), 2);
        assert_relative_eq!(smoke.0[0].0.x, -1.5);
    }

    #[test]
    fn test_wall_contact_is_not_ground() {
        let mut s = Skeleton::without_skin(DVec3::new(0.0, 20.0, 0.0), PhysicsConfig::default());
        // 左手 x = -7，半径 0.3；墙体占据 x <= -7.1
        let wall = Block::new(vec![Plane::new(DVec3::X, -7.1)]);
        s.apply_block(&wall, 0.001, &mut NullSink);
        let hand = s.joint(JointId::LeftHand);
        assert!(!hand.on_ground);
        assert!(hand.accel.x > 0.0);
        assert_eq!(s.joint(JointId::RightHand).accel, DVec3::ZERO);
    }

    #[test]
    fn test_clear_ground_contacts() {
        let mut s = Skeleton::without_skin(DVec3::new(0.0, 6.0, 0.0), PhysicsConfig::default());
        s.apply_block(&floor(), 0.001, &mut NullSink);
        assert!(s.joints().iter().any(|j| j.on_ground));
        s.clear_ground_contacts();
        assert!(s.joints().iter().all(|j| !j.on_ground));
    }

    #[test]
    fn test_impact_sound_chance() {
        assert_relative_eq!(impact_sound_chance(0.001, 400.0), 0.004);
        assert_eq!(impact_sound_chance(0.001, 0.0), 0.0);
    }
}
