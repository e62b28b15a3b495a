//! 子步积分
//!
//! 每子步三个阶段：
//! 1. 关节-骨骼排斥（使用上一子步的骨骼方向）
//! 2. 骨骼弹簧、阻尼与 up 轴扭转耦合
//! 3. 重力、空气阻力与半隐式欧拉积分

use glam::DVec3;
use rand::Rng;

use crate::geometry::{normalize, segment_fraction, NORMALIZE_EPSILON};
use crate::interface::{substeps, AudioSink, EffectSink, SoundId};
use crate::skeleton::{BoneLink, Joint, JointId, LockDirection, Skeleton};
use crate::stage::Stage;

use super::collision::impact_sound_chance;
use super::PhysicsConfig;

impl Skeleton {
    /// 推进一个子步
    ///
    /// 调用前外部力（拖拽、站立辅助、舞台碰撞）应已累加到关节加速度上。
    /// 积分结束后所有关节的加速度被清零。
    pub fn animate<R: Rng + ?Sized>(&mut self, dt: f64, rng: &mut R) {
        apply_contacts(&mut self.joints, &self.bones, &self.config, rng);
        apply_bone_forces(&mut self.joints, &mut self.bones, &self.config, dt);
        integrate(&mut self.joints, &self.config, dt);
    }

    /// 被动模拟一个子步：舞台碰撞（含撞击音效）后积分
    pub fn simulate_step<E, A, R>(
        &mut self,
        dt: f64,
        stage: &Stage,
        effects: &mut E,
        audio: &mut A,
        rng: &mut R,
    ) where
        E: EffectSink + ?Sized,
        A: AudioSink + ?Sized,
        R: Rng + ?Sized,
    {
        self.clear_ground_contacts();
        let hit = self.apply_stage(stage, dt, effects);
        if rng.gen::<f64>() < impact_sound_chance(dt, hit) {
            audio.play(SoundId::Impact(rng.gen_range(0..2)), 1.0);
        }
        self.animate(dt, rng);
    }

    /// 按 `passive_substep` 切分一帧并逐步模拟
    pub fn advance<E, A, R>(
        &mut self,
        frame_dt: f64,
        stage: &Stage,
        effects: &mut E,
        audio: &mut A,
        rng: &mut R,
    ) where
        E: EffectSink + ?Sized,
        A: AudioSink + ?Sized,
        R: Rng + ?Sized,
    {
        for dt in substeps(frame_dt, self.config.passive_substep) {
            self.simulate_step(dt, stage, effects, audio, rng);
        }
    }
}

/// 关节与不含它的骨骼之间的摩擦与排斥
fn apply_contacts<R: Rng + ?Sized>(
    joints: &mut [Joint],
    bones: &[BoneLink],
    cfg: &PhysicsConfig,
    rng: &mut R,
) {
    for id in JointId::ALL {
        let j = id.index();
        if !joints[j].collides() {
            continue;
        }
        for bone in bones {
            if bone.width <= 0.0 || bone.contains(id) {
                continue;
            }
            let (a, b) = (bone.a.index(), bone.b.index());
            let joint = &joints[j];
            let x = segment_fraction(joint.pos, joints[a].pos, bone.dir);
            let d = bone.point_at(joints, x) - joint.pos;
            let l = d.length();
            let min_l = bone.width + joint.width / 2.0;
            if l >= min_l {
                continue;
            }

            let friction = (bone.velocity_at(joints, x) - joint.vel) * cfg.contact_friction;

            // 关节恰好落在骨骼轴线上时随机选一个分离方向
            let (normal, l) = if l < NORMALIZE_EPSILON {
                (random_direction(rng), 0.0)
            } else {
                (d / l, l)
            };
            let bounce = normal * ((l - min_l) * cfg.contact_stiffness);

            let accel = friction + bounce;
            joints[j].accel += accel;
            joints[a].accel -= accel * (2.0 - x * 2.0).min(1.0);
            joints[b].accel -= accel * (x * 2.0).min(1.0);
        }
    }
}

/// 骨骼弹簧、阻尼与坐标系更新
fn apply_bone_forces(joints: &mut [Joint], bones: &mut [BoneLink], cfg: &PhysicsConfig, dt: f64) {
    for i in 0..bones.len() {
        let (a, b) = (bones[i].a.index(), bones[i].b.index());
        let dir = joints[b].pos - joints[a].pos;
        let len_sq = dir.length_squared();
        let l = len_sq.sqrt();
        if l < NORMALIZE_EPSILON {
            continue;
        }

        let bone = &bones[i];
        let mut accel = dir * ((l - bone.rest_length) * cfg.spring_scale * bone.strength / l);

        let rel = joints[b].vel - joints[a].vel;
        accel += dir * (rel.dot(dir) * cfg.axial_damping / len_sq);
        accel += bone.up * (rel.dot(bone.up) * cfg.lateral_damping);
        accel += bone.perp * (rel.dot(bone.perp) * cfg.lateral_damping);
        joints[a].accel += accel;
        joints[b].accel -= accel;

        bones[i].dir = dir;

        let bone = &bones[i];
        let rotation = bone.locks.iter().fold(DVec3::ZERO, |acc, lock| {
            let other = &bones[lock.other];
            match lock.direction {
                LockDirection::Absolute => acc + (other.up - bone.up) * other.strength,
                direction => {
                    let v = normalize(dir.cross(other.dir));
                    acc + (v - bone.up) * (direction.sign() * other.strength)
                }
            }
        });

        let bone = &mut bones[i];
        bone.up += rotation * cfg.twist_rate * dt;
        bone.orthonormalize();
    }
}

/// 重力、阻力与速度/位置积分
fn integrate(joints: &mut [Joint], cfg: &PhysicsConfig, dt: f64) {
    for joint in joints {
        joint.accel.y += cfg.gravity_y;
        joint.accel -= joint.vel * cfg.air_drag;

        joint.vel += joint.accel * dt;
        let speed_sqr = joint.vel.length_squared();
        if speed_sqr < cfg.idle_velocity_sqr {
            joint.vel = DVec3::ZERO;
        } else if speed_sqr > cfg.max_velocity * cfg.max_velocity {
            joint.vel *= cfg.max_velocity / speed_sqr.sqrt();
        }
        joint.pos += joint.vel * dt;
        joint.accel = DVec3::ZERO;
    }
}

fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> DVec3 {
    loop {
        let v = DVec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}
