//! 僵尸
//!
//! 僵尸是半径固定的质点：与舞台凸块碰撞、彼此排斥，
//! 着地时走向玩家（玩家刚跳出好动作时则后退），碰到玩家即结束本局。

use std::f64::consts::PI;

use glam::DVec3;
use rand::Rng;

use crate::geometry::{normalize, Ray};
use crate::interface::{AudioSink, SoundId};
use crate::stage::{Block, Stage};

/// 僵尸半径
pub const ZOMBIE_SIZE: f64 = 4.0;
/// 出生圈半径
pub const SPAWN_RADIUS: f64 = 100.0;

const GRAVITY: f64 = -20.0;
const SEPARATION_STIFFNESS: f64 = 500.0;
const WALK_ACCEL: f64 = 30.0;
const GROUND_FRICTION: f64 = 10.0;
const GROUND_STIFFNESS: f64 = 1000.0;
const GROUND_NORMAL_Y: f64 = 0.5;
const GROWL_RATE: f64 = 0.1;
const GROWL_MAX_VOLUME: f64 = 5.0;
const THROW_GAIN: f64 = 20.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Zombie {
    pub pos: DVec3,
    pub vel: DVec3,
    pub accel: DVec3,
    pub on_ground: bool,
    /// 行走动画相位
    pub anim: f64,
    /// 空中飞行累计距离，落地时归零
    pub fly_anim: f64,
}

impl Zombie {
    pub fn at(pos: DVec3) -> Self {
        Self {
            pos,
            vel: DVec3::ZERO,
            accel: DVec3::ZERO,
            on_ground: false,
            anim: 0.0,
            fly_anim: 0.0,
        }
    }

    /// 面向玩家的朝向角（含行走摇摆）
    pub fn facing(&self, player: DVec3) -> f64 {
        let d = player - self.pos;
        d.x.atan2(d.z) + (self.anim.sin() * 0.4 - 0.2)
    }

    fn apply_block(&mut self, block: &Block, passes: usize) {
        let Some(contact) = block.nearest_surface(self.pos, passes) else {
            return;
        };
        if contact.distance >= ZOMBIE_SIZE {
            return;
        }
        if contact.plane_normal.y > GROUND_NORMAL_Y {
            self.on_ground = true;
        }
        self.accel -= self.vel * GROUND_FRICTION;
        self.accel += contact.normal * ((ZOMBIE_SIZE - contact.distance) * GROUND_STIFFNESS);
    }
}

/// 一局中的所有僵尸
#[derive(Clone, Debug, Default)]
pub struct Horde {
    zombies: Vec<Zombie>,
}

impl Horde {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在 `origin` 周围均匀地围一圈僵尸
    pub fn spawn_ring(origin: DVec3, count: usize) -> Self {
        let zombies = (0..count)
            .map(|i| {
                let a = i as f64 * (PI * 2.0) / count as f64;
                Zombie::at(origin + DVec3::new(a.cos() * SPAWN_RADIUS, ZOMBIE_SIZE, a.sin() * SPAWN_RADIUS))
            })
            .collect();
        Self { zombies }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.zombies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.zombies.is_empty()
    }

    pub fn zombies(&self) -> &[Zombie] {
        &self.zombies
    }

    pub fn push(&mut self, zombie: Zombie) {
        self.zombies.push(zombie);
    }

    pub fn clear(&mut self) {
        self.zombies.clear();
    }

    /// 拾取射线附近（距离小于半径）最近的僵尸
    pub fn pick(&self, ray: &Ray) -> Option<usize> {
        let mut nearest_d = ZOMBIE_SIZE;
        let mut nearest = None;
        for (i, zombie) in self.zombies.iter().enumerate() {
            let dist = (zombie.pos - ray.project_forward(zombie.pos)).length();
            if dist < nearest_d {
                nearest_d = dist;
                nearest = Some(i);
            }
        }
        nearest
    }

    /// 把被抓住的僵尸拉向指针射线
    pub fn throw(&mut self, index: usize, ray: &Ray) {
        if let Some(zombie) = self.zombies.get_mut(index) {
            let target = ray.project(zombie.pos);
            zombie.accel += (target - zombie.pos) * THROW_GAIN;
        }
    }

    /// 推进一个子步
    ///
    /// `retreat` 为真时僵尸背向玩家行走。返回是否有僵尸抓到了玩家。
    pub fn step<A, R>(
        &mut self,
        player: DVec3,
        retreat: bool,
        stage: &Stage,
        passes: usize,
        dt: f64,
        audio: &mut A,
        rng: &mut R,
    ) -> bool
    where
        A: AudioSink + ?Sized,
        R: Rng + ?Sized,
    {
        self.separate();

        let mut caught = false;
        for zombie in &mut self.zombies {
            zombie.accel.y += GRAVITY;
            zombie.accel -= zombie.vel;

            if zombie.on_ground {
                let mut d = player - zombie.pos;
                d.y = 0.0;
                if retreat {
                    d = -d;
                }
                zombie.accel += normalize(d) * WALK_ACCEL;
            }

            let to_player = player - zombie.pos;
            if to_player.length() < ZOMBIE_SIZE {
                caught = true;
            }

            if rng.gen::<f64>() < dt * GROWL_RATE {
                let volume = (1000.0 / to_player.length_squared()).min(GROWL_MAX_VOLUME);
                audio.play(SoundId::Zombie(rng.gen_range(0..2)), volume);
            }

            zombie.on_ground = false;
            for block in &stage.blocks {
                zombie.apply_block(block, passes);
            }
            if zombie.on_ground {
                if zombie.fly_anim > 0.0 {
                    audio.play(SoundId::Zombie(rng.gen_range(0..2)), 1.0);
                }
                zombie.fly_anim = 0.0;
            } else {
                zombie.fly_anim += zombie.vel.length() * dt;
            }

            zombie.vel += zombie.accel * dt;
            zombie.pos += zombie.vel * dt;
            if zombie.on_ground {
                zombie.anim += zombie.vel.length() * dt;
            }
            zombie.accel = DVec3::ZERO;
        }

        if caught {
            log::info!("[Game] 玩家被僵尸抓住");
        }
        caught
    }

    /// 两两排斥
    fn separate(&mut self) {
        let min_l = ZOMBIE_SIZE * 2.0;
        for i in 0..self.zombies.len() {
            for j in 0..i {
                let d = self.zombies[j].pos - self.zombies[i].pos;
                let l = d.length();
                if l < min_l && l > 0.0 {
                    let accel = d * ((min_l - l) * SEPARATION_STIFFNESS / l);
                    self.zombies[i].accel -= accel;
                    self.zombies[j].accel += accel;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::NullSink;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Default)]
    struct Sounds(Vec<SoundId>);

    impl AudioSink for Sounds {
        fn play(&mut self, sound: SoundId, _volume: f64) {
            self.0.push(sound);
        }
    }

    #[test]
    fn test_spawn_ring() {
        let origin = DVec3::new(13.0, 17.0, 30.0);
        let horde = Horde::spawn_ring(origin, 2);
        assert_eq!(horde.len(), 2);
        let z = horde.zombies();
        assert_relative_eq!(z[0].pos.x, 113.0);
        assert_relative_eq!(z[0].pos.y, 21.0);
        assert_relative_eq!(z[1].pos.x, -87.0, epsilon = 1e-9);
        assert_relative_eq!(z[1].pos.z, 30.0, epsilon = 1e-9);
        assert!(Horde::spawn_ring(origin, 0).is_empty());
    }

    #[test]
    fn test_walks_toward_player_then_catches() {
        let stage = Stage::flat(0.0, 200.0);
        let mut horde = Horde {
            zombies: vec![Zombie::at(DVec3::new(30.0, 4.0, 0.0))],
        };
        let mut rng = StdRng::seed_from_u64(11);
        let player = DVec3::new(0.0, 4.0, 0.0);
        let mut caught = false;
        for _ in 0..20_000 {
            if horde.step(player, false, &stage, 2, 0.001, &mut NullSink, &mut rng) {
                caught = true;
                break;
            }
        }
        assert!(caught);
        assert!(horde.zombies()[0].pos.x < ZOMBIE_SIZE + 1.0);
    }

    #[test]
    fn test_retreats_after_good_move() {
        let stage = Stage::flat(0.0, 200.0);
        let mut horde = Horde {
            zombies: vec![Zombie::at(DVec3::new(30.0, 4.0, 0.0))],
        };
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..2000 {
            horde.step(DVec3::new(0.0, 4.0, 0.0), true, &stage, 2, 0.001, &mut NullSink, &mut rng);
        }
        assert!(horde.zombies()[0].pos.x > 30.0);
    }

    #[test]
    fn test_separation() {
        let mut horde = Horde {
            zombies: vec![Zombie::at(DVec3::ZERO), Zombie::at(DVec3::new(2.0, 0.0, 0.0))],
        };
        horde.separate();
        let z = horde.zombies();
        assert!(z[0].accel.x < 0.0);
        assert!(z[1].accel.x > 0.0);
        assert_relative_eq!(z[0].accel.x, -z[1].accel.x);
    }

    #[test]
    fn test_pick_and_throw() {
        let mut horde = Horde {
            zombies: vec![Zombie::at(DVec3::new(0.0, 4.0, -20.0)), Zombie::at(DVec3::new(50.0, 4.0, -20.0))],
        };
        let ray = Ray::through(DVec3::new(0.0, 6.0, 0.0), DVec3::new(0.0, 6.0, -100.0));
        assert_eq!(horde.pick(&ray), Some(0));
        horde.throw(0, &ray);
        assert_relative_eq!(horde.zombies()[0].accel.y, 40.0);
        // 越界下标被忽略
        horde.throw(5, &ray);
    }

    #[test]
    fn test_landing_growls() {
        let stage = Stage::flat(0.0, 200.0);
        let mut horde = Horde {
            zombies: vec![Zombie::at(DVec3::new(50.0, 10.0, 0.0))],
        };
        let mut rng = StdRng::seed_from_u64(13);
        let mut sounds = Sounds::default();
        for _ in 0..2000 {
            horde.step(DVec3::new(-50.0, 4.0, 0.0), false, &stage, 2, 0.001, &mut sounds, &mut rng);
        }
        assert!(!sounds.0.is_empty());
        assert!(sounds.0.iter().all(|s| matches!(s, SoundId::Zombie(0 | 1))));
    }
}
