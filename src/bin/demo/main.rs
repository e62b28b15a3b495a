//! 无头演示：加载角色网格，在内置舞台上自由模拟若干秒并输出日志
//!
//! 用法：`cargo run --features demo --bin demo -- [model.obj] [seconds]`

use glam::{DVec3, Vec4};
use rand::rngs::StdRng;
use rand::SeedableRng;

use ragdoll_engine::game::{FrameInput, GameSession, SessionStatus};
use ragdoll_engine::interface::{AudioSink, EffectSink, SoundId};
use ragdoll_engine::{JointId, PhysicsConfig, Skeleton};

const FRAME_DT: f64 = 1.0 / 60.0;

/// 只记录日志的音频
struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, sound: SoundId, volume: f64) {
        log::debug!("[Demo] 播放 {:?} 音量 {:.2}", sound, volume);
    }
}

/// 统计烟雾粒子数
#[derive(Default)]
struct SmokeCounter(f64);

impl EffectSink for SmokeCounter {
    fn add_smoke(&mut self, _pos: DVec3, _color: Vec4, _duration: f64, count: f64, _size: f64) {
        self.0 += count;
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let model = args.next();
    let seconds: f64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(5.0);

    let skeleton = match model {
        Some(path) => match Skeleton::load(&path, DVec3::ZERO) {
            Ok(s) => s,
            Err(e) => {
                log::error!("[Demo] 加载模型失败: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            log::info!("[Demo] 未指定模型，使用无蒙皮骨骼");
            Skeleton::without_skin(DVec3::ZERO, PhysicsConfig::default())
        }
    };

    let mut rng = StdRng::seed_from_u64(0);
    let mut session = GameSession::free_play(skeleton, &mut rng);
    let mut smoke = SmokeCounter::default();

    let frames = (seconds / FRAME_DT) as usize;
    for frame in 0..frames {
        let input = FrameInput {
            dt: FRAME_DT,
            music_time: frame as f64 * FRAME_DT,
            pointer: None,
        };
        if session.frame(&input, &mut LogAudio, &mut smoke, &mut rng) != SessionStatus::Running {
            break;
        }
        if frame % 60 == 0 {
            let pelvis = session.skeleton().joint(JointId::Pelvis);
            log::info!(
                "[Demo] t={:.1}s 骨盆 ({:.2}, {:.2}, {:.2}) 速度 {:.3}",
                frame as f64 * FRAME_DT,
                pelvis.pos.x,
                pelvis.pos.y,
                pelvis.pos.z,
                pelvis.vel.length()
            );
        }
    }

    log::info!(
        "[Demo] 结束：得分 {}，动能 {:.3}，烟雾粒子 {:.1}",
        session.score(),
        session.skeleton().kinetic_energy(),
        smoke.0
    );
}
