//! 一局游戏
//!
//! 持有玩家骨骼、舞台、关卡进度、识别器、计分与僵尸，
//! 每帧按固定子步驱动：拖拽/识别 → 站立辅助 → 舞台碰撞 → 僵尸 → 积分。

use glam::DVec3;
use rand::Rng;

use crate::geometry::Ray;
use crate::interface::{
    clamp_frame_dt, substeps, AudioSink, EffectSink, RenderSink, SoundId,
};
use crate::physics::impact_sound_chance;
use crate::skeleton::{JointId, Skeleton};
use crate::stage::{Stage, StageId};
use crate::zombie::Horde;

use super::classifier::{DetectedMove, DragTarget, MoveClassifier};
use super::level::Level;
use super::scoring::{Conductor, MoveOutcome, ScoreKeeper};
use super::MoveKind;

/// 指针速度上限
const MAX_POINTER_SPEED: f64 = 100.0;
const FEEDBACK_SMOKE_DURATION: f64 = 10.0;
const FEEDBACK_SMOKE_SIZE: f64 = 5.0;

// ============================================================================
// 指针跟踪
// ============================================================================

/// 拖拽中的指针位置与速度估计
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerTracker {
    pos: DVec3,
    vel: DVec3,
}

impl PointerTracker {
    pub fn grab(pos: DVec3) -> Self {
        Self { pos, vel: DVec3::ZERO }
    }

    /// 用新位置更新速度估计（按帧时长差分，模长不超过 100）
    pub fn track(&mut self, pos: DVec3, frame_dt: f64) {
        self.vel = if frame_dt > 0.0 {
            (pos - self.pos) / frame_dt
        } else {
            DVec3::ZERO
        };
        if self.vel.length_squared() > MAX_POINTER_SPEED * MAX_POINTER_SPEED {
            self.vel = self.vel.normalize() * MAX_POINTER_SPEED;
        }
        self.pos = pos;
    }

    #[inline]
    pub fn pos(&self) -> DVec3 {
        self.pos
    }

    #[inline]
    pub fn vel(&self) -> DVec3 {
        self.vel
    }

    pub fn target(&self, joint: JointId) -> DragTarget {
        DragTarget {
            joint,
            pos: self.pos,
            vel: self.vel,
        }
    }
}

// ============================================================================
// 会话
// ============================================================================

/// 按下指针时选中的对象
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Joint(JointId),
    Zombie(usize),
    Nothing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    /// 关卡时间轴走到终点
    Completed,
    /// 被僵尸抓住
    Caught,
    /// 玩家主动退出
    Quit,
}

/// 每帧输入
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInput {
    /// 实际帧时长（内部钳制到 [0, 0.1]）
    pub dt: f64,
    /// 音乐播放位置（秒），自由模式可为 0
    pub music_time: f64,
    /// 当前指针射线，未按下时可为 `None`
    pub pointer: Option<Ray>,
}

#[derive(Debug)]
pub struct GameSession {
    skeleton: Skeleton,
    stage: Stage,
    conductor: Option<Conductor>,
    classifier: MoveClassifier,
    scorer: ScoreKeeper,
    horde: Horde,
    dragged: Option<(JointId, PointerTracker)>,
    thrown: Option<usize>,
    status: SessionStatus,
    detected: Vec<DetectedMove>,
}

impl GameSession {
    /// 开始一个关卡
    pub fn new(skeleton: Skeleton, level: &'static Level) -> Self {
        let stage = level.stage.build();
        let horde = Horde::spawn_ring(stage.origin, level.zombies);
        log::info!("[Game] 开始关卡 {} ({} 只僵尸)", level.name, level.zombies);
        Self::with_stage(skeleton, stage, Some(Conductor::new(level)), horde)
    }

    /// 自由模式：随机选择舞台，没有僵尸
    pub fn free_play<R: Rng + ?Sized>(skeleton: Skeleton, rng: &mut R) -> Self {
        let id = if rng.gen_bool(0.5) {
            StageId::Saha
        } else {
            StageId::Graveyard
        };
        log::info!("[Game] 自由模式 {:?}", id);
        Self::with_stage(skeleton, id.build(), None, Horde::new())
    }

    /// 在指定舞台上开始（`conductor` 为 `None` 时为自由模式）
    pub fn with_stage(
        mut skeleton: Skeleton,
        stage: Stage,
        conductor: Option<Conductor>,
        horde: Horde,
    ) -> Self {
        skeleton.reset(stage.origin);
        let mut classifier = MoveClassifier::default();
        classifier.reset(&skeleton);
        Self {
            skeleton,
            stage,
            conductor,
            classifier,
            scorer: ScoreKeeper::new(),
            horde,
            dragged: None,
            thrown: None,
            status: SessionStatus::Running,
            detected: Vec::new(),
        }
    }

    // ========================================
    // 访问器
    // ========================================

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// 取回骨骼（下一局复用）
    pub fn into_skeleton(self) -> Skeleton {
        self.skeleton
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn conductor(&self) -> Option<&Conductor> {
        self.conductor.as_ref()
    }

    pub fn classifier(&self) -> &MoveClassifier {
        &self.classifier
    }

    pub fn classifier_mut(&mut self) -> &mut MoveClassifier {
        &mut self.classifier
    }

    pub fn scorer(&self) -> &ScoreKeeper {
        &self.scorer
    }

    pub fn score(&self) -> i64 {
        self.scorer.score()
    }

    pub fn horde(&self) -> &Horde {
        &self.horde
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// 自由模式，或关卡已走完
    pub fn is_completed(&self) -> bool {
        self.conductor.as_ref().map_or(true, Conductor::is_finished)
    }

    pub fn dragged_joint(&self) -> Option<JointId> {
        self.dragged.map(|(id, _)| id)
    }

    // ========================================
    // 输入
    // ========================================

    /// 按下指针：优先选关节，其次选僵尸
    pub fn press(&mut self, ray: &Ray) -> Selection {
        self.release();
        if let Some((id, grab)) = self.skeleton.pick_joint(ray) {
            self.dragged = Some((id, PointerTracker::grab(grab)));
            return Selection::Joint(id);
        }
        if let Some(index) = self.horde.pick(ray) {
            self.thrown = Some(index);
            return Selection::Zombie(index);
        }
        Selection::Nothing
    }

    pub fn release(&mut self) {
        self.dragged = None;
        self.thrown = None;
    }

    pub fn quit(&mut self) {
        if self.status == SessionStatus::Running {
            self.status = SessionStatus::Quit;
        }
    }

    /// 切换站立辅助
    pub fn toggle_standing(&mut self) {
        self.classifier.toggle_standing();
    }

    /// 站起来
    pub fn stand_up(&mut self) {
        self.classifier.set_standing(true);
    }

    // ========================================
    // 模拟
    // ========================================

    /// 推进一帧
    pub fn frame<A, E, R>(
        &mut self,
        input: &FrameInput,
        audio: &mut A,
        effects: &mut E,
        rng: &mut R,
    ) -> SessionStatus
    where
        A: AudioSink + ?Sized,
        E: EffectSink + ?Sized,
        R: Rng + ?Sized,
    {
        if self.status != SessionStatus::Running {
            return self.status;
        }
        let frame_dt = clamp_frame_dt(input.dt);
        let music_time = input.music_time;

        if let Some(conductor) = self.conductor.as_mut() {
            conductor.advance(music_time);
            if conductor.is_finished() {
                self.status = SessionStatus::Completed;
                return self.status;
            }
        }

        self.emit_feedback_smoke(frame_dt, effects);

        if let (Some((id, tracker)), Some(ray)) = (self.dragged.as_mut(), input.pointer.as_ref()) {
            let joint = self.skeleton.joint(*id).pos;
            tracker.track(ray.project(joint), frame_dt);
        }

        let substep = self.skeleton.config().interactive_substep;
        let passes = self.skeleton.config().block_passes;
        for dt in substeps(frame_dt, substep) {
            let drag = self.dragged.map(|(id, tracker)| tracker.target(id));
            let mut detected = std::mem::take(&mut self.detected);
            detected.clear();
            self.classifier.step(&mut self.skeleton, drag.as_ref(), dt, &mut detected);
            for m in &detected {
                self.register_move(*m, music_time, audio, rng);
            }
            self.detected = detected;

            if let (Some(index), Some(ray)) = (self.thrown, input.pointer.as_ref()) {
                self.horde.throw(index, ray);
            }

            self.skeleton.clear_ground_contacts();
            for block in &self.stage.blocks {
                let hit = self.skeleton.apply_block(block, dt, effects);
                if rng.gen::<f64>() < impact_sound_chance(dt, hit) {
                    audio.play(SoundId::Impact(rng.gen_range(0..2)), 1.0);
                }
            }

            let pelvis = self.skeleton.joint(JointId::Pelvis).pos;
            let retreat = self.scorer.feedback().is_encouraging();
            if self.horde.step(pelvis, retreat, &self.stage, passes, dt, audio, rng) {
                self.status = SessionStatus::Caught;
            }

            if self.stage.is_out_of_bounds(pelvis) {
                log::debug!("[Game] 角色离开舞台，复位");
                self.skeleton.reset(self.stage.origin);
                self.classifier.reset(&self.skeleton);
            }

            self.skeleton.animate(dt, rng);
            if self.status != SessionStatus::Running {
                break;
            }
        }

        self.skeleton.calc_posture();
        self.status
    }

    /// 输出玩家网格，`debug` 时附带骨骼管
    pub fn render<S: RenderSink + ?Sized>(&self, sink: &mut S, debug: bool) {
        self.skeleton.emit_mesh(sink);
        if debug {
            self.skeleton.draw_bone_tubes(sink);
        }
    }

    fn register_move<A, R>(&mut self, m: DetectedMove, music_time: f64, audio: &mut A, rng: &mut R)
    where
        A: AudioSink + ?Sized,
        R: Rng + ?Sized,
    {
        log::debug!("[Game] 识别动作 {:?} x{}", m.kind, m.mult);
        if m.kind == MoveKind::Flip {
            audio.play(SoundId::Wooa, 1.0);
        }
        let outcome = self
            .scorer
            .score_move(m.kind, m.mult, music_time, self.conductor.as_mut());
        if let MoveOutcome::Matched(_) = outcome {
            audio.play(SoundId::NoteHit(rng.gen_range(0..2)), 1.0);
        }
    }

    fn emit_feedback_smoke<E: EffectSink + ?Sized>(&mut self, frame_dt: f64, effects: &mut E) {
        let Some((message, visible)) = self.scorer.feedback().current() else {
            return;
        };
        if let Some(color) = message.smoke_color() {
            for joint in self.skeleton.joints() {
                effects.add_smoke(
                    joint.pos,
                    color,
                    FEEDBACK_SMOKE_DURATION,
                    visible * frame_dt,
                    FEEDBACK_SMOKE_SIZE,
                );
            }
        }
        self.scorer.feedback_mut().decay(frame_dt);
    }
}
