//! 节拍计分
//!
//! - `Conductor`: 关卡时间轴推进、节拍跟踪、命中历史
//! - `ScoreKeeper`: 分数、动作间隔估计、反馈消息

use std::collections::VecDeque;

use glam::Vec4;

use super::level::{Level, Pattern, Section};
use super::MoveKind;

/// 命中历史保留时长（秒）
const HIT_HISTORY: f64 = 30.0;
/// 间隔估计的平滑系数
const INTERVAL_SMOOTHING: f64 = 0.2;
const EXCELLENT_TOLERANCE: f64 = 0.1;
const GOOD_TOLERANCE: f64 = 0.2;

// ============================================================================
// 时间轴
// ============================================================================

/// 命中记录（用于滚动条显示）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub kind: MoveKind,
    pub t: f64,
}

/// 关卡进度
#[derive(Clone, Debug)]
pub struct Conductor {
    level: &'static Level,
    section: usize,
    beat_t: f64,
    pattern_pos: usize,
    hits: VecDeque<Hit>,
    finished: bool,
}

impl Conductor {
    pub fn new(level: &'static Level) -> Self {
        debug_assert!(!level.sections.is_empty());
        Self {
            level,
            section: 0,
            beat_t: 0.0,
            pattern_pos: 0,
            hits: VecDeque::new(),
            finished: false,
        }
    }

    #[inline]
    pub fn level(&self) -> &'static Level {
        self.level
    }

    #[inline]
    pub fn section(&self) -> &'static Section {
        &self.level.sections[self.section]
    }

    #[inline]
    pub fn section_index(&self) -> usize {
        self.section
    }

    #[inline]
    pub fn pattern(&self) -> &'static Pattern {
        self.section().pattern
    }

    #[inline]
    pub fn pattern_pos(&self) -> usize {
        self.pattern_pos
    }

    /// 当前拍的开始时间
    #[inline]
    pub fn beat_t(&self) -> f64 {
        self.beat_t
    }

    /// 到达终止模式后为真
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn hits(&self) -> impl Iterator<Item = &Hit> {
        self.hits.iter()
    }

    /// 当前期望的动作；没有要求时为 `None`
    pub fn expected(&self) -> Option<MoveKind> {
        self.pattern().moves.get(self.pattern_pos).copied()
    }

    /// 按音乐时间推进：切换段落、跟踪节拍、清理过期命中
    ///
    /// 每次调用最多前进一段。返回是否切换了段落。
    pub fn advance(&mut self, music_time: f64) -> bool {
        let mut changed = false;
        if let Some(next) = self.level.sections.get(self.section + 1) {
            if music_time >= next.t {
                self.section += 1;
                self.beat_t = next.t;
                self.pattern_pos = 0;
                changed = true;
                log::debug!("[Game] 进入段落 {}: {}", self.section, next.pattern.description);
                if next.pattern.terminal {
                    self.finished = true;
                    log::info!("[Game] 关卡 {} 结束", self.level.name);
                }
            }
        }

        let beat = self.section().beat_length();
        while music_time >= self.beat_t + beat {
            self.beat_t += beat;
        }

        while self.hits.front().is_some_and(|h| music_time - h.t > HIT_HISTORY) {
            self.hits.pop_front();
        }
        changed
    }

    /// 记录命中并前进到模式中的下一个动作（循环）
    fn record_hit(&mut self, kind: MoveKind, t: f64) {
        self.hits.push_back(Hit { kind, t });
        self.pattern_pos += 1;
        if self.pattern_pos >= self.pattern().moves.len() {
            self.pattern_pos = 0;
        }
    }
}

// ============================================================================
// 反馈消息
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Message {
    Excellent,
    Good,
    TryAgain,
}

impl Message {
    /// 消息可见时关节周围的烟雾颜色
    pub fn smoke_color(self) -> Option<Vec4> {
        match self {
            Message::Excellent => Some(Vec4::new(0.3, 0.0, 1.0, 0.1)),
            Message::Good => Some(Vec4::new(1.0, 0.3, 0.0, 0.1)),
            Message::TryAgain => None,
        }
    }

    pub fn picture(self) -> &'static str {
        match self {
            Message::Excellent => "excellent.png",
            Message::Good => "good.png",
            Message::TryAgain => "tryagain.png",
        }
    }
}

/// 当前显示的反馈消息，可见度从 1 线性衰减
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Feedback {
    message: Option<Message>,
    visible: f64,
}

impl Feedback {
    pub fn show(&mut self, message: Message) {
        self.message = Some(message);
        self.visible = 1.0;
    }

    pub fn decay(&mut self, dt: f64) {
        if self.visible > 0.0 {
            self.visible -= dt;
        }
    }

    /// 可见的消息及其可见度
    pub fn current(&self) -> Option<(Message, f64)> {
        match self.message {
            Some(m) if self.visible > 0.0 => Some((m, self.visible)),
            _ => None,
        }
    }

    /// 僵尸是否后退（有可见的正面反馈）
    pub fn is_encouraging(&self) -> bool {
        matches!(self.current(), Some((m, _)) if m != Message::TryAgain)
    }
}

// ============================================================================
// 计分
// ============================================================================

/// 动作计分结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// 自由模式，直接加基础分
    FreePlay,
    /// 与期望动作一致；附带节奏评价
    Matched(Option<Message>),
    /// 动作不符，扣分
    Missed,
}

#[derive(Clone, Debug, Default)]
pub struct ScoreKeeper {
    score: i64,
    /// 平滑后的动作间隔
    interval: f64,
    last_move: f64,
    feedback: Feedback,
}

impl ScoreKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn score(&self) -> i64 {
        self.score
    }

    #[inline]
    pub fn interval(&self) -> f64 {
        self.interval
    }

    #[inline]
    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    #[inline]
    pub fn feedback_mut(&mut self) -> &mut Feedback {
        &mut self.feedback
    }

    /// 加减分，结果不低于 0
    pub fn add(&mut self, delta: i64) {
        self.score = (self.score + delta).max(0);
    }

    /// 为一个识别出的动作计分
    ///
    /// 有关卡时，与期望动作一致才得分：动作间隔接近一拍为 Excellent（倍数 +2），
    /// 接近两拍为 Good（倍数 +1），得分为基础分乘以倍数的平方。
    pub fn score_move(
        &mut self,
        kind: MoveKind,
        mult: u32,
        music_time: f64,
        conductor: Option<&mut Conductor>,
    ) -> MoveOutcome {
        let Some(conductor) = conductor else {
            self.add(kind.score());
            return MoveOutcome::FreePlay;
        };

        if conductor.expected() != Some(kind) {
            self.add(-kind.score());
            self.feedback.show(Message::TryAgain);
            log::debug!("[Game] 动作 {:?} 不符，期望 {:?}", kind, conductor.expected());
            return MoveOutcome::Missed;
        }

        let beat = conductor.section().beat_length();
        self.interval += (music_time - self.last_move - self.interval) * INTERVAL_SMOOTHING;
        let mut mult = i64::from(mult);
        let rating = if (self.interval - beat).abs() < EXCELLENT_TOLERANCE {
            mult += 2;
            Some(Message::Excellent)
        } else if (self.interval - beat * 2.0).abs() < GOOD_TOLERANCE {
            mult += 1;
            Some(Message::Good)
        } else {
            None
        };
        if let Some(message) = rating {
            self.feedback.show(message);
        }

        conductor.record_hit(kind, music_time);
        self.last_move = music_time;
        self.add(kind.score() * mult * mult);
        log::debug!("[Game] 命中 {:?} x{} 评价 {:?}，总分 {}", kind, mult, rating, self.score);
        MoveOutcome::Matched(rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::level::{PAT_BEGIN, PAT_END, PAT_LEFTHAND, PAT_WAVE};
    use crate::stage::StageId;
    use approx::assert_relative_eq;

    static TEST_SECTIONS: [Section; 4] = [
        Section { t: 0.0, bpm: 120.0, pattern: &PAT_BEGIN },
        Section { t: 1.0, bpm: 120.0, pattern: &PAT_LEFTHAND },
        Section { t: 20.0, bpm: 120.0, pattern: &PAT_WAVE },
        Section { t: 60.0, bpm: 120.0, pattern: &PAT_END },
    ];

    static TEST_LEVEL: Level = Level {
        name: "test",
        description: "",
        sections: &TEST_SECTIONS,
        music: "test.ogg",
        stage: StageId::Graveyard,
        zombies: 0,
    };

    #[test]
    fn test_free_play_adds_base_score() {
        let mut s = ScoreKeeper::new();
        assert_eq!(s.score_move(MoveKind::Flip, 3, 0.0, None), MoveOutcome::FreePlay);
        assert_eq!(s.score(), 100);
        assert!(s.feedback().current().is_none());
    }

    #[test]
    fn test_miss_never_goes_negative() {
        let mut s = ScoreKeeper::new();
        let mut c = Conductor::new(&TEST_LEVEL);
        // 开始段不要求任何动作
        assert_eq!(c.expected(), None);
        assert_eq!(s.score_move(MoveKind::Jump, 1, 0.5, Some(&mut c)), MoveOutcome::Missed);
        assert_eq!(s.score(), 0);
        assert_eq!(s.feedback().current(), Some((Message::TryAgain, 1.0)));
        assert!(!s.feedback().is_encouraging());
    }

    #[test]
    fn test_steady_beat_reaches_excellent() {
        let mut s = ScoreKeeper::new();
        let mut c = Conductor::new(&TEST_LEVEL);
        c.advance(1.0);
        assert_eq!(c.expected(), Some(MoveKind::LeftHand));

        let mut outcomes = Vec::new();
        for i in 1..=10 {
            let t = 1.0 + i as f64 * 0.5;
            c.advance(t);
            outcomes.push(s.score_move(MoveKind::LeftHand, 1, t, Some(&mut c)));
        }
        // 首个间隔从 0 时刻算起为 1.5，估计值 0.3；之后收敛到 0.5，第 5 次进入 ±0.1
        for outcome in &outcomes[..4] {
            assert_eq!(*outcome, MoveOutcome::Matched(None));
        }
        for outcome in &outcomes[4..] {
            assert_eq!(*outcome, MoveOutcome::Matched(Some(Message::Excellent)));
        }
        assert_eq!(s.score(), 4 * 10 + 6 * 90);
        assert_eq!(c.hits().count(), 10);
        assert!(s.feedback().is_encouraging());
    }

    #[test]
    fn test_double_beat_is_good() {
        let mut s = ScoreKeeper::new();
        let mut c = Conductor::new(&TEST_LEVEL);
        c.advance(1.0);
        let mut last = MoveOutcome::Missed;
        for i in 1..=12 {
            let t = 1.0 + i as f64;
            c.advance(t);
            last = s.score_move(MoveKind::LeftHand, 1, t, Some(&mut c));
        }
        assert_eq!(last, MoveOutcome::Matched(Some(Message::Good)));
        assert_eq!(s.feedback().current().map(|(m, _)| m), Some(Message::Good));
    }

    #[test]
    fn test_pattern_wraps() {
        let mut s = ScoreKeeper::new();
        let mut c = Conductor::new(&TEST_LEVEL);
        c.advance(1.0);
        c.advance(20.0);
        assert_eq!(c.section().pattern, &PAT_WAVE);
        assert_eq!(c.expected(), Some(MoveKind::LeftHand));
        s.score_move(MoveKind::LeftHand, 1, 20.5, Some(&mut c));
        assert_eq!(c.expected(), Some(MoveKind::RightHand));
        s.score_move(MoveKind::RightHand, 1, 21.0, Some(&mut c));
        assert_eq!(c.expected(), Some(MoveKind::LeftHand));
        assert_eq!(c.pattern_pos(), 0);
    }

    #[test]
    fn test_conductor_sections_and_beats() {
        let mut c = Conductor::new(&TEST_LEVEL);
        assert!(!c.advance(0.9));
        assert_relative_eq!(c.beat_t(), 0.5);
        assert!(c.advance(1.2));
        assert_eq!(c.section_index(), 1);
        assert_relative_eq!(c.beat_t(), 1.0);
        c.advance(2.3);
        assert_relative_eq!(c.beat_t(), 2.0);

        // 一次最多前进一段
        c.advance(100.0);
        assert_eq!(c.section_index(), 2);
        assert!(!c.is_finished());
        c.advance(100.0);
        assert!(c.is_finished());
        assert!(c.pattern().terminal);
    }

    #[test]
    fn test_old_hits_are_pruned() {
        let mut s = ScoreKeeper::new();
        let mut c = Conductor::new(&TEST_LEVEL);
        c.advance(1.0);
        s.score_move(MoveKind::LeftHand, 1, 1.5, Some(&mut c));
        s.score_move(MoveKind::LeftHand, 1, 10.0, Some(&mut c));
        c.advance(31.0);
        assert_eq!(c.hits().count(), 2);
        c.advance(31.6);
        let left: Vec<_> = c.hits().map(|h| h.t).collect();
        assert_eq!(left, vec![10.0]);
    }

    #[test]
    fn test_feedback_decays() {
        let mut f = Feedback::default();
        f.show(Message::Good);
        f.decay(0.4);
        assert_relative_eq!(f.current().unwrap().1, 0.6);
        f.decay(0.7);
        assert!(f.current().is_none());
        assert!(!f.is_encouraging());
    }
}
