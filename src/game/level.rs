//! 节拍模式与关卡时间轴

use glam::Vec4;

use crate::stage::StageId;

use super::MoveKind;

/// 一段循环的动作序列
#[derive(Debug, PartialEq)]
pub struct Pattern {
    pub color: Vec4,
    pub description: &'static str,
    /// 期望的动作序列，空表示本段不要求动作
    pub moves: &'static [MoveKind],
    /// 到达此模式时关卡结束
    pub terminal: bool,
}

impl Pattern {
    const fn new(color: Vec4, description: &'static str, moves: &'static [MoveKind]) -> Self {
        Self {
            color,
            description,
            moves,
            terminal: false,
        }
    }
}

pub static PAT_BEGIN: Pattern = Pattern::new(Vec4::new(0.5, 0.5, 0.5, 1.0), "Get ready...", &[]);

pub static PAT_LEFTHAND: Pattern = Pattern::new(
    Vec4::new(1.0, 0.3, 0.0, 1.0),
    "Get right hand moving",
    &[MoveKind::LeftHand],
);

pub static PAT_ROTATE: Pattern = Pattern::new(
    Vec4::new(0.3, 1.0, 0.0, 1.0),
    "Rotate around!",
    &[MoveKind::TurnLeft],
);

pub static PAT_WAVE: Pattern = Pattern::new(
    Vec4::new(0.1, 0.4, 1.0, 1.0),
    "Wave your hands!",
    &[MoveKind::LeftHand, MoveKind::RightHand],
);

pub static PAT_FEET: Pattern = Pattern::new(
    Vec4::new(1.0, 0.8, 0.0, 1.0),
    "Get those feet moving!",
    &[MoveKind::LeftFoot, MoveKind::RightFoot],
);

pub static PAT_TWIST: Pattern = Pattern::new(
    Vec4::new(0.0, 1.0, 0.8, 1.0),
    "Twist left and right",
    &[MoveKind::TurnLeft, MoveKind::TurnRight],
);

pub static PAT_FLIP: Pattern = Pattern::new(
    Vec4::new(1.0, 0.0, 0.8, 1.0),
    "Do 360 flips over your head!",
    &[MoveKind::Flip],
);

pub static PAT_HEAD: Pattern = Pattern::new(
    Vec4::new(1.0, 1.0, 0.8, 1.0),
    "Jump around",
    &[MoveKind::Head, MoveKind::Jump],
);

pub static PAT_END: Pattern = Pattern {
    color: Vec4::new(0.0, 0.0, 0.0, 1.0),
    description: "END",
    moves: &[],
    terminal: true,
};

/// 时间轴上的一段
#[derive(Debug)]
pub struct Section {
    /// 开始时间（音乐时间，秒）
    pub t: f64,
    pub bpm: f64,
    pub pattern: &'static Pattern,
}

impl Section {
    /// 一拍的时长
    #[inline]
    pub fn beat_length(&self) -> f64 {
        60.0 / self.bpm
    }
}

const fn section(t: f64, bpm: f64, pattern: &'static Pattern) -> Section {
    Section { t, bpm, pattern }
}

/// 关卡
#[derive(Debug)]
pub struct Level {
    pub name: &'static str,
    pub description: &'static str,
    /// 以终止模式结尾的时间轴
    pub sections: &'static [Section],
    pub music: &'static str,
    pub stage: StageId,
    pub zombies: usize,
}

static BOLTBOT: [Section; 7] = [
    section(0.0, 125.0, &PAT_BEGIN),
    section(8.0, 125.0, &PAT_LEFTHAND),
    section(30.0, 125.0, &PAT_ROTATE),
    section(45.0, 125.0, &PAT_WAVE),
    section(60.0, 125.0, &PAT_LEFTHAND),
    section(76.0, 125.0, &PAT_HEAD),
    section(100.0, 125.0, &PAT_END),
];

static POLLUTE: [Section; 10] = [
    section(0.0, 125.0, &PAT_BEGIN),
    section(15.0, 125.0, &PAT_WAVE),
    section(32.0, 125.0, &PAT_FEET),
    section(46.0, 125.0, &PAT_LEFTHAND),
    section(61.0, 125.0, &PAT_ROTATE),
    section(91.0, 125.0, &PAT_WAVE),
    section(125.0, 125.0, &PAT_FEET),
    section(153.0, 125.0, &PAT_ROTATE),
    section(184.0, 125.0, &PAT_HEAD),
    section(210.0, 125.0, &PAT_END),
];

static SORVIPOP: [Section; 12] = [
    section(0.0, 140.0, &PAT_BEGIN),
    section(14.0, 70.0, &PAT_ROTATE),
    section(27.0, 140.0, &PAT_TWIST),
    section(41.0, 140.0, &PAT_WAVE),
    section(68.0, 140.0, &PAT_FLIP),
    section(82.0, 140.0, &PAT_HEAD),
    section(96.0, 140.0, &PAT_WAVE),
    section(109.0, 140.0, &PAT_FEET),
    section(123.0, 140.0, &PAT_TWIST),
    section(137.0, 140.0, &PAT_WAVE),
    section(165.0, 140.0, &PAT_FEET),
    section(170.0, 140.0, &PAT_END),
];

static LUXSABERPOP: [Section; 12] = [
    section(0.0, 140.0, &PAT_BEGIN),
    section(14.0, 70.0, &PAT_ROTATE),
    section(27.0, 140.0, &PAT_LEFTHAND),
    section(41.0, 140.0, &PAT_WAVE),
    section(68.0, 140.0, &PAT_TWIST),
    section(89.0, 140.0, &PAT_FLIP),
    section(96.0, 140.0, &PAT_WAVE),
    section(109.0, 140.0, &PAT_FEET),
    section(123.0, 140.0, &PAT_FLIP),
    section(137.0, 140.0, &PAT_TWIST),
    section(165.0, 140.0, &PAT_ROTATE),
    section(170.0, 140.0, &PAT_END),
];

/// 按顺序解锁的四个关卡
pub static LEVELS: [Level; 4] = [
    Level {
        name: "1/4: Graveyard",
        description: "You lost your job due to recent layoffs.\n\
                      To blow off the steam, you are dancing on the grave of your old boss.",
        sections: &BOLTBOT,
        music: "boltbot.ogg",
        stage: StageId::Graveyard,
        zombies: 0,
    },
    Level {
        name: "2/4: Ex work place",
        description: "That wasn't enough! It's time to visit the old\nwork place.",
        sections: &POLLUTE,
        music: "pollute.ogg",
        stage: StageId::Saha,
        zombies: 1,
    },
    Level {
        name: "3/4: Back to graveyard",
        description: "140 beats per minute means more adrenaline",
        sections: &SORVIPOP,
        music: "sorvipop.ogg",
        stage: StageId::Graveyard,
        zombies: 2,
    },
    Level {
        name: "4/4: Final showdown",
        description: "Difficulty++",
        sections: &LUXSABERPOP,
        music: "luxsaberpop.ogg",
        stage: StageId::Saha,
        zombies: 2,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_end_with_terminal_pattern() {
        for level in &LEVELS {
            let last = level.sections.last().unwrap();
            assert!(last.pattern.terminal, "{}", level.name);
            assert!(level.sections[..level.sections.len() - 1]
                .iter()
                .all(|s| !s.pattern.terminal));
            assert_eq!(level.sections[0].t, 0.0);
            assert!(level.sections.windows(2).all(|w| w[0].t < w[1].t));
        }
    }

    #[test]
    fn test_level_metadata() {
        assert_eq!(LEVELS[0].zombies, 0);
        assert_eq!(LEVELS[1].stage, StageId::Saha);
        assert_eq!(LEVELS[3].zombies, 2);
        assert!(LEVELS[0].description.starts_with("You lost your job"));
        assert!(LEVELS[0].description.contains("\nTo blow off"));
        assert_eq!(SORVIPOP[1].beat_length(), 60.0 / 70.0);
    }
}
