//! 舞蹈动作

use crate::skeleton::JointId;

/// 可识别的舞蹈动作
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveKind {
    LeftHand,
    RightHand,
    LeftFoot,
    RightFoot,
    Head,
    Jump,
    TurnLeft,
    TurnRight,
    Flip,
}

impl MoveKind {
    pub const ALL: [MoveKind; 9] = [
        MoveKind::LeftHand,
        MoveKind::RightHand,
        MoveKind::LeftFoot,
        MoveKind::RightFoot,
        MoveKind::Head,
        MoveKind::Jump,
        MoveKind::TurnLeft,
        MoveKind::TurnRight,
        MoveKind::Flip,
    ];

    /// 基础分
    pub fn score(self) -> i64 {
        match self {
            MoveKind::LeftHand | MoveKind::RightHand => 10,
            MoveKind::LeftFoot | MoveKind::RightFoot | MoveKind::Head => 20,
            MoveKind::Jump | MoveKind::TurnLeft | MoveKind::TurnRight => 50,
            MoveKind::Flip => 100,
        }
    }

    /// 图标资源名
    pub fn picture(self) -> &'static str {
        match self {
            MoveKind::LeftHand => "lefthand.png",
            MoveKind::RightHand => "righthand.png",
            MoveKind::LeftFoot => "leftfoot.png",
            MoveKind::RightFoot => "rightfoot.png",
            MoveKind::Head => "head.png",
            MoveKind::Jump => "jump.png",
            MoveKind::TurnLeft => "turnleft.png",
            MoveKind::TurnRight => "turnright.png",
            MoveKind::Flip => "flip.png",
        }
    }

    /// 快速拖动某个关节对应的动作
    ///
    /// 躯干关节没有对应动作，返回 `None`。
    pub fn for_dragged_joint(joint: JointId) -> Option<MoveKind> {
        match joint {
            JointId::LeftHand | JointId::LeftElbow => Some(MoveKind::LeftHand),
            JointId::RightHand | JointId::RightElbow => Some(MoveKind::RightHand),
            JointId::LeftFoot | JointId::LeftKnee => Some(MoveKind::LeftFoot),
            JointId::RightFoot | JointId::RightKnee => Some(MoveKind::RightFoot),
            JointId::Neck | JointId::Head => Some(MoveKind::Head),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores() {
        let total: i64 = MoveKind::ALL.iter().map(|m| m.score()).sum();
        assert_eq!(total, 10 + 10 + 20 + 20 + 20 + 50 + 50 + 50 + 100);
    }

    #[test]
    fn test_dragged_joint_mapping() {
        assert_eq!(MoveKind::for_dragged_joint(JointId::LeftElbow), Some(MoveKind::LeftHand));
        assert_eq!(MoveKind::for_dragged_joint(JointId::RightKnee), Some(MoveKind::RightFoot));
        assert_eq!(MoveKind::for_dragged_joint(JointId::Neck), Some(MoveKind::Head));
        assert_eq!(MoveKind::for_dragged_joint(JointId::Pelvis), None);
        assert_eq!(MoveKind::for_dragged_joint(JointId::LeftShoulder), None);
    }
}
