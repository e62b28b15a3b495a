//! 游戏层：动作识别、关卡时间轴、计分、僵尸与一局的驱动
//!
//! - `MoveClassifier` 从骨骼运动中识别动作
//! - `Conductor` 跟踪关卡段落与节拍，`ScoreKeeper` 为动作计分
//! - `GameSession` 把上述部分与舞台、僵尸组合成每帧一次的 `frame`
//! - `MenuDancer` 是菜单背景中的无交互舞者

mod classifier;
pub mod level;
mod menu;
mod moves;
mod scoring;
mod session;

pub use classifier::{ClassifierFlags, DetectedMove, DragTarget, MoveClassifier, MoveThresholds};
pub use level::{Level, Pattern, Section, LEVELS};
pub use menu::MenuDancer;
pub use moves::MoveKind;
pub use scoring::{Conductor, Feedback, Hit, Message, MoveOutcome, ScoreKeeper};
pub use session::{FrameInput, GameSession, PointerTracker, Selection, SessionStatus};
