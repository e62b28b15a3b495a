//! Ragdoll Engine - 布娃娃骨骼物理与舞蹈动作引擎
//!
//! 提供：
//! - 固定拓扑的人形骨骼（关节 + 弹簧骨骼）
//! - 质点/弹簧物理积分与舞台碰撞
//! - 基于骨骼局部坐标系的线性混合蒙皮
//! - 舞蹈动作识别与节拍计分
//!
//! 窗口、音频、渲染等外部协作者只通过 [`interface`] 中的 trait 接入。

pub mod game;
pub mod geometry;
pub mod interface;
pub mod mesh;
pub mod physics;
pub mod skeleton;
pub mod skinning;
pub mod stage;
pub mod zombie;

pub use game::{GameSession, MoveClassifier, MoveKind, ScoreKeeper};
pub use geometry::{Plane, Ray};
pub use mesh::Mesh;
pub use physics::PhysicsConfig;
pub use skeleton::{BoneLink, JointId, Skeleton};
pub use stage::{Block, Stage};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagdollError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mesh parse error in {path} line {line}: {message}")]
    MeshParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("material parse error in {path} line {line}: {message}")]
    MaterialParse {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, RagdollError>;
