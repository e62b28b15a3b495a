//! 内置舞台：墓地与锯木厂

use glam::DVec3;

use crate::geometry::Plane;

use super::{Block, Stage};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageId {
    Graveyard,
    Saha,
}

impl StageId {
    pub fn build(self) -> Stage {
        match self {
            StageId::Graveyard => graveyard(),
            StageId::Saha => saha(),
        }
    }
}

/// 五面体块：顶面 + 左右 + 前后
fn slab(top: (DVec3, f64), left: f64, right: f64, back: f64, front: f64) -> Block {
    Block::new(vec![
        Plane::new(top.0, top.1),
        Plane::new(DVec3::NEG_X, left),
        Plane::new(DVec3::X, right),
        Plane::new(DVec3::NEG_Z, back),
        Plane::new(DVec3::Z, front),
    ])
}

/// 墓地：地板、棺材、两块墓碑
pub fn graveyard() -> Stage {
    Stage {
        model: "graveyard.obj".to_string(),
        scale: 7.0,
        origin: DVec3::new(13.0, 17.0, 30.0),
        size: 80.0,
        blocks: vec![
            Block::new(vec![Plane::new(DVec3::Y, 2.5)]),
            // 棺材
            slab((DVec3::Y, 10.5), -5.0, 20.0, -11.0, 48.0),
            // 墓碑
            slab((DVec3::Y, 19.0), -7.0, 19.0, -2.0, 8.0),
            slab((DVec3::Y, 11.0), 25.0, -13.0, -2.0, 8.0),
        ],
    }
}

/// 锯木厂：地板、锯台、两块倾斜屋顶
pub fn saha() -> Stage {
    Stage {
        model: "sahastage.obj".to_string(),
        scale: 50.0,
        origin: DVec3::new(0.0, 11.0, 0.0),
        size: 100.0,
        blocks: vec![
            Block::new(vec![Plane::new(DVec3::Y, 0.0)]),
            // 锯台
            slab((DVec3::Y, 4.5), 6.0, 28.0, 4.0, 4.0),
            // 屋顶
            slab((DVec3::new(0.199, 0.98, 0.0), 16.0), 63.0, -30.0, 18.0, 38.0),
            slab((DVec3::new(0.0, 0.98, 0.199), 18.0), 20.0, 35.0, 50.0, -20.0),
        ],
    }
}
