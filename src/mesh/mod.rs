//! 三角网格数据
//!
//! 只保留骨骼绑定需要的部分：顶点、法线、按材质分组的三角形。

mod obj_loader;

pub use obj_loader::{load_materials, parse_materials};

use std::collections::BTreeMap;

use glam::{DVec3, Vec4};

/// 三角形：顶点索引 + 法线索引（均为 0 基）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Face {
    pub vert: [usize; 3],
    pub norm: [Option<usize>; 3],
}

/// 材质分组
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    /// 漫反射颜色 (RGBA)
    pub diffuse: Vec4,
    pub faces: Vec<Face>,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            diffuse: Vec4::ONE,
            faces: Vec::new(),
        }
    }
}

/// 材质名 → 分组（有序，保证遍历顺序确定）
pub type GroupMap = BTreeMap<String, Group>;

/// 未指定材质时三角形归入的分组名
pub const DEFAULT_GROUP: &str = "default";

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    /// 已缩放并平移后的顶点位置
    pub vertices: Vec<DVec3>,
    pub normals: Vec<DVec3>,
    pub groups: GroupMap,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn face_count(&self) -> usize {
        self.groups.values().map(|g| g.faces.len()).sum()
    }

    /// 按顶点收集法线（面引用的最后一个法线生效）
    ///
    /// 没有被任何带法线的面引用的顶点得到零向量。
    pub fn vertex_normals(&self) -> Vec<DVec3> {
        let mut normals = vec![DVec3::ZERO; self.vertices.len()];
        for group in self.groups.values() {
            for face in &group.faces {
                for i in 0..3 {
                    if let Some(n) = face.norm[i] {
                        normals[face.vert[i]] = self.normals[n];
                    }
                }
            }
        }
        normals
    }
}
