//! 顶点-骨骼绑定

use glam::DVec3;

use crate::geometry::segment_fraction;
use crate::mesh::Mesh;
use crate::skeleton::{BoneLink, Joint};

use super::{Attachment, SkinVertex};

/// 把网格顶点绑定到骨骼
///
/// 对每根有宽度的骨骼计算顶点到骨骼线段的距离，距离小于宽度时
/// 以权重 `1.5 - dist / width` 绑定；一根都没绑上时绑定到最近的骨骼，权重 1。
pub fn bind_vertices(joints: &[Joint], bones: &[BoneLink], mesh: &Mesh) -> Vec<SkinVertex> {
    let normals = mesh.vertex_normals();
    let mut unattached = 0usize;

    let vertices: Vec<SkinVertex> = mesh
        .vertices
        .iter()
        .zip(&normals)
        .map(|(&p, &n)| {
            let vertex = bind_vertex(joints, bones, p, n);
            if vertex.attachments.is_empty() {
                unattached += 1;
            }
            vertex
        })
        .collect();

    if unattached > 0 {
        log::warn!("[Skeleton] {} 个顶点没有可绑定的骨骼", unattached);
    }
    vertices
}

fn bind_vertex(joints: &[Joint], bones: &[BoneLink], p: DVec3, n: DVec3) -> SkinVertex {
    let mut attachments = Vec::new();
    let mut nearest: Option<usize> = None;
    let mut nearest_d = f64::INFINITY;

    for (i, bone) in bones.iter().enumerate() {
        if bone.width <= 0.0 {
            continue;
        }
        let a = joints[bone.a.index()].pos;
        let x = segment_fraction(p, a, bone.dir);
        let dist = (p - bone.point_at(joints, x)).length();
        if dist < bone.width {
            attachments.push(attach(joints, bone, i, 1.5 - dist / bone.width, p, n));
        } else if dist < nearest_d {
            nearest_d = dist;
            nearest = Some(i);
        }
    }

    if attachments.is_empty() {
        if let Some(i) = nearest {
            attachments.push(attach(joints, &bones[i], i, 1.0, p, n));
        }
    }

    SkinVertex {
        attachments,
        pos: p,
        normal: n,
    }
}

fn attach(joints: &[Joint], bone: &BoneLink, index: usize, weight: f64, p: DVec3, n: DVec3) -> Attachment {
    let local = bone.world_to_local(joints, p);
    let normal = bone.world_to_local_vector(n);
    Attachment {
        bone: index,
        weight,
        x: local.x,
        u: local.y,
        v: local.z,
        nx: normal.x,
        nu: normal.y,
        nv: normal.z,
    }
}
