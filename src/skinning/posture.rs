//! 姿态求解与渲染输出

use std::f64::consts::PI;

use glam::{DVec3, Vec4};

use crate::interface::{RenderSink, RenderVertex};
use crate::skeleton::Skeleton;

/// 调试骨骼管的边数
pub const TUBE_SIDES: usize = 6;
/// 第一条棱的颜色（标出 up 轴）
pub const TUBE_HIGHLIGHT_COLOR: Vec4 = Vec4::new(1.0, 1.0, 0.0, 1.0);
pub const TUBE_COLOR: Vec4 = Vec4::new(0.3, 0.0, 0.0, 1.0);

impl Skeleton {
    /// 根据当前骨骼坐标系重建所有蒙皮顶点的位置与法线
    ///
    /// 总权重为 0 的顶点保持不变。
    pub fn calc_posture(&mut self) {
        let joints = &self.joints;
        let bones = &self.bones;
        for vertex in &mut self.vertices {
            let mut pos = DVec3::ZERO;
            let mut normal = DVec3::ZERO;
            let mut sum = 0.0;
            for at in &vertex.attachments {
                let bone = &bones[at.bone];
                pos += bone.local_to_world(joints, at.x, at.u, at.v) * at.weight;
                normal += bone.local_to_world_vector(at.nx, at.nu, at.nv) * at.weight;
                sum += at.weight;
            }
            if sum > 0.0 {
                let inv = 1.0 / sum;
                vertex.pos = pos * inv;
                vertex.normal = normal * inv;
            }
        }
    }

    /// 按材质分组输出三角形
    pub fn emit_mesh<R: RenderSink + ?Sized>(&self, sink: &mut R) {
        let mut buf = Vec::new();
        for group in self.groups.values() {
            if group.faces.is_empty() {
                continue;
            }
            buf.clear();
            buf.reserve(group.faces.len() * 3);
            for face in &group.faces {
                for &vi in &face.vert {
                    debug_assert!(vi < self.vertices.len());
                    let v = &self.vertices[vi];
                    buf.push(RenderVertex {
                        position: v.pos,
                        normal: v.normal,
                    });
                }
            }
            sink.draw_triangles(&buf, group.diffuse);
        }
    }

    /// 输出调试用的六棱骨骼管
    pub fn draw_bone_tubes<R: RenderSink + ?Sized>(&self, sink: &mut R) {
        for bone in &self.bones {
            let a = self.joints[bone.a.index()].pos;
            let b = self.joints[bone.b.index()].pos;
            let offset = |i: usize| {
                let angle = i as f64 * (PI * 2.0 / TUBE_SIDES as f64);
                bone.up * (angle.cos() * bone.width) + bone.perp * (angle.sin() * bone.width)
            };
            for i in 0..TUBE_SIDES {
                let off = offset(i);
                let off2 = offset(i + 1);
                let edge = if i == 0 { TUBE_HIGHLIGHT_COLOR } else { TUBE_COLOR };
                sink.draw_line(a + off, b + off, edge);
                sink.draw_line(a + off, a + off2, TUBE_COLOR);
                sink.draw_line(b + off, b + off2, TUBE_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Face, Group, Mesh};
    use crate::physics::PhysicsConfig;
    use crate::skeleton::JointId;
    use approx::assert_relative_eq;
    use glam::DQuat;

    const ORIGIN: DVec3 = DVec3::new(0.0, 7.0, 0.0);

    fn test_mesh() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.vertices = vec![
            DVec3::new(0.3, 14.2, 0.5),   // 头部
            DVec3::new(-5.5, 10.4, 0.2),  // 左前臂
            DVec3::new(1.2, 1.0, -0.3),   // 右小腿
            DVec3::new(0.0, 40.0, 0.0),   // 远离所有骨骼
        ];
        mesh.normals = vec![DVec3::Z, DVec3::Y];
        let mut group = Group::default();
        group.faces.push(Face {
            vert: [0, 1, 2],
            norm: [Some(0), Some(1), Some(0)],
        });
        group.faces.push(Face {
            vert: [1, 2, 3],
            norm: [Some(1), Some(0), None],
        });
        mesh.groups.insert("skin".to_string(), group);
        mesh.groups.insert("empty".to_string(), Group::default());
        mesh
    }

    fn skinned() -> (Skeleton, Mesh) {
        let mesh = test_mesh();
        let s = Skeleton::from_mesh_with_config(&mesh, ORIGIN, PhysicsConfig::default());
        (s, mesh)
    }

    #[derive(Default)]
    struct Recorder {
        triangles: Vec<(usize, Vec4)>,
        lines: Vec<Vec4>,
    }

    impl RenderSink for Recorder {
        fn draw_triangles(&mut self, vertices: &[RenderVertex], color: Vec4) {
            self.triangles.push((vertices.len(), color));
        }
        fn draw_line(&mut self, _a: DVec3, _b: DVec3, color: Vec4) {
            self.lines.push(color);
        }
    }

    #[test]
    fn test_every_vertex_is_bound() {
        let (s, _) = skinned();
        assert_eq!(s.vertices().len(), 4);
        for v in s.vertices() {
            assert!(!v.attachments.is_empty());
            assert!(v.total_weight() > 0.0);
        }
        // 远处顶点只绑定最近的骨骼
        let far = &s.vertices()[3];
        assert_eq!(far.attachments.len(), 1);
        assert_eq!(far.attachments[0].weight, 1.0);
        let head = &s.bones()[far.attachments[0].bone];
        assert_eq!((head.a, head.b), (JointId::Neck, JointId::Head));
    }

    #[test]
    fn test_rest_posture_reproduces_mesh() {
        let (mut s, mesh) = skinned();
        s.calc_posture();
        for (v, p) in s.vertices().iter().zip(&mesh.vertices) {
            assert_relative_eq!(v.pos.x, p.x, epsilon = 1e-9);
            assert_relative_eq!(v.pos.y, p.y, epsilon = 1e-9);
            assert_relative_eq!(v.pos.z, p.z, epsilon = 1e-9);
        }
        assert_relative_eq!(s.vertices()[0].normal.z, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_posture_follows_rigid_motion() {
        let (mut s, mesh) = skinned();
        let rot = DQuat::from_rotation_y(0.7);
        let shift = DVec3::new(3.0, -2.0, 5.0);
        for joint in &mut s.joints {
            joint.pos = rot * joint.pos + shift;
        }
        for bone in &mut s.bones {
            bone.dir = rot * bone.dir;
            bone.up = rot * bone.up;
            bone.perp = rot * bone.perp;
        }
        s.calc_posture();
        for (v, p) in s.vertices().iter().zip(&mesh.vertices) {
            let expected = rot * *p + shift;
            assert_relative_eq!(v.pos.x, expected.x, epsilon = 1e-9);
            assert_relative_eq!(v.pos.y, expected.y, epsilon = 1e-9);
            assert_relative_eq!(v.pos.z, expected.z, epsilon = 1e-9);
        }
        let n = s.vertices()[0].normal;
        let expected = rot * DVec3::Z;
        assert_relative_eq!(n.x, expected.x, epsilon = 1e-9);
        assert_relative_eq!(n.z, expected.z, epsilon = 1e-9);
    }

    #[test]
    fn test_unbound_vertex_untouched() {
        let (mut s, _) = skinned();
        s.vertices[3].attachments.clear();
        s.vertices[3].pos = DVec3::new(9.0, 9.0, 9.0);
        s.joint_mut(JointId::Head).pos += DVec3::X;
        s.calc_posture();
        assert_eq!(s.vertices()[3].pos, DVec3::new(9.0, 9.0, 9.0));
    }

    #[test]
    fn test_emit_mesh_skips_empty_groups() {
        let (mut s, _) = skinned();
        s.calc_posture();
        let mut rec = Recorder::default();
        s.emit_mesh(&mut rec);
        assert_eq!(rec.triangles, vec![(6, Vec4::ONE)]);
    }

    #[test]
    fn test_bone_tubes() {
        let (s, _) = skinned();
        let mut rec = Recorder::default();
        s.draw_bone_tubes(&mut rec);
        assert_eq!(rec.lines.len(), s.bones().len() * TUBE_SIDES * 3);
        assert_eq!(rec.lines[0], TUBE_HIGHLIGHT_COLOR);
        assert_eq!(rec.lines[1], TUBE_COLOR);
        assert_eq!(rec.lines[3], TUBE_COLOR);
    }
}
