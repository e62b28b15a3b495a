//! 骨骼集合 - 管理关节数组、骨骼表与蒙皮数据
//!
//! 关节数组定长（`[Joint; JOINT_COUNT]`），骨骼表在加载后不再增删，
//! 因此骨骼中保存的关节索引与锁定关系中的骨骼下标始终有效。

use std::path::Path;

use glam::DVec3;

use crate::geometry::Ray;
use crate::mesh::{GroupMap, Mesh};
use crate::physics::{get_config, PhysicsConfig};
use crate::skinning::{self, SkinVertex};
use crate::Result;

use super::bone_link::{BoneLink, BoneLock, LockDirection};
use super::definitions::BONE_DEFS;
use super::{Joint, JointId, JOINT_COUNT};

/// 指针拾取关节的最大距离（扣除关节半径后）
const PICK_DISTANCE: f64 = 1.0;

/// 布娃娃骨骼
#[derive(Clone, Debug)]
pub struct Skeleton {
    pub(crate) joints: [Joint; JOINT_COUNT],
    pub(crate) bones: Vec<BoneLink>,
    pub(crate) vertices: Vec<SkinVertex>,
    pub(crate) groups: GroupMap,
    pub(crate) config: PhysicsConfig,
}

impl Skeleton {
    // ========================================
    // 构建
    // ========================================

    /// 从网格文件加载（使用当前全局物理配置）
    pub fn load<P: AsRef<Path>>(path: P, origin: DVec3) -> Result<Self> {
        Self::load_with_config(path, origin, get_config())
    }

    /// 从网格文件加载，显式指定物理配置
    ///
    /// 网格按 `origin` 平移后与关节静止姿态对齐。加载失败时不产生任何骨骼。
    pub fn load_with_config<P: AsRef<Path>>(
        path: P,
        origin: DVec3,
        config: PhysicsConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("[Skeleton] 加载骨骼网格 {}", path.display());
        let mesh = Mesh::load(path, 1.0, origin)?;
        Ok(Self::from_mesh_with_config(&mesh, origin, config))
    }

    /// 从已加载的网格构建（网格应已处于世界空间）
    pub fn from_mesh(mesh: &Mesh, origin: DVec3) -> Self {
        Self::from_mesh_with_config(mesh, origin, get_config())
    }

    pub fn from_mesh_with_config(mesh: &Mesh, origin: DVec3, config: PhysicsConfig) -> Self {
        let mut skeleton = Self::without_skin(origin, config);
        skeleton.vertices = skinning::bind_vertices(&skeleton.joints, &skeleton.bones, mesh);
        skeleton.groups = mesh.groups.clone();
        log::info!(
            "[Skeleton] 构建完成: {} 关节, {} 骨骼, {} 蒙皮顶点, {} 材质",
            JOINT_COUNT,
            skeleton.bones.len(),
            skeleton.vertices.len(),
            skeleton.groups.len()
        );
        skeleton
    }

    /// 只有关节与骨骼、没有蒙皮的骨骼（用于被动模拟和测试）
    pub fn without_skin(origin: DVec3, config: PhysicsConfig) -> Self {
        let mut joints = [Joint::at(DVec3::ZERO); JOINT_COUNT];
        for id in JointId::ALL {
            joints[id.index()] = Joint::at(id.rest_offset() + origin);
        }

        let mut bones = Vec::with_capacity(BONE_DEFS.len());
        for def in &BONE_DEFS {
            let bone = BoneLink::from_def(def, &joints);
            let (a, b) = (def.a.index(), def.b.index());
            joints[a].width = joints[a].width.max(bone.width);
            joints[b].width = joints[b].width.max(bone.width);
            bones.push(bone);
        }

        build_locks(&mut bones, &config);

        Self {
            joints,
            bones,
            vertices: Vec::new(),
            groups: GroupMap::new(),
            config,
        }
    }

    /// 恢复静止姿态：位置复位、速度与加速度清零、重建骨骼坐标系
    ///
    /// 不重新分配任何存储，可反复调用。
    pub fn reset(&mut self, origin: DVec3) {
        for id in JointId::ALL {
            let joint = &mut self.joints[id.index()];
            joint.pos = id.rest_offset() + origin;
            joint.vel = DVec3::ZERO;
            joint.accel = DVec3::ZERO;
            joint.on_ground = false;
        }
        for bone in &mut self.bones {
            bone.reset_frame(&self.joints);
        }
    }

    // ========================================
    // 访问器
    // ========================================

    #[inline]
    pub fn joint(&self, id: JointId) -> &Joint {
        &self.joints[id.index()]
    }

    #[inline]
    pub fn joint_mut(&mut self, id: JointId) -> &mut Joint {
        &mut self.joints[id.index()]
    }

    #[inline]
    pub fn joints(&self) -> &[Joint; JOINT_COUNT] {
        &self.joints
    }

    #[inline]
    pub fn bones(&self) -> &[BoneLink] {
        &self.bones
    }

    #[inline]
    pub fn vertices(&self) -> &[SkinVertex] {
        &self.vertices
    }

    #[inline]
    pub fn groups(&self) -> &GroupMap {
        &self.groups
    }

    #[inline]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// 给关节施加加速度（累加到本子步）
    #[inline]
    pub fn push(&mut self, id: JointId, accel: DVec3) {
        self.joints[id.index()].accel += accel;
    }

    /// 总动能（单位质量）
    pub fn kinetic_energy(&self) -> f64 {
        self.joints.iter().map(|j| 0.5 * j.vel.length_squared()).sum()
    }

    /// 本子步着地关节中的最高 y（只看下半身），没有时返回 `None`
    pub fn floor_height(&self) -> Option<f64> {
        JointId::ALL
            .iter()
            .filter(|id| id.is_lower_body())
            .map(|id| &self.joints[id.index()])
            .filter(|j| j.on_ground)
            .map(|j| j.pos.y)
            .reduce(f64::max)
    }

    /// 用指针射线拾取关节
    ///
    /// 返回离射线最近（扣除关节半径）且距离小于 1 的碰撞关节，
    /// 以及射线上的抓取点。
    pub fn pick_joint(&self, ray: &Ray) -> Option<(JointId, DVec3)> {
        let mut nearest_d = PICK_DISTANCE;
        let mut nearest = None;
        for id in JointId::ALL {
            let joint = &self.joints[id.index()];
            if !joint.collides() {
                continue;
            }
            let grab = ray.project_forward(joint.pos);
            let dist = (joint.pos - grab).length() - joint.width;
            if dist < nearest_d {
                nearest_d = dist;
                nearest = Some((id, grab));
            }
        }
        nearest
    }
}

/// 建立骨骼间的锁定关系
///
/// 对每根骨骼，检查共享端点且 strength 达到阈值的其他骨骼：
/// 静止方向夹角足够大（|cos| < 阈值）时按叉积手性记录 ±1 锁定，
/// 否则记住 |cos| 最小者；没有任何 ±1 锁定时以 Absolute 方式跟随它。
fn build_locks(bones: &mut [BoneLink], config: &PhysicsConfig) {
    for i in 0..bones.len() {
        let mut locks = Vec::new();
        let mut nearest: Option<usize> = None;
        let mut nearest_d = f64::INFINITY;

        let bone = &bones[i];
        for (j, other) in bones.iter().enumerate() {
            if i == j || other.strength < config.lock_strength_threshold {
                continue;
            }
            if !bone.shares_joint(other) {
                continue;
            }
            let d = bone.dir.dot(other.dir).abs() / (bone.rest_length * other.rest_length);
            if d < config.lock_cosine_threshold {
                let v = bone.dir.cross(other.dir);
                let direction = if v.dot(bone.up) > 0.0 {
                    LockDirection::Positive
                } else {
                    LockDirection::Negative
                };
                locks.push(BoneLock { other: j, direction });
            } else if d < nearest_d {
                nearest_d = d;
                nearest = Some(j);
            }
        }

        if locks.is_empty() {
            if let Some(other) = nearest {
                locks.push(BoneLock {
                    other,
                    direction: LockDirection::Absolute,
                });
            }
        }
        bones[i].locks = locks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeleton() -> Skeleton {
        Skeleton::without_skin(DVec3::new(0.0, 7.0, 0.0), PhysicsConfig::default())
    }

    fn bone_index(s: &Skeleton, a: JointId, b: JointId) -> usize {
        s.bones()
            .iter()
            .position(|bone| bone.a == a && bone.b == b)
            .unwrap()
    }

    #[test]
    fn test_joint_widths() {
        let s = skeleton();
        // 颈-头骨骼宽度为 1
        assert_eq!(s.joint(JointId::Head).width, 1.0);
        assert_eq!(s.joint(JointId::LeftHand).width, 0.3);
        assert_eq!(s.joint(JointId::Pelvis).width, 0.4);
        assert!(s.joints().iter().all(|j| j.collides()));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let origin = DVec3::new(1.0, 2.0, 3.0);
        let mut s = skeleton();
        s.reset(origin);
        let first = s.joints;
        let frames: Vec<_> = s.bones.iter().map(|b| (b.dir, b.up, b.perp)).collect();

        s.joint_mut(JointId::LeftHand).vel = DVec3::new(5.0, 0.0, 0.0);
        s.joint_mut(JointId::Head).pos += DVec3::Y;
        s.bones[3].up = DVec3::X;
        s.reset(origin);

        assert_eq!(s.joints, first);
        for (bone, frame) in s.bones.iter().zip(frames) {
            assert_eq!((bone.dir, bone.up, bone.perp), frame);
        }
        assert!(s.joints.iter().all(|j| j.vel == DVec3::ZERO && j.accel == DVec3::ZERO));
    }

    #[test]
    fn test_locks_only_reference_strong_neighbours() {
        let s = skeleton();
        for (i, bone) in s.bones().iter().enumerate() {
            for lock in &bone.locks {
                assert_ne!(lock.other, i);
                let other = &s.bones()[lock.other];
                assert!(other.strength >= 0.5);
                assert!(bone.shares_joint(other));
            }
        }
    }

    #[test]
    fn test_head_bone_tracks_neck_absolutely() {
        let s = skeleton();
        let head = bone_index(&s, JointId::Neck, JointId::Head);
        let neck = bone_index(&s, JointId::Back, JointId::Neck);
        assert_eq!(
            s.bones()[head].locks,
            vec![BoneLock { other: neck, direction: LockDirection::Absolute }]
        );
    }

    #[test]
    fn test_forearm_locks_with_sign() {
        let s = skeleton();
        let forearm = bone_index(&s, JointId::LeftHand, JointId::LeftElbow);
        let locks = &s.bones()[forearm].locks;
        // 前臂与上臂几乎共线，只能跟随上臂
        assert_eq!(locks.len(), 1);
        let upper = bone_index(&s, JointId::LeftElbow, JointId::LeftShoulder);
        assert_eq!(locks[0].other, upper);
        assert_eq!(locks[0].direction, LockDirection::Absolute);

        // 肩-背骨骼与多根骨骼成角，应有 ±1 锁定
        let shoulder = bone_index(&s, JointId::LeftShoulder, JointId::Back);
        let locks = &s.bones()[shoulder].locks;
        assert!(!locks.is_empty());
        assert!(locks.iter().all(|l| l.direction != LockDirection::Absolute));
    }

    #[test]
    fn test_lock_graph_is_deterministic() {
        let a = skeleton();
        let b = Skeleton::without_skin(DVec3::new(-40.0, 3.0, 12.0), PhysicsConfig::default());
        for (x, y) in a.bones().iter().zip(b.bones()) {
            assert_eq!(x.locks, y.locks);
        }
    }

    #[test]
    fn test_pick_joint() {
        let s = skeleton();
        let head = s.joint(JointId::Head).pos;
        let ray = Ray::through(head + DVec3::new(0.0, 0.0, 20.0), head - DVec3::new(0.0, 0.0, 20.0));
        let (id, grab) = s.pick_joint(&ray).unwrap();
        assert_eq!(id, JointId::Head);
        assert!((grab - head).length() < 1e-9);

        let miss = Ray::through(DVec3::new(100.0, 0.0, 20.0), DVec3::new(100.0, 0.0, -20.0));
        assert!(s.pick_joint(&miss).is_none());
    }

    #[test]
    fn test_floor_height() {
        let mut s = skeleton();
        assert_eq!(s.floor_height(), None);
        s.joint_mut(JointId::LeftFoot).on_ground = true;
        s.joint_mut(JointId::RightKnee).on_ground = true;
        // 上半身不计入
        s.joint_mut(JointId::LeftHand).on_ground = true;
        assert_eq!(s.floor_height(), Some(s.joint(JointId::RightKnee).pos.y));
    }
}
