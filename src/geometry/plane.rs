//! 平面与射线

use glam::DVec3;

/// 半空间 `dot(p, normal) <= distance`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// 单位法线（指向外侧）
    pub normal: DVec3,
    /// 沿法线到原点的距离
    pub distance: f64,
}

impl Plane {
    pub const fn new(normal: DVec3, distance: f64) -> Self {
        Self { normal, distance }
    }

    /// 有符号距离，正数表示在半空间外
    #[inline]
    pub fn signed_distance(&self, p: DVec3) -> f64 {
        p.dot(self.normal) - self.distance
    }

    #[inline]
    pub fn contains(&self, p: DVec3) -> bool {
        self.signed_distance(p) <= 0.0
    }
}

/// 指针射线：`origin + dir * t`
///
/// `dir` 不要求归一化（通常是近裁剪面到远裁剪面的差）。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub dir: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, dir: DVec3) -> Self {
        Self { origin, dir }
    }

    /// 从近点和远点构造
    pub fn through(near: DVec3, far: DVec3) -> Self {
        Self::new(near, far - near)
    }

    /// 点在射线所在直线上的投影参数（不钳制）
    #[inline]
    pub fn param_of(&self, p: DVec3) -> f64 {
        let len_sq = self.dir.length_squared();
        if len_sq <= 0.0 {
            return 0.0;
        }
        (p - self.origin).dot(self.dir) / len_sq
    }

    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.dir * t
    }

    /// 直线上离 p 最近的点
    #[inline]
    pub fn project(&self, p: DVec3) -> DVec3 {
        self.at(self.param_of(p))
    }

    /// 射线（t >= 0）上离 p 最近的点
    #[inline]
    pub fn project_forward(&self, p: DVec3) -> DVec3 {
        self.at(self.param_of(p).max(0.0))
    }
}
