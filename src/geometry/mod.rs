//! 几何内核
//!
//! 向量类型直接使用 glam 的 f64 版本（`DVec3` / `DVec2`），
//! 这里补充平面、射线以及退化安全的归一化。

mod plane;

pub use plane::{Plane, Ray};

pub use glam::{DVec2, DVec3};

/// 归一化阈值，长度低于此值视为零向量
pub const NORMALIZE_EPSILON: f64 = 1e-10;

/// 归一化（长度 < 1e-10 时返回零向量，不会产生 NaN）
#[inline]
pub fn normalize(v: DVec3) -> DVec3 {
    let l = v.length();
    if l < NORMALIZE_EPSILON {
        return DVec3::ZERO;
    }
    v * (1.0 / l)
}

/// 二维归一化，规则同 [`normalize`]
#[inline]
pub fn normalize2(v: DVec2) -> DVec2 {
    let l = v.length();
    if l < NORMALIZE_EPSILON {
        return DVec2::ZERO;
    }
    v * (1.0 / l)
}

/// 点在线段 `a + d * t` 上最近点的参数 t，钳制到 [0, 1]
///
/// 零长度线段返回 0。
#[inline]
pub fn segment_fraction(p: DVec3, a: DVec3, d: DVec3) -> f64 {
    let len_sq = d.length_squared();
    if len_sq < NORMALIZE_EPSILON * NORMALIZE_EPSILON {
        return 0.0;
    }
    ((p - a).dot(d) / len_sq).clamp(0.0, 1.0)
}

/// 将角度差折回 (-π, π]
#[inline]
pub fn wrap_angle(mut a: f64) -> f64 {
    use std::f64::consts::PI;
    if a > PI {
        a -= PI * 2.0;
    }
    if a < -PI {
        a += PI * 2.0;
    }
    a
}
