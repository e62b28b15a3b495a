//! 布娃娃物理配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。
//! 骨骼在创建时拷贝一份配置，运行中修改全局配置不影响已创建的骨骼。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 物理配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsConfig {
    // ========== 全局力 ==========
    /// 重力 Y 分量（负数向下），默认 -40.0
    pub gravity_y: f64,
    /// 线性空气阻力系数（accel -= vel * k），默认 1.0
    pub air_drag: f64,

    // ========== 骨骼弹簧 ==========
    /// 弹簧刚度缩放（乘以骨骼 strength），默认 2000.0
    pub spring_scale: f64,
    /// 沿骨骼方向的阻尼，默认 10.0
    pub axial_damping: f64,
    /// 垂直骨骼方向（up / perp）的阻尼，默认 2.0
    pub lateral_damping: f64,
    /// up 轴向锁定邻居旋转的速率，默认 5.0
    pub twist_rate: f64,

    // ========== 关节-骨骼排斥 ==========
    /// 接触摩擦（拉向骨骼局部速度），默认 5.0
    pub contact_friction: f64,
    /// 排斥弹簧刚度，默认 500.0
    pub contact_stiffness: f64,

    // ========== 舞台碰撞 ==========
    /// 地面摩擦，默认 10.0
    pub ground_friction: f64,
    /// 地面反弹刚度，默认 1000.0
    pub ground_stiffness: f64,
    /// 判定着地的法线 y 分量下限，默认 0.5
    pub ground_normal_y: f64,
    /// 凸块最近点投影轮数，默认 2
    pub block_passes: usize,

    // ========== 速度限制 ==========
    /// 最大速度，默认 100.0
    pub max_velocity: f64,
    /// 速度平方低于此值时直接置零，默认 1e-6
    pub idle_velocity_sqr: f64,

    // ========== 锁定关系 ==========
    /// 参与锁定的邻居骨骼最小 strength，默认 0.5
    pub lock_strength_threshold: f64,
    /// |cos| 低于此值的相邻骨骼建立 ±1 锁定，默认 0.6
    pub lock_cosine_threshold: f64,

    // ========== 子步 ==========
    /// 交互拖拽时的子步长，默认 0.0005
    pub interactive_substep: f64,
    /// 被动模拟（菜单舞者、无头演示）的子步长，默认 0.001
    pub passive_substep: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity_y: -40.0,
            air_drag: 1.0,

            spring_scale: 2000.0,
            axial_damping: 10.0,
            lateral_damping: 2.0,
            twist_rate: 5.0,

            contact_friction: 5.0,
            contact_stiffness: 500.0,

            ground_friction: 10.0,
            ground_stiffness: 1000.0,
            ground_normal_y: 0.5,
            block_passes: 2,

            max_velocity: 100.0,
            idle_velocity_sqr: 1e-6,

            // 这两个阈值依赖人形网格的静止姿态，调整会明显改变手感
            lock_strength_threshold: 0.5,
            lock_cosine_threshold: 0.6,

            interactive_substep: 0.0005,
            passive_substep: 0.001,
        }
    }
}

/// 全局配置实例
static PHYSICS_CONFIG: Lazy<RwLock<PhysicsConfig>> = Lazy::new(|| {
    RwLock::new(PhysicsConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> PhysicsConfig {
    PHYSICS_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: PhysicsConfig) {
    *PHYSICS_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *PHYSICS_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = PhysicsConfig::default();
}
