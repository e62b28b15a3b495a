//! 布娃娃物理
//!
//! - `integrator`: 每子步的力累积与半隐式欧拉积分（`Skeleton::animate`）
//! - `collision`: 关节与舞台凸块的碰撞响应（`Skeleton::apply_block`）
//! - `config`: 可调参数

pub mod config;
mod collision;
mod integrator;

pub use collision::{impact_sound_chance, GROUND_SMOKE_COLOR};
pub use config::{get_config, reset_config, set_config, PhysicsConfig};
