//! Ready-made specs for the common combat animations.
use battle_core::{Position3D, UnitId};

use super::{AnimationKind, AnimationSpec};
use crate::easing::Easing;

/// Parameter keys understood by the combat view.
pub mod param {
    pub const SPEED: &str = "speed";
    pub const SCALE: &str = "scale";
    pub const ALPHA: &str = "alpha";
    pub const ROTATION: &str = "rotation";
    pub const COLOR: &str = "color";
    pub const SHAKE_INTENSITY: &str = "shake_intensity";
    pub const PARTICLE_COUNT: &str = "particle_count";
    pub const DAMAGE_VALUE: &str = "damage_value";
    pub const FONT_SIZE: &str = "font_size";
    pub const FONT_COLOR: &str = "font_color";
    pub const FLASH_COLOR: &str = "flash_color";
}

pub fn unit_walk(unit: impl Into<UnitId>, from: Position3D, to: Position3D) -> AnimationSpec {
    AnimationSpec::new(AnimationKind::UnitMove)
        .with_unit(unit)
        .with_path(from, to)
        .with_duration(800)
        .with_easing(Easing::EaseInOut)
        .with_param(param::SPEED, 2.0)
}

pub fn unit_run(unit: impl Into<UnitId>, from: Position3D, to: Position3D) -> AnimationSpec {
    AnimationSpec::new(AnimationKind::UnitMove)
        .with_unit(unit)
        .with_path(from, to)
        .with_duration(500)
        .with_easing(Easing::EaseInOut)
        .with_param(param::SPEED, 3.0)
}

/// Lunge toward `target` with a scale pulse.
pub fn melee_attack(unit: impl Into<UnitId>, target: Position3D) -> AnimationSpec {
    AnimationSpec::new(AnimationKind::UnitAttack)
        .with_unit(unit)
        .with_target(target)
        .with_duration(600)
        .with_easing(Easing::EaseOut)
        .with_param(param::SCALE, 1.2)
        .with_param(param::SHAKE_INTENSITY, 5.0)
}

pub fn magic_cast(unit: impl Into<UnitId>) -> AnimationSpec {
    AnimationSpec::new(AnimationKind::UnitCast)
        .with_unit(unit)
        .with_duration(1200)
        .with_easing(Easing::EaseInOut)
        .with_param(param::COLOR, 0x4488ff as f32)
        .with_param(param::PARTICLE_COUNT, 20.0)
}

pub fn physical_damage(unit: impl Into<UnitId>, value: i32) -> AnimationSpec {
    AnimationSpec::new(AnimationKind::DamageNumber)
        .with_unit(unit)
        .with_duration(1000)
        .with_easing(Easing::EaseOutBounce)
        .with_param(param::DAMAGE_VALUE, value as f32)
        .with_param(param::FONT_SIZE, 24.0)
        .with_param(param::FONT_COLOR, 0xff4444 as f32)
        .with_param(param::SHAKE_INTENSITY, 3.0)
}

pub fn magical_damage(unit: impl Into<UnitId>, value: i32) -> AnimationSpec {
    AnimationSpec::new(AnimationKind::DamageNumber)
        .with_unit(unit)
        .with_duration(1200)
        .with_easing(Easing::EaseOutElastic)
        .with_param(param::DAMAGE_VALUE, value as f32)
        .with_param(param::FONT_SIZE, 26.0)
        .with_param(param::FONT_COLOR, 0x4488ff as f32)
        .with_param(param::PARTICLE_COUNT, 10.0)
}

pub fn healing(unit: impl Into<UnitId>, value: i32) -> AnimationSpec {
    AnimationSpec::new(AnimationKind::HealingNumber)
        .with_unit(unit)
        .with_duration(1500)
        .with_easing(Easing::EaseOut)
        .with_param(param::DAMAGE_VALUE, value as f32)
        .with_param(param::FONT_SIZE, 22.0)
        .with_param(param::FONT_COLOR, 0x44ff44 as f32)
        .with_param(param::PARTICLE_COUNT, 15.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_is_slower_than_run() {
        let from = Position3D::new(0, 0, 0);
        let to = Position3D::new(1, 0, 0);
        let walk = unit_walk("u1", from, to);
        let run = unit_run("u1", from, to);
        assert!(walk.duration > run.duration);
        assert_eq!(walk.source, Some(from));
        assert_eq!(run.param(param::SPEED), Some(3.0));
    }

    #[test]
    fn test_damage_number_carries_value() {
        let spec = physical_damage("u2", 17);
        assert_eq!(spec.kind, AnimationKind::DamageNumber);
        assert_eq!(spec.param(param::DAMAGE_VALUE), Some(17.0));
        assert_eq!(spec.unit_id, Some(UnitId::from("u2")));
    }
}
