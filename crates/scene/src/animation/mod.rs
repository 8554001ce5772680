//! Timed visual transitions and the scheduler that plays them.
//!
//! An [`AnimationSpec`] describes what to play; the [`AnimationScheduler`]
//! decides when. Progress is reported back as [`AnimationFrame`]s on every
//! tick so the caller can drive sprite properties itself.
mod presets;
mod scheduler;

use std::collections::BTreeMap;
use std::fmt;

use battle_core::{Position3D, UnitId};
use serde::{Deserialize, Serialize};

use crate::easing::Easing;

pub use presets::{
    healing, magic_cast, magical_damage, melee_attack, param, physical_damage, unit_run, unit_walk,
};
pub use scheduler::{
    AnimationCompleted, AnimationFrame, AnimationScheduler, ChainCompleted, QueueStatus,
};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AnimationKind {
    UnitMove,
    UnitAttack,
    UnitCast,
    UnitDefend,
    UnitDamage,
    UnitHeal,
    UnitDeath,
    UnitRevive,
    UnitIdle,

    Projectile,
    Explosion,
    AreaEffect,
    Beam,
    Aura,
    Shield,

    DamageNumber,
    HealingNumber,
    ExperienceGain,
    GoldGain,

    TerrainChange,
    WeatherEffect,
    LightingChange,

    CameraPan,
    CameraZoom,
    CameraShake,

    ScreenFlash,
    ScreenFade,
    ScreenBlur,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AnimationCategory {
    Unit,
    Effect,
    Ui,
    Environment,
    Camera,
    Screen,
}

impl AnimationKind {
    pub const fn category(self) -> AnimationCategory {
        use AnimationKind::*;
        match self {
            UnitMove | UnitAttack | UnitCast | UnitDefend | UnitDamage | UnitHeal | UnitDeath
            | UnitRevive | UnitIdle => AnimationCategory::Unit,
            Projectile | Explosion | AreaEffect | Beam | Aura | Shield => AnimationCategory::Effect,
            DamageNumber | HealingNumber | ExperienceGain | GoldGain => AnimationCategory::Ui,
            TerrainChange | WeatherEffect | LightingChange => AnimationCategory::Environment,
            CameraPan | CameraZoom | CameraShake => AnimationCategory::Camera,
            ScreenFlash | ScreenFade | ScreenBlur => AnimationCategory::Screen,
        }
    }
}

/// Identifier handed out by [`AnimationScheduler::enqueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimationId(pub u64);

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anim_{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain_{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AnimationStatus {
    #[default]
    Pending,
    Playing,
    Completed,
    Cancelled,
}

/// What to play. Cloneable and serializable; lifecycle hooks live in
/// [`AnimationCallbacks`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSpec {
    #[serde(rename = "type")]
    pub kind: AnimationKind,
    pub unit_id: Option<UnitId>,
    pub source: Option<Position3D>,
    pub target: Option<Position3D>,
    /// Length of one forward pass, in milliseconds.
    pub duration: u64,
    /// Wait between enqueueing and becoming eligible to start.
    pub delay: u64,
    pub easing: Easing,
    pub looping: bool,
    pub auto_reverse: bool,
    pub parameters: BTreeMap<String, f32>,
}

impl AnimationSpec {
    pub const DEFAULT_DURATION: u64 = 1000;

    pub fn new(kind: AnimationKind) -> Self {
        Self {
            kind,
            unit_id: None,
            source: None,
            target: None,
            duration: Self::DEFAULT_DURATION,
            delay: 0,
            easing: Easing::Linear,
            looping: false,
            auto_reverse: false,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_unit(mut self, unit_id: impl Into<UnitId>) -> Self {
        self.unit_id = Some(unit_id.into());
        self
    }

    pub fn with_path(mut self, source: Position3D, target: Position3D) -> Self {
        self.source = Some(source);
        self.target = Some(target);
        self
    }

    pub fn with_target(mut self, target: Position3D) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_delay(mut self, delay: u64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn auto_reverse(mut self) -> Self {
        self.auto_reverse = true;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f32) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn param(&self, key: &str) -> Option<f32> {
        self.parameters.get(key).copied()
    }

    /// Playing time until completion; `None` when the animation loops forever.
    pub fn total_duration(&self) -> Option<u64> {
        if self.looping {
            None
        } else if self.auto_reverse {
            Some(self.duration.saturating_mul(2))
        } else {
            Some(self.duration)
        }
    }

    /// Linear progress `elapsed` milliseconds after the animation started.
    ///
    /// Auto-reversing animations ping-pong between 0 and 1; looping ones wrap.
    pub fn progress_at(&self, elapsed: u64) -> f32 {
        if self.duration == 0 {
            return if self.auto_reverse { 0.0 } else { 1.0 };
        }
        if let Some(total) = self.total_duration()
            && elapsed >= total
        {
            return if self.auto_reverse { 0.0 } else { 1.0 };
        }

        let period = if self.auto_reverse {
            self.duration.saturating_mul(2)
        } else {
            self.duration
        };
        let phase = elapsed % period;
        if phase < self.duration {
            phase as f32 / self.duration as f32
        } else {
            (period - phase) as f32 / self.duration as f32
        }
    }
}

type StartHook = Box<dyn FnMut() + Send>;
type UpdateHook = Box<dyn FnMut(f32) + Send>;
type CompleteHook = Box<dyn FnOnce() + Send>;

/// Optional lifecycle hooks attached to one enqueued animation.
///
/// `on_complete` only runs when the animation finishes normally.
#[derive(Default)]
pub struct AnimationCallbacks {
    pub(crate) on_start: Option<StartHook>,
    pub(crate) on_update: Option<UpdateHook>,
    pub(crate) on_complete: Option<CompleteHook>,
}

impl AnimationCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    pub fn on_update(mut self, hook: impl FnMut(f32) + Send + 'static) -> Self {
        self.on_update = Some(Box::new(hook));
        self
    }

    pub fn on_complete(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for AnimationCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_update", &self.on_update.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChainMode {
    /// One animation after another; a cancelled member aborts the rest.
    Sequence,
    /// All members together; fails if any member is cancelled.
    Parallel,
    /// Caller-supplied stages, each stage played in parallel.
    Mixed,
}

/// A chain is an ordered list of stages. Members of one stage start together;
/// the next stage starts once every member of the current one has finished.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainSpec {
    pub mode: ChainMode,
    pub stages: Vec<Vec<AnimationSpec>>,
}

impl ChainSpec {
    pub fn sequence(animations: Vec<AnimationSpec>) -> Self {
        Self {
            mode: ChainMode::Sequence,
            stages: animations.into_iter().map(|spec| vec![spec]).collect(),
        }
    }

    pub fn parallel(animations: Vec<AnimationSpec>) -> Self {
        Self {
            mode: ChainMode::Parallel,
            stages: vec![animations],
        }
    }

    pub fn mixed(stages: Vec<Vec<AnimationSpec>>) -> Self {
        Self {
            mode: ChainMode::Mixed,
            stages,
        }
    }

    pub fn len(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_every_kind_has_a_category() {
        assert_eq!(AnimationKind::iter().count(), 28);
        assert_eq!(AnimationKind::CameraShake.category(), AnimationCategory::Camera);
        assert_eq!(AnimationKind::GoldGain.category(), AnimationCategory::Ui);
        assert_eq!(AnimationKind::AreaEffect.to_string(), "area_effect");
    }

    #[test]
    fn test_progress_forward() {
        let spec = AnimationSpec::new(AnimationKind::UnitMove).with_duration(200);
        assert_eq!(spec.progress_at(0), 0.0);
        assert_eq!(spec.progress_at(100), 0.5);
        assert_eq!(spec.progress_at(200), 1.0);
        assert_eq!(spec.progress_at(500), 1.0);
    }

    #[test]
    fn test_progress_auto_reverse_ping_pongs() {
        let spec = AnimationSpec::new(AnimationKind::Aura)
            .with_duration(100)
            .auto_reverse();
        assert_eq!(spec.total_duration(), Some(200));
        assert_eq!(spec.progress_at(50), 0.5);
        assert_eq!(spec.progress_at(100), 1.0);
        assert_eq!(spec.progress_at(150), 0.5);
        assert_eq!(spec.progress_at(200), 0.0);
    }

    #[test]
    fn test_progress_huge_reversing_duration_saturates() {
        let spec = AnimationSpec::new(AnimationKind::Aura)
            .with_duration(u64::MAX / 2 + 1)
            .auto_reverse()
            .looping();
        assert_eq!(spec.progress_at(0), 0.0);
        assert!(spec.progress_at(u64::MAX / 2) > 0.99);
        assert!(spec.progress_at(u64::MAX - 1) < 0.01);

        let once = AnimationSpec::new(AnimationKind::Aura)
            .with_duration(u64::MAX)
            .auto_reverse();
        assert_eq!(once.total_duration(), Some(u64::MAX));
        assert!(once.progress_at(u64::MAX / 2) < 0.51);
    }

    #[test]
    fn test_progress_looping_wraps() {
        let spec = AnimationSpec::new(AnimationKind::UnitIdle)
            .with_duration(100)
            .looping();
        assert_eq!(spec.total_duration(), None);
        assert_eq!(spec.progress_at(250), 0.5);
    }

    #[test]
    fn test_chain_shapes() {
        let a = AnimationSpec::new(AnimationKind::UnitAttack);
        let b = AnimationSpec::new(AnimationKind::DamageNumber);
        assert_eq!(ChainSpec::sequence(vec![a.clone(), b.clone()]).stages.len(), 2);
        assert_eq!(ChainSpec::parallel(vec![a.clone(), b.clone()]).stages.len(), 1);
        let mixed = ChainSpec::mixed(vec![vec![a.clone()], vec![a, b]]);
        assert_eq!(mixed.len(), 3);
    }

    #[test]
    fn test_spec_serializes_kind_as_type() {
        let spec = AnimationSpec::new(AnimationKind::ScreenFlash);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], "screen_flash");
        assert_eq!(json["easing"], "linear");
    }
}
