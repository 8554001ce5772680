//! High-level runtime orchestrator.
//!
//! The runtime owns the battle engine and the combat view, asks the injected
//! providers for actions, and forwards every resulting event to the view. In
//! mirror mode actions are resolved elsewhere and the runtime only folds
//! inbound events into its local engine.

use std::path::Path;

use battle_core::{BattleEngine, BattlePhase, SubmittedAction, TeamId, Unit, UnitId};
use scene::RenderHost;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::api::{ActionProvider, ProviderKind, Result, RuntimeError};
use crate::config::RuntimeConfig;
use crate::events::{Event, Topic};
use crate::snapshot::BattleSnapshot;
use crate::transport::EventInbox;
use crate::view::{CombatView, TickSummary, ViewStats};

/// Who resolves actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RuntimeMode {
    /// The local engine is authoritative and providers choose actions.
    #[default]
    Local,
    /// A remote authority sends the events; the local engine mirrors them.
    Mirror,
}

/// What one [`Runtime::step`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    /// A provider's action was resolved during this step.
    pub acted: bool,
    pub phase: BattlePhase,
    pub view: TickSummary,
}

/// Main runtime that drives one battle and its presentation.
pub struct Runtime<H: RenderHost> {
    config: RuntimeConfig,
    mode: RuntimeMode,
    engine: BattleEngine,
    view: CombatView<H>,
    inbox: EventInbox,

    // Action providers (injected by user)
    player_provider: Option<Box<dyn ActionProvider>>,
    npc_provider: Option<Box<dyn ActionProvider>>,
}

impl<H: RenderHost> Runtime<H> {
    /// Create a new runtime builder around a render host
    pub fn builder(host: H) -> RuntimeBuilder<H> {
        RuntimeBuilder::new(host)
    }

    /// Opens the battle.
    ///
    /// A resumed battle is already running, and in mirror mode the remote
    /// start event opens it, so both return without touching the engine.
    pub fn start(&mut self, now: u64) -> Result<()> {
        if self.mode == RuntimeMode::Mirror {
            debug!("mirror runtime waits for remote combat start");
            return Ok(());
        }
        if self.engine.phase() != BattlePhase::Idle {
            debug!(phase = ?self.engine.phase(), "battle already started");
            return Ok(());
        }
        let events = self.engine.start(now)?;
        self.view.enqueue(events);
        Ok(())
    }

    /// Execute a single frame.
    ///
    /// When the engine waits for an action and the view has finished
    /// presenting, the active unit's provider is asked for one. A rejected
    /// action is replaced by a wait so the battle always advances.
    pub async fn step(&mut self, now: u64) -> Result<StepOutcome> {
        let mut acted = false;
        if self.mode == RuntimeMode::Local
            && self.engine.phase() == BattlePhase::WaitingAction
            && !self.view.is_busy()
        {
            self.take_turn(now).await?;
            acted = true;
        }

        if let Some(event) = self.engine.evaluate(now) {
            self.view.enqueue([event]);
        }
        let view = self.view.tick(now)?;
        Ok(StepOutcome {
            acted,
            phase: self.engine.phase(),
            view,
        })
    }

    async fn take_turn(&mut self, now: u64) -> Result<()> {
        let unit = self
            .engine
            .state()
            .active_unit_id
            .clone()
            .ok_or(RuntimeError::NoActiveUnit)?;
        let kind = if self
            .engine
            .state()
            .unit(&unit)
            .is_some_and(|unit| unit.team_id.is_player())
        {
            ProviderKind::Player
        } else {
            ProviderKind::Npc
        };
        let provider = match kind {
            ProviderKind::Player => self.player_provider.as_ref(),
            ProviderKind::Npc => self.npc_provider.as_ref(),
        }
        .ok_or(RuntimeError::ProviderNotSet { kind })?;

        let action = provider.provide_action(&unit, self.engine.state()).await?;
        let resolution = match self.engine.act(action, now) {
            Ok(resolution) => resolution,
            Err(err) => {
                warn!(unit = %unit, error = %err, "provider action rejected, waiting instead");
                self.engine.act(SubmittedAction::wait(unit.clone()), now)?
            }
        };
        debug!(
            unit = %unit,
            events = resolution.events.len(),
            phase = ?resolution.phase,
            "turn resolved"
        );
        self.view.enqueue(resolution.events);
        Ok(())
    }

    /// Buffers one raw event from the remote authority.
    ///
    /// Returns `false` for message types this build does not know. Only a
    /// mirror runtime accepts remote events.
    pub fn receive_remote(&mut self, raw: &str) -> Result<bool> {
        self.ensure_mirroring()?;
        Ok(self.inbox.receive(raw)?)
    }

    /// Folds every buffered remote event into the engine, in order, and hands
    /// them to the view. Returns how many were applied.
    pub fn flush_remote(&mut self, now: u64) -> Result<usize> {
        self.ensure_mirroring()?;
        let events = self.inbox.drain();
        let mut applied = Vec::with_capacity(events.len());
        for event in events {
            match self.engine.apply_event(&event) {
                Ok(()) => applied.push(event),
                Err(err) => {
                    warn!(error = %err, sequence = event.sequence(), "remote event rejected");
                }
            }
        }
        let count = applied.len();
        self.view.enqueue(applied);
        if let Some(event) = self.engine.evaluate(now) {
            self.view.enqueue([event]);
        }
        Ok(count)
    }

    /// [`Self::receive_remote`] followed by [`Self::flush_remote`].
    pub fn apply_remote(&mut self, raw: &str, now: u64) -> Result<usize> {
        self.receive_remote(raw)?;
        self.flush_remote(now)
    }

    fn ensure_mirroring(&self) -> Result<()> {
        if self.mode == RuntimeMode::Mirror {
            Ok(())
        } else {
            warn!(session = %self.config.session_id, "remote event offered to a local runtime");
            Err(RuntimeError::NotMirroring)
        }
    }

    /// Ends the battle with `team` conceding.
    pub fn surrender(&mut self, team: &TeamId, now: u64) -> Result<()> {
        let event = self.engine.surrender(team, now)?;
        self.view.enqueue([event]);
        Ok(())
    }

    /// The battle is over and the view has finished presenting it.
    pub fn is_finished(&self) -> bool {
        self.engine.phase().is_finished() && !self.view.is_busy()
    }

    pub fn winner(&self) -> Option<&TeamId> {
        self.engine.winner()
    }

    pub fn active_unit(&self) -> Option<&UnitId> {
        self.engine.state().active_unit_id.as_ref()
    }

    pub fn snapshot(&self, now: u64) -> BattleSnapshot {
        BattleSnapshot::capture(self.config.session_id.clone(), &self.engine, now)
    }

    /// Saves a snapshot to `path`, or to the session's default file.
    pub fn save_snapshot(&self, path: Option<&Path>, now: u64) -> Result<()> {
        let snapshot = self.snapshot(now);
        match path {
            Some(path) => snapshot.save(path)?,
            None => snapshot.save(BattleSnapshot::default_path(&self.config.session_id))?,
        }
        Ok(())
    }

    /// Subscribe to a bus topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.view.bus().subscribe(topic)
    }

    pub fn engine(&self) -> &BattleEngine {
        &self.engine
    }

    pub fn view(&self) -> &CombatView<H> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut CombatView<H> {
        &mut self.view
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    /// Set the player action provider
    pub fn set_player_provider(&mut self, provider: impl ActionProvider + 'static) {
        self.player_provider = Some(Box::new(provider));
    }

    /// Set the NPC action provider
    pub fn set_npc_provider(&mut self, provider: impl ActionProvider + 'static) {
        self.npc_provider = Some(Box::new(provider));
    }

    /// Shutdown the runtime, tearing down the view
    pub fn shutdown(self) -> ViewStats {
        let stats = self.view.shutdown();
        info!(
            session = %self.config.session_id,
            phase = ?self.engine.phase(),
            winner = ?self.engine.winner(),
            "runtime shut down"
        );
        stats
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder<H: RenderHost> {
    host: H,
    config: RuntimeConfig,
    mode: RuntimeMode,
    combat_id: String,
    participants: Vec<Unit>,
    assets: Vec<(String, String)>,
    snapshot: Option<BattleSnapshot>,
    player_provider: Option<Box<dyn ActionProvider>>,
    npc_provider: Option<Box<dyn ActionProvider>>,
}

impl<H: RenderHost> RuntimeBuilder<H> {
    fn new(host: H) -> Self {
        Self {
            host,
            config: RuntimeConfig::default(),
            mode: RuntimeMode::Local,
            combat_id: "battle".to_owned(),
            participants: Vec::new(),
            assets: Vec::new(),
            snapshot: None,
            player_provider: None,
            npc_provider: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn combat_id(mut self, combat_id: impl Into<String>) -> Self {
        self.combat_id = combat_id.into();
        self
    }

    /// Units placed on the grid at build time
    pub fn participants(mut self, participants: Vec<Unit>) -> Self {
        self.participants = participants;
        self
    }

    /// Texture `(key, path)` pairs loaded when the view initializes
    pub fn asset(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        self.assets.push((key.into(), path.into()));
        self
    }

    /// Resume from a snapshot instead of starting a new battle.
    ///
    /// The snapshot's battle configuration replaces the configured one.
    pub fn resume(mut self, snapshot: BattleSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Set player action provider (optional)
    pub fn player_provider(mut self, provider: impl ActionProvider + 'static) -> Self {
        self.player_provider = Some(Box::new(provider));
        self
    }

    /// Set NPC action provider (optional)
    pub fn npc_provider(mut self, provider: impl ActionProvider + 'static) -> Self {
        self.npc_provider = Some(Box::new(provider));
        self
    }

    /// Build the runtime and initialize its view
    pub fn build(self, now: u64) -> Result<Runtime<H>> {
        let mut config = self.config;
        let engine = match self.snapshot {
            Some(snapshot) => {
                info!(session = %snapshot.session_id, saved_at = snapshot.saved_at, "resuming battle");
                config.battle = snapshot.config.clone();
                snapshot.restore()
            }
            None => BattleEngine::new(self.combat_id, config.battle.clone(), self.participants, now),
        };

        let mut view = CombatView::new(config.view.clone(), self.host);
        view.initialize(
            engine.state(),
            self.assets
                .iter()
                .map(|(key, path)| (key.as_str(), path.as_str())),
            now,
        )?;
        let inbox = EventInbox::for_combat(engine.state().id.clone());

        info!(
            session = %config.session_id,
            combat = %engine.state().id,
            mode = ?self.mode,
            "runtime built"
        );
        Ok(Runtime {
            config,
            mode: self.mode,
            engine,
            view,
            inbox,
            player_provider: self.player_provider,
            npc_provider: self.npc_provider,
        })
    }
}
