//! Frame-driven animation queue with a concurrency ceiling.
//!
//! The scheduler never reads a clock. Callers pass the current render time in
//! milliseconds to [`AnimationScheduler::tick`], which admits ready
//! animations in FIFO order, advances everything playing, and settles
//! completions and chains. Results are published on broadcast channels.
use std::collections::{BTreeMap, VecDeque};

use battle_core::{Position3D, UnitId};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::{
    AnimationCallbacks, AnimationId, AnimationKind, AnimationSpec, AnimationStatus, ChainId,
    ChainMode, ChainSpec,
};
use crate::config::SchedulerConfig;

/// Progress of one playing animation during a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationFrame {
    pub id: AnimationId,
    pub kind: AnimationKind,
    pub unit_id: Option<UnitId>,
    pub source: Option<Position3D>,
    pub target: Option<Position3D>,
    /// Linear progress in `[0, 1]`.
    pub progress: f32,
    /// `progress` after easing. May overshoot for back/bounce/elastic.
    pub eased: f32,
    /// Last frame of this animation.
    pub finished: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationCompleted {
    pub id: AnimationId,
    pub spec: AnimationSpec,
    pub chain: Option<ChainId>,
    /// `false` when the animation was cancelled.
    pub success: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainCompleted {
    pub id: ChainId,
    pub mode: ChainMode,
    pub success: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStatus {
    pub queued: usize,
    pub playing: usize,
    pub completed: u64,
}

struct Entry {
    id: AnimationId,
    spec: AnimationSpec,
    callbacks: AnimationCallbacks,
    ready_at: u64,
    started_at: u64,
    status: AnimationStatus,
    chain: Option<ChainId>,
}

impl Entry {
    fn frame(&self, progress: f32, finished: bool) -> AnimationFrame {
        AnimationFrame {
            id: self.id,
            kind: self.spec.kind,
            unit_id: self.spec.unit_id.clone(),
            source: self.spec.source,
            target: self.spec.target,
            progress,
            eased: self.spec.easing.apply(progress),
            finished,
        }
    }
}

struct ChainRun {
    mode: ChainMode,
    stages: VecDeque<Vec<AnimationSpec>>,
    members: Vec<AnimationId>,
    outstanding: usize,
    failed: bool,
}

pub struct AnimationScheduler {
    config: SchedulerConfig,
    clock: u64,
    next_animation: u64,
    next_chain: u64,
    pending: VecDeque<Entry>,
    playing: Vec<Entry>,
    chains: BTreeMap<ChainId, ChainRun>,
    completed: u64,
    paused_at: Option<u64>,
    last_status: QueueStatus,
    completion_tx: broadcast::Sender<AnimationCompleted>,
    chain_tx: broadcast::Sender<ChainCompleted>,
    status_tx: broadcast::Sender<QueueStatus>,
}

impl AnimationScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let capacity = config.channel_capacity.max(1);
        Self {
            config,
            clock: 0,
            next_animation: 1,
            next_chain: 1,
            pending: VecDeque::new(),
            playing: Vec::new(),
            chains: BTreeMap::new(),
            completed: 0,
            paused_at: None,
            last_status: QueueStatus::default(),
            completion_tx: broadcast::channel(capacity).0,
            chain_tx: broadcast::channel(capacity).0,
            status_tx: broadcast::channel(capacity).0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn subscribe_completions(&self) -> broadcast::Receiver<AnimationCompleted> {
        self.completion_tx.subscribe()
    }

    pub fn subscribe_chains(&self) -> broadcast::Receiver<ChainCompleted> {
        self.chain_tx.subscribe()
    }

    pub fn subscribe_status(&self) -> broadcast::Receiver<QueueStatus> {
        self.status_tx.subscribe()
    }

    pub fn enqueue(&mut self, spec: AnimationSpec, now: u64) -> AnimationId {
        self.enqueue_with(spec, AnimationCallbacks::default(), now)
    }

    /// Queues an animation; it becomes eligible at `now + spec.delay`.
    pub fn enqueue_with(
        &mut self,
        spec: AnimationSpec,
        callbacks: AnimationCallbacks,
        now: u64,
    ) -> AnimationId {
        self.clock = self.clock.max(now);
        let id = self.push(spec, callbacks, None, now);
        self.publish_status();
        id
    }

    pub fn enqueue_many(
        &mut self,
        specs: impl IntoIterator<Item = AnimationSpec>,
        now: u64,
    ) -> Vec<AnimationId> {
        self.clock = self.clock.max(now);
        let ids = specs
            .into_iter()
            .map(|spec| self.push(spec, AnimationCallbacks::default(), None, now))
            .collect();
        self.publish_status();
        ids
    }

    /// Queues a chain. Its first stage is enqueued immediately.
    pub fn enqueue_chain(&mut self, chain: ChainSpec, now: u64) -> ChainId {
        self.clock = self.clock.max(now);
        let id = ChainId(self.next_chain);
        self.next_chain += 1;

        debug!(chain = %id, mode = %chain.mode, animations = chain.len(), "chain enqueued");
        self.chains.insert(
            id,
            ChainRun {
                mode: chain.mode,
                stages: chain
                    .stages
                    .into_iter()
                    .filter(|stage| !stage.is_empty())
                    .collect(),
                members: Vec::new(),
                outstanding: 0,
                failed: false,
            },
        );
        self.start_next_stage(id, now);
        self.publish_status();
        id
    }

    /// Cancels a pending or playing animation and frees its slot.
    ///
    /// Returns `false` if the animation is unknown or already finished.
    pub fn cancel(&mut self, id: AnimationId) -> bool {
        let entry = if let Some(index) = self.pending.iter().position(|e| e.id == id) {
            self.pending.remove(index)
        } else if let Some(index) = self.playing.iter().position(|e| e.id == id) {
            Some(self.playing.remove(index))
        } else {
            None
        };
        let Some(mut entry) = entry else {
            return false;
        };

        entry.status = AnimationStatus::Cancelled;
        debug!(animation = %id, kind = %entry.spec.kind, "animation cancelled");
        self.finish(entry, false, self.clock);
        self.publish_status();
        true
    }

    /// Cancels the chain's incomplete members and drops its remaining stages.
    pub fn cancel_chain(&mut self, id: ChainId) -> bool {
        let Some(run) = self.chains.get_mut(&id) else {
            return false;
        };
        run.failed = true;
        run.stages.clear();
        let mode = run.mode;
        let members = run.members.clone();

        for member in members {
            self.cancel(member);
        }
        if self.chains.remove(&id).is_some() {
            self.publish_chain(id, mode, false);
        }
        true
    }

    pub fn cancel_all(&mut self) {
        let mut entries: Vec<Entry> = self.pending.drain(..).collect();
        entries.append(&mut self.playing);
        let count = entries.len();

        for mut entry in entries {
            entry.status = AnimationStatus::Cancelled;
            self.finish(entry, false, self.clock);
        }
        if count > 0 {
            debug!(count, "all animations cancelled");
        }
        self.publish_status();
    }

    /// Freezes every animation at its current progress.
    pub fn pause_all(&mut self, now: u64) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
            debug!(playing = self.playing.len(), "animations paused");
        }
    }

    /// Resumes after [`Self::pause_all`]; paused time does not count as progress.
    pub fn resume_all(&mut self, now: u64) {
        let Some(paused_at) = self.paused_at.take() else {
            return;
        };
        let paused_for = now.saturating_sub(paused_at);
        for entry in &mut self.playing {
            entry.started_at += paused_for;
        }
        for entry in &mut self.pending {
            entry.ready_at += paused_for;
        }
        self.clock = self.clock.max(now);
        debug!(paused_for, "animations resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn is_playing(&self, id: AnimationId) -> bool {
        self.playing.iter().any(|entry| entry.id == id)
    }

    /// Status of a queued or playing animation; `None` once it has finished.
    pub fn animation_status(&self, id: AnimationId) -> Option<AnimationStatus> {
        self.pending
            .iter()
            .chain(self.playing.iter())
            .find(|entry| entry.id == id)
            .map(|entry| entry.status)
    }

    pub fn has_active(&self) -> bool {
        !self.pending.is_empty() || !self.playing.is_empty()
    }

    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            queued: self.pending.len(),
            playing: self.playing.len(),
            completed: self.completed,
        }
    }

    /// Members of the chain's current stage.
    pub fn chain_members(&self, id: ChainId) -> &[AnimationId] {
        self.chains
            .get(&id)
            .map(|run| run.members.as_slice())
            .unwrap_or_default()
    }

    pub fn active_chains(&self) -> usize {
        self.chains.len()
    }

    /// Advances the queue to `now` and returns the frames to render.
    pub fn tick(&mut self, now: u64) -> Vec<AnimationFrame> {
        self.clock = self.clock.max(now);
        let mut frames = Vec::new();
        if self.paused_at.is_some() {
            return frames;
        }

        self.admit(now);
        let mut from = 0;
        loop {
            let finished = self.step(from, now, &mut frames);
            for entry in finished {
                self.finish(entry, true, now);
            }
            // Completions may have freed slots or opened the next chain stage.
            let admitted = self.admit(now);
            if admitted == 0 {
                break;
            }
            from = self.playing.len() - admitted;
        }

        self.publish_status();
        frames
    }

    /// Cancels everything and closes the channels.
    pub fn destroy(mut self) {
        self.cancel_all();
        debug!("animation scheduler destroyed");
    }

    fn push(
        &mut self,
        spec: AnimationSpec,
        callbacks: AnimationCallbacks,
        chain: Option<ChainId>,
        now: u64,
    ) -> AnimationId {
        let id = AnimationId(self.next_animation);
        self.next_animation += 1;
        trace!(animation = %id, kind = %spec.kind, delay = spec.delay, "animation enqueued");

        self.pending.push_back(Entry {
            id,
            ready_at: now.saturating_add(spec.delay),
            started_at: 0,
            status: AnimationStatus::Pending,
            spec,
            callbacks,
            chain,
        });
        id
    }

    fn admit(&mut self, now: u64) -> usize {
        let mut admitted = 0;
        let mut index = 0;
        while index < self.pending.len() && self.playing.len() < self.config.max_concurrent {
            if self.pending[index].ready_at > now {
                index += 1;
                continue;
            }
            if let Some(mut entry) = self.pending.remove(index) {
                entry.status = AnimationStatus::Playing;
                entry.started_at = now;
                if let Some(hook) = entry.callbacks.on_start.as_mut() {
                    hook();
                }
                trace!(animation = %entry.id, kind = %entry.spec.kind, "animation started");
                self.playing.push(entry);
                admitted += 1;
            }
        }
        admitted
    }

    fn step(&mut self, from: usize, now: u64, frames: &mut Vec<AnimationFrame>) -> Vec<Entry> {
        let mut finished = Vec::new();
        let mut index = from;
        while index < self.playing.len() {
            let entry = &mut self.playing[index];
            let elapsed = now.saturating_sub(entry.started_at);
            let progress = entry.spec.progress_at(elapsed);
            let done = entry
                .spec
                .total_duration()
                .is_some_and(|total| elapsed >= total);

            if let Some(hook) = entry.callbacks.on_update.as_mut() {
                hook(progress);
            }
            frames.push(entry.frame(progress, done));

            if done {
                let mut entry = self.playing.remove(index);
                entry.status = AnimationStatus::Completed;
                finished.push(entry);
            } else {
                index += 1;
            }
        }
        finished
    }

    fn finish(&mut self, mut entry: Entry, success: bool, now: u64) {
        if success {
            self.completed += 1;
            if let Some(hook) = entry.callbacks.on_complete.take() {
                hook();
            }
            trace!(animation = %entry.id, kind = %entry.spec.kind, "animation completed");
        }

        let chain = entry.chain;
        let event = AnimationCompleted {
            id: entry.id,
            spec: entry.spec,
            chain,
            success,
        };
        if self.completion_tx.send(event).is_err() {
            trace!("no completion subscribers");
        }

        if let Some(chain) = chain {
            self.member_finished(chain, success, now);
        }
    }

    fn member_finished(&mut self, id: ChainId, success: bool, now: u64) {
        let Some(run) = self.chains.get_mut(&id) else {
            return;
        };
        run.outstanding = run.outstanding.saturating_sub(1);
        if !success {
            run.failed = true;
        }
        if run.outstanding > 0 {
            return;
        }

        if run.failed {
            let mode = run.mode;
            self.chains.remove(&id);
            debug!(chain = %id, "chain failed");
            self.publish_chain(id, mode, false);
        } else {
            self.start_next_stage(id, now);
        }
    }

    fn start_next_stage(&mut self, id: ChainId, now: u64) {
        let Some(run) = self.chains.get_mut(&id) else {
            return;
        };
        let Some(stage) = run.stages.pop_front() else {
            let mode = run.mode;
            self.chains.remove(&id);
            debug!(chain = %id, "chain completed");
            self.publish_chain(id, mode, true);
            return;
        };

        let members: Vec<AnimationId> = stage
            .into_iter()
            .map(|spec| self.push(spec, AnimationCallbacks::default(), Some(id), now))
            .collect();
        if let Some(run) = self.chains.get_mut(&id) {
            run.outstanding = members.len();
            run.members = members;
        }
    }

    fn publish_chain(&self, id: ChainId, mode: ChainMode, success: bool) {
        if self
            .chain_tx
            .send(ChainCompleted { id, mode, success })
            .is_err()
        {
            trace!("no chain subscribers");
        }
    }

    fn publish_status(&mut self) {
        let status = self.status();
        if status == self.last_status {
            return;
        }
        self.last_status = status;
        if self.status_tx.send(status).is_err() {
            trace!("no status subscribers");
        }
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::easing::Easing;

    fn spec(duration: u64) -> AnimationSpec {
        AnimationSpec::new(AnimationKind::UnitMove).with_duration(duration)
    }

    fn drain<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(value) = rx.try_recv() {
            out.push(value);
        }
        out
    }

    #[test]
    fn test_single_animation_completes_after_duration() {
        let mut scheduler = AnimationScheduler::default();
        let mut completions = scheduler.subscribe_completions();
        let id = scheduler.enqueue(spec(100), 0);

        let frames = scheduler.tick(0);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].progress, 0.0);
        assert!(scheduler.is_playing(id));

        let frames = scheduler.tick(50);
        assert_eq!(frames[0].progress, 0.5);
        assert!(!frames[0].finished);

        let frames = scheduler.tick(100);
        assert!(frames[0].finished);
        assert!(!scheduler.has_active());

        let done = drain(&mut completions);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, id);
        assert!(done[0].success);
        assert_eq!(scheduler.status().completed, 1);
    }

    #[test]
    fn test_delay_defers_start() {
        let mut scheduler = AnimationScheduler::default();
        let id = scheduler.enqueue(spec(100).with_delay(40), 10);

        assert!(scheduler.tick(30).is_empty());
        assert_eq!(scheduler.animation_status(id), Some(AnimationStatus::Pending));

        scheduler.tick(50);
        assert_eq!(scheduler.animation_status(id), Some(AnimationStatus::Playing));
    }

    #[test]
    fn test_concurrency_ceiling_admits_fifo() {
        let mut scheduler =
            AnimationScheduler::new(SchedulerConfig::new().with_max_concurrent(2));
        let first = scheduler.enqueue(spec(100), 0);
        let second = scheduler.enqueue(spec(300), 0);
        let third = scheduler.enqueue(spec(100), 0);

        scheduler.tick(0);
        assert!(scheduler.is_playing(first));
        assert!(scheduler.is_playing(second));
        assert!(!scheduler.is_playing(third));
        assert_eq!(scheduler.status().queued, 1);

        scheduler.tick(100);
        assert!(scheduler.is_playing(third));
        assert_eq!(scheduler.status().playing, 2);
    }

    #[test]
    fn test_sequence_chain_completes_after_total_duration() {
        let mut scheduler = AnimationScheduler::default();
        let mut chains = scheduler.subscribe_chains();
        let chain = scheduler.enqueue_chain(ChainSpec::sequence(vec![spec(100), spec(200)]), 0);

        scheduler.tick(0);
        scheduler.tick(100);
        assert!(drain(&mut chains).is_empty());
        assert_eq!(scheduler.chain_members(chain).len(), 1);

        scheduler.tick(299);
        assert!(drain(&mut chains).is_empty());

        scheduler.tick(300);
        let done = drain(&mut chains);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, chain);
        assert!(done[0].success);
        assert_eq!(scheduler.active_chains(), 0);
    }

    #[test]
    fn test_sequence_chain_aborts_when_first_step_cancelled() {
        let mut scheduler = AnimationScheduler::default();
        let mut chains = scheduler.subscribe_chains();
        let mut completions = scheduler.subscribe_completions();
        let chain = scheduler.enqueue_chain(ChainSpec::sequence(vec![spec(100), spec(200)]), 0);

        scheduler.tick(0);
        let first = scheduler.chain_members(chain)[0];
        assert!(scheduler.cancel(first));

        let done = drain(&mut chains);
        assert_eq!(done.len(), 1);
        assert!(!done[0].success);

        for now in [100, 300, 1000] {
            assert!(scheduler.tick(now).is_empty());
        }
        let completions = drain(&mut completions);
        assert_eq!(completions.len(), 1);
        assert!(!completions[0].success);
        assert!(!scheduler.has_active());
    }

    #[test]
    fn test_parallel_chain_fails_if_any_member_cancelled() {
        let mut scheduler = AnimationScheduler::default();
        let mut chains = scheduler.subscribe_chains();
        let chain = scheduler.enqueue_chain(ChainSpec::parallel(vec![spec(100), spec(200)]), 0);

        scheduler.tick(0);
        let members = scheduler.chain_members(chain).to_vec();
        assert_eq!(members.len(), 2);
        assert!(scheduler.cancel(members[1]));
        assert!(drain(&mut chains).is_empty());

        scheduler.tick(100);
        let done = drain(&mut chains);
        assert_eq!(done.len(), 1);
        assert!(!done[0].success);
        assert_eq!(done[0].mode, ChainMode::Parallel);
    }

    #[test]
    fn test_mixed_chain_runs_stages_in_order() {
        let mut scheduler = AnimationScheduler::default();
        let mut chains = scheduler.subscribe_chains();
        let chain = scheduler.enqueue_chain(
            ChainSpec::mixed(vec![vec![spec(100)], vec![spec(50), spec(80)]]),
            0,
        );

        scheduler.tick(0);
        assert_eq!(scheduler.status().playing, 1);
        scheduler.tick(100);
        assert_eq!(scheduler.status().playing, 2);
        assert_eq!(scheduler.chain_members(chain).len(), 2);

        scheduler.tick(150);
        assert!(drain(&mut chains).is_empty());
        scheduler.tick(180);
        let done = drain(&mut chains);
        assert_eq!(done.len(), 1);
        assert!(done[0].success);
    }

    #[test]
    fn test_empty_chain_completes_immediately() {
        let mut scheduler = AnimationScheduler::default();
        let mut chains = scheduler.subscribe_chains();
        scheduler.enqueue_chain(ChainSpec::sequence(Vec::new()), 0);
        assert!(drain(&mut chains)[0].success);
    }

    #[test]
    fn test_cancel_chain_cancels_members() {
        let mut scheduler = AnimationScheduler::default();
        let mut chains = scheduler.subscribe_chains();
        let chain = scheduler.enqueue_chain(ChainSpec::sequence(vec![spec(100), spec(100)]), 0);
        scheduler.tick(0);

        assert!(scheduler.cancel_chain(chain));
        assert!(!scheduler.cancel_chain(chain));
        assert!(!scheduler.has_active());
        let done = drain(&mut chains);
        assert_eq!(done.len(), 1);
        assert!(!done[0].success);
    }

    #[test]
    fn test_cancel_is_idempotent_and_frees_slot() {
        let mut scheduler =
            AnimationScheduler::new(SchedulerConfig::new().with_max_concurrent(1));
        let first = scheduler.enqueue(spec(1000), 0);
        let second = scheduler.enqueue(spec(1000), 0);
        scheduler.tick(0);
        assert!(!scheduler.is_playing(second));

        assert!(scheduler.cancel(first));
        assert!(!scheduler.cancel(first));
        scheduler.tick(1);
        assert!(scheduler.is_playing(second));
    }

    #[test]
    fn test_cancel_all_reports_failures() {
        let mut scheduler = AnimationScheduler::default();
        let mut completions = scheduler.subscribe_completions();
        scheduler.enqueue_many([spec(100), spec(100).with_delay(500)], 0);
        scheduler.tick(0);

        scheduler.cancel_all();
        let done = drain(&mut completions);
        assert_eq!(done.len(), 2);
        assert!(done.iter().all(|event| !event.success));
        assert!(!scheduler.has_active());
    }

    #[test]
    fn test_pause_freezes_progress() {
        let mut scheduler = AnimationScheduler::default();
        scheduler.enqueue(spec(100), 0);
        scheduler.tick(0);
        scheduler.tick(40);

        scheduler.pause_all(40);
        assert!(scheduler.tick(90).is_empty());
        scheduler.resume_all(140);

        let frames = scheduler.tick(150);
        assert_eq!(frames[0].progress, 0.5);
    }

    #[test]
    fn test_callbacks_fire() {
        let starts = Arc::new(AtomicUsize::new(0));
        let updates = Arc::new(Mutex::new(Vec::new()));
        let completes = Arc::new(AtomicUsize::new(0));

        let callbacks = {
            let starts = Arc::clone(&starts);
            let updates = Arc::clone(&updates);
            let completes = Arc::clone(&completes);
            AnimationCallbacks::new()
                .on_start(move || {
                    starts.fetch_add(1, Ordering::SeqCst);
                })
                .on_update(move |progress| updates.lock().unwrap().push(progress))
                .on_complete(move || {
                    completes.fetch_add(1, Ordering::SeqCst);
                })
        };

        let mut scheduler = AnimationScheduler::default();
        scheduler.enqueue_with(spec(100), callbacks, 0);
        scheduler.tick(0);
        scheduler.tick(100);

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(*updates.lock().unwrap(), vec![0.0, 1.0]);
        assert_eq!(completes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_on_complete_skipped_when_cancelled() {
        let completes = Arc::new(AtomicUsize::new(0));
        let hook = Arc::clone(&completes);
        let mut scheduler = AnimationScheduler::default();
        let id = scheduler.enqueue_with(
            spec(100),
            AnimationCallbacks::new().on_complete(move || {
                hook.fetch_add(1, Ordering::SeqCst);
            }),
            0,
        );
        scheduler.tick(0);
        scheduler.cancel(id);
        assert_eq!(completes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_auto_reverse_takes_twice_as_long() {
        let mut scheduler = AnimationScheduler::default();
        let id = scheduler.enqueue(spec(100).auto_reverse(), 0);
        scheduler.tick(0);
        scheduler.tick(100);
        assert!(scheduler.is_playing(id));
        let frames = scheduler.tick(200);
        assert!(frames[0].finished);
        assert_eq!(frames[0].progress, 0.0);
    }

    #[test]
    fn test_loop_runs_until_cancelled() {
        let mut scheduler = AnimationScheduler::default();
        let id = scheduler.enqueue(spec(100).looping(), 0);
        for now in (0..=1000).step_by(100) {
            scheduler.tick(now);
        }
        assert!(scheduler.is_playing(id));
        assert!(scheduler.cancel(id));
        assert!(!scheduler.has_active());
    }

    #[test]
    fn test_frames_carry_eased_progress() {
        let mut scheduler = AnimationScheduler::default();
        scheduler.enqueue(spec(100).with_easing(Easing::EaseIn), 0);
        scheduler.tick(0);
        let frames = scheduler.tick(50);
        assert!((frames[0].eased - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_status_channel_reports_changes() {
        let mut scheduler = AnimationScheduler::default();
        let mut status = scheduler.subscribe_status();
        scheduler.enqueue(spec(100), 0);
        scheduler.tick(0);

        let updates = drain(&mut status);
        assert_eq!(updates.first().map(|s| s.queued), Some(1));
        assert_eq!(updates.last().map(|s| s.playing), Some(1));
        assert!(matches!(status.try_recv(), Err(TryRecvError::Empty)));
    }
}
