use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;

use super::observation::format_observation;
use super::policy::DecisionPolicy;
use super::step::{now_millis, AgentStep, StepSink};
use crate::emulator::{InputPad, MemoryRead};
use crate::mapper::offsets::AddressTable;
use crate::mapper::RamMapper;

/// Cadence of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTiming {
    /// Pause between completed iterations.
    pub step_interval: Duration,
    /// How long a chosen button is held before release.
    pub button_hold: Duration,
}

impl Default for StepTiming {
    fn default() -> Self {
        Self {
            step_interval: Duration::from_millis(2000),
            button_hold: Duration::from_millis(200),
        }
    }
}

/// Drives one observe -> decide -> act loop against one emulator handle.
///
/// Lifecycle is Idle -> Running -> Idle: `start` is a no-op while a loop is
/// already active, `stop` is cooperative and takes effect at the next
/// iteration boundary. Any error during a step stops the loop; a supervised
/// agent should fail loud rather than retry quietly. The failure is exposed
/// through [`AgentController::last_error`], never printed here.
///
/// At most one controller should be active per emulator instance. The
/// controller does not lock the handle against other writers; that invariant
/// is the caller's.
pub struct AgentController<E>
where
    E: MemoryRead + InputPad + 'static,
{
    emulator: Arc<E>,
    table: AddressTable,
    policy: Arc<dyn DecisionPolicy>,
    sink: Arc<dyn StepSink>,
    timing: StepTiming,
    running: Arc<AtomicBool>,
    // Bumped on every start; a loop task exits once its own tag is stale, so
    // a stop-then-restart while the old task is asleep in its interval can
    // never leave two loops emitting steps.
    generation: Arc<AtomicU64>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl<E> AgentController<E>
where
    E: MemoryRead + InputPad + 'static,
{
    pub fn new(
        emulator: Arc<E>,
        table: AddressTable,
        policy: Arc<dyn DecisionPolicy>,
        sink: Arc<dyn StepSink>,
    ) -> Self {
        Self {
            emulator,
            table,
            policy,
            sink,
            timing: StepTiming::default(),
            running: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_timing(mut self, timing: StepTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Why the loop last stopped on its own (fatal step error), or the most
    /// recent failure from the detached button release. Cleared on `start`.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|slot| slot.clone())
    }

    /// Spawns the loop task. A no-op while a loop is already active, so two
    /// `start` calls never produce duplicate step streams.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let my_gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = None;
        }

        let emulator = Arc::clone(&self.emulator);
        let mapper = RamMapper::new(Arc::clone(&self.emulator), self.table);
        let policy = Arc::clone(&self.policy);
        let sink = Arc::clone(&self.sink);
        let timing = self.timing;
        let running = Arc::clone(&self.running);
        let generation = Arc::clone(&self.generation);
        let last_error = Arc::clone(&self.last_error);

        tokio::spawn(async move {
            while running.load(Ordering::SeqCst) && generation.load(Ordering::SeqCst) == my_gen {
                match run_step(&mapper, &emulator, policy.as_ref(), timing, &last_error).await {
                    Ok(step) => sink.on_step(step),
                    Err(err) => {
                        if let Ok(mut slot) = last_error.lock() {
                            *slot = Some(format!("{err:#}"));
                        }
                        break;
                    }
                }
                // The next wake-up is armed only after the step completed;
                // iterations never overlap.
                tokio::time::sleep(timing.step_interval).await;
            }
            // A stale loop must not clobber the flag of a restarted one.
            if generation.load(Ordering::SeqCst) == my_gen {
                running.store(false, Ordering::SeqCst);
            }
        });
    }

    /// Cooperative stop: the in-flight iteration finishes, then the loop
    /// exits. Does not preempt the pending button release.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

async fn run_step<E>(
    mapper: &RamMapper<Arc<E>>,
    emulator: &Arc<E>,
    policy: &dyn DecisionPolicy,
    timing: StepTiming,
    errors: &Arc<Mutex<Option<String>>>,
) -> anyhow::Result<AgentStep>
where
    E: MemoryRead + InputPad + 'static,
{
    // 1. Observe.
    let state = mapper.game_state().context("observe")?;
    let observation = format_observation(&state);

    // 2. Decide.
    let decision = policy.decide(&observation).await.context("decide")?;
    let button = decision.action;

    // 3. Act. The release runs detached so the hold never gates the cadence.
    emulator.press(button).context("press button")?;
    let pad = Arc::clone(emulator);
    let release_errors = Arc::clone(errors);
    let hold = timing.button_hold;
    tokio::spawn(async move {
        tokio::time::sleep(hold).await;
        if let Err(err) = pad.release(button) {
            if let Ok(mut slot) = release_errors.lock() {
                *slot = Some(format!("release {button}: {err:#}"));
            }
        }
    });

    Ok(AgentStep {
        observation,
        thought: decision.thought,
        action: button.name().to_string(),
        timestamp: now_millis(),
    })
}
