//! End-to-end loop tests against a synthetic emulator: scripted policy,
//! channel sink, paused tokio clock.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use gba_agent_core::agent::{AgentController, AgentStep, Decision, DecisionPolicy};
use gba_agent_core::emulator::{Button, InputPad, MemoryRead, RamSnapshot};
use gba_agent_core::mapper::offsets::AddressTable;

const TEST_TABLE: AddressTable = AddressTable {
    party_count: 0x10,
    map_bank: 0x11,
    map_id: 0x12,
    player_name: 0x20,
    player_id: 0x28,
    player_gender: 0x2A,
    money: 0x2C,
    in_battle: 0x30,
    save_block_ptr: 0x40,
};

/// Synthetic emulator: a RAM snapshot plus a journal of pad events.
struct FakeEmulator {
    ram: RamSnapshot,
    /// (button, pressed) in call order.
    pad_events: Mutex<Vec<(Button, bool)>>,
}

impl FakeEmulator {
    fn with_reference_state() -> Self {
        let mut bytes = vec![0u8; 0x100];
        bytes[0x10] = 2; // party count
        bytes[0x11] = 1; // map bank
        bytes[0x12] = 3; // map id
        bytes[0x20..0x24].copy_from_slice(&[0xCC, 0xD9, 0xD8, 0xFF]); // "Red"
        bytes[0x28..0x2A].copy_from_slice(&12345u16.to_le_bytes());
        bytes[0x2C..0x30].copy_from_slice(&500u32.to_le_bytes());
        bytes[0x40..0x44].copy_from_slice(&0x80u32.to_le_bytes());
        bytes[0x80..0x82].copy_from_slice(&10u16.to_le_bytes());
        bytes[0x82..0x84].copy_from_slice(&20u16.to_le_bytes());
        Self {
            ram: RamSnapshot::new(0, bytes),
            pad_events: Mutex::new(Vec::new()),
        }
    }

    fn events(&self) -> Vec<(Button, bool)> {
        self.pad_events.lock().unwrap().clone()
    }
}

impl MemoryRead for FakeEmulator {
    fn load_u8(&self, addr: u32) -> anyhow::Result<u8> {
        self.ram.load_u8(addr)
    }
    fn load_u16(&self, addr: u32) -> anyhow::Result<u16> {
        self.ram.load_u16(addr)
    }
    fn load_u32(&self, addr: u32) -> anyhow::Result<u32> {
        self.ram.load_u32(addr)
    }
}

impl InputPad for FakeEmulator {
    fn press(&self, button: Button) -> anyhow::Result<()> {
        self.pad_events.lock().unwrap().push((button, true));
        Ok(())
    }
    fn release(&self, button: Button) -> anyhow::Result<()> {
        self.pad_events.lock().unwrap().push((button, false));
        Ok(())
    }
}

/// Emulator with no core attached: every read fails.
struct DetachedEmulator;

impl MemoryRead for DetachedEmulator {
    fn load_u8(&self, _addr: u32) -> anyhow::Result<u8> {
        anyhow::bail!("emulator core not attached")
    }
    fn load_u16(&self, _addr: u32) -> anyhow::Result<u16> {
        anyhow::bail!("emulator core not attached")
    }
    fn load_u32(&self, _addr: u32) -> anyhow::Result<u32> {
        anyhow::bail!("emulator core not attached")
    }
}

impl InputPad for DetachedEmulator {
    fn press(&self, _button: Button) -> anyhow::Result<()> {
        Ok(())
    }
    fn release(&self, _button: Button) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Always presses the same button.
struct Scripted(Button);

impl DecisionPolicy for Scripted {
    fn decide<'a>(
        &'a self,
        observation: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Decision>> + Send + 'a>> {
        let action = self.0;
        Box::pin(async move {
            Ok(Decision {
                thought: format!("scripted: {observation}"),
                action,
            })
        })
    }
}

fn controller_with(
    emulator: Arc<FakeEmulator>,
    policy: Arc<dyn DecisionPolicy>,
) -> (AgentController<FakeEmulator>, mpsc::UnboundedReceiver<AgentStep>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = AgentController::new(emulator, TEST_TABLE, policy, Arc::new(tx));
    (controller, rx)
}

#[tokio::test(start_paused = true)]
async fn scripted_up_policy_emits_expected_first_step() {
    let emulator = Arc::new(FakeEmulator::with_reference_state());
    let (controller, mut rx) = controller_with(Arc::clone(&emulator), Arc::new(Scripted(Button::Up)));

    controller.start();
    let step = rx.recv().await.expect("first step");

    assert_eq!(step.action, "UP");
    assert!(step.observation.contains("(10, 20)"));
    assert!(step.observation.contains("Party size: 2."));

    controller.stop();
}

#[tokio::test(start_paused = true)]
async fn button_is_pressed_then_released_after_hold() {
    let emulator = Arc::new(FakeEmulator::with_reference_state());
    let (controller, mut rx) = controller_with(Arc::clone(&emulator), Arc::new(Scripted(Button::Left)));

    controller.start();
    rx.recv().await.expect("first step");
    controller.stop();

    // Default hold is 200ms; let the detached release task run.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let events = emulator.events();
    assert_eq!(events.first(), Some(&(Button::Left, true)));
    assert!(events.contains(&(Button::Left, false)));
}

#[tokio::test(start_paused = true)]
async fn double_start_runs_exactly_one_loop() {
    let emulator = Arc::new(FakeEmulator::with_reference_state());
    let (controller, mut rx) = controller_with(Arc::clone(&emulator), Arc::new(Scripted(Button::Up)));

    controller.start();
    controller.start();

    let t0 = tokio::time::Instant::now();
    rx.recv().await.expect("first step");
    rx.recv().await.expect("second step");

    // A duplicate loop would deliver two steps immediately; a single loop
    // spaces them by the full step interval.
    assert!(
        t0.elapsed() >= Duration::from_millis(2000),
        "second step arrived after {:?}",
        t0.elapsed()
    );

    controller.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_halts_emission_after_in_flight_iteration() {
    let emulator = Arc::new(FakeEmulator::with_reference_state());
    let (controller, mut rx) = controller_with(Arc::clone(&emulator), Arc::new(Scripted(Button::Up)));

    controller.start();
    rx.recv().await.expect("first step");
    controller.stop();

    // Well past interval + hold: nothing further may arrive.
    tokio::time::sleep(Duration::from_millis(10_000)).await;
    assert!(rx.try_recv().is_err());
    assert!(!controller.is_running());
}

#[tokio::test(start_paused = true)]
async fn restart_during_inflight_sleep_runs_single_loop() {
    let emulator = Arc::new(FakeEmulator::with_reference_state());
    let (controller, mut rx) = controller_with(Arc::clone(&emulator), Arc::new(Scripted(Button::Up)));

    controller.start();
    rx.recv().await.expect("first step");

    // Restart while the first loop task is still asleep in its interval;
    // the stale task must exit instead of racing the new one.
    controller.stop();
    controller.start();

    tokio::time::sleep(Duration::from_millis(10_000)).await;
    controller.stop();

    let mut count = 0;
    while rx.try_recv().is_ok() {
        count += 1;
    }
    // One loop at the 2s cadence fits at most six steps in this window; a
    // leaked second loop roughly doubles that.
    assert!(
        (4..=6).contains(&count),
        "expected a single loop after restart, got {count} steps"
    );
}

#[tokio::test(start_paused = true)]
async fn observe_failure_stops_the_loop_and_exposes_the_error() {
    let (tx, mut rx) = mpsc::unbounded_channel::<AgentStep>();
    let controller = AgentController::new(
        Arc::new(DetachedEmulator),
        TEST_TABLE,
        Arc::new(Scripted(Button::Up)),
        Arc::new(tx),
    );
    assert!(controller.last_error().is_none());

    controller.start();
    tokio::time::sleep(Duration::from_millis(10_000)).await;

    assert!(rx.try_recv().is_err());
    assert!(!controller.is_running(), "loop must go idle after a fatal step");
    let err = controller.last_error().expect("fatal error must be exposed");
    assert!(err.contains("not attached"), "got: {err}");
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_produces_steps_again() {
    let emulator = Arc::new(FakeEmulator::with_reference_state());
    let (controller, mut rx) = controller_with(Arc::clone(&emulator), Arc::new(Scripted(Button::Up)));

    controller.start();
    rx.recv().await.expect("first run step");
    controller.stop();
    tokio::time::sleep(Duration::from_millis(5_000)).await;
    while rx.try_recv().is_ok() {}

    controller.start();
    let step = rx.recv().await.expect("second run step");
    assert_eq!(step.action, "UP");
    controller.stop();
}
