//! Headless runner: connects to an emulator control port and drives the
//! agent loop against it.
//!
//! The control port speaks newline-delimited JSON, one request per line:
//! `{"op":"read_u8","addr":N}` -> `{"ok":true,"value":V}`, and
//! `{"op":"press","button":"UP"}` / `{"op":"release","button":"UP"}`.

mod config;

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use gba_agent_core::agent::{
    AgentController, AgentStep, DecisionPolicy, LlmPolicy, RandomWalk, StepTiming,
};
use gba_agent_core::emulator::{Button, InputPad, MemoryRead};
use gba_agent_core::llm::{OllamaClient, OllamaConfig};
use gba_agent_core::mapper::offsets::FIRERED_USA;

use config::{ConfigLoader, PolicyKind, RunnerConfig};

struct ControlConn {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

/// Emulator handle over the control port. Reads are synchronous by contract,
/// so this uses plain blocking sockets under one connection lock.
struct RemoteEmulator {
    conn: Mutex<ControlConn>,
}

impl RemoteEmulator {
    fn connect(addr: &str) -> anyhow::Result<Self> {
        let stream =
            TcpStream::connect(addr).with_context(|| format!("connect control port {addr}"))?;
        let reader = BufReader::new(stream.try_clone().context("clone control stream")?);
        Ok(Self {
            conn: Mutex::new(ControlConn {
                reader,
                writer: stream,
            }),
        })
    }

    fn request_json(&self, req: Value) -> anyhow::Result<Value> {
        let line = format!("{req}\n");
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("control connection poisoned"))?;
        conn.writer
            .write_all(line.as_bytes())
            .context("control write")?;
        conn.writer.flush().ok();

        let mut resp_line = String::new();
        let n = conn
            .reader
            .read_line(&mut resp_line)
            .context("control read")?;
        if n == 0 {
            anyhow::bail!("control connection closed");
        }
        let v: Value =
            serde_json::from_str(resp_line.trim()).context("invalid control json response")?;
        if v.get("ok").and_then(Value::as_bool) != Some(true) {
            anyhow::bail!("control request failed: {v}");
        }
        Ok(v)
    }

    fn load(&self, op: &'static str, addr: u32) -> anyhow::Result<u64> {
        let v = self.request_json(json!({ "op": op, "addr": addr }))?;
        v.get("value")
            .and_then(Value::as_u64)
            .ok_or_else(|| anyhow::anyhow!("control response missing value: {v}"))
    }

    fn pad(&self, op: &'static str, button: Button) -> anyhow::Result<()> {
        self.request_json(json!({ "op": op, "button": button.name() }))?;
        Ok(())
    }
}

impl MemoryRead for RemoteEmulator {
    fn load_u8(&self, addr: u32) -> anyhow::Result<u8> {
        let v = self.load("read_u8", addr)?;
        u8::try_from(v).with_context(|| format!("control read_u8 value out of range: {v}"))
    }

    fn load_u16(&self, addr: u32) -> anyhow::Result<u16> {
        let v = self.load("read_u16", addr)?;
        u16::try_from(v).with_context(|| format!("control read_u16 value out of range: {v}"))
    }

    fn load_u32(&self, addr: u32) -> anyhow::Result<u32> {
        let v = self.load("read_u32", addr)?;
        u32::try_from(v).with_context(|| format!("control read_u32 value out of range: {v}"))
    }
}

impl InputPad for RemoteEmulator {
    fn press(&self, button: Button) -> anyhow::Result<()> {
        self.pad("press", button)
    }

    fn release(&self, button: Button) -> anyhow::Result<()> {
        self.pad("release", button)
    }
}

fn build_policy(cfg: &RunnerConfig) -> anyhow::Result<Arc<dyn DecisionPolicy>> {
    match cfg.policy {
        PolicyKind::RandomWalk => Ok(Arc::new(RandomWalk)),
        PolicyKind::Llm => {
            let section = cfg
                .ollama
                .clone()
                .context("policy = \"llm\" requires an [ollama] section")?;
            let client = OllamaClient::new(OllamaConfig {
                endpoint: section.endpoint,
                model: section.model,
            });
            Ok(Arc::new(LlmPolicy::new(client)))
        }
    }
}

fn print_step(step: &AgentStep) {
    println!(
        "agent.step ts={} action={} obs={:?} thought={:?}",
        step.timestamp, step.action, step.observation, step.thought
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg: RunnerConfig = ConfigLoader::parse_from_file("gba-agent.toml")?;
    println!(
        "runner.config control_addr={} policy={:?} step_interval_ms={} button_hold_ms={}",
        cfg.control_addr, cfg.policy, cfg.step_interval_ms, cfg.button_hold_ms
    );

    let emulator = Arc::new(RemoteEmulator::connect(&cfg.control_addr)?);
    let policy = build_policy(&cfg)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<AgentStep>();
    let controller =
        AgentController::new(emulator, FIRERED_USA, policy, Arc::new(tx)).with_timing(StepTiming {
            step_interval: Duration::from_millis(cfg.step_interval_ms),
            button_hold: Duration::from_millis(cfg.button_hold_ms),
        });

    controller.start();
    println!("runner.started");

    let mut watchdog = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            step = rx.recv() => {
                match step {
                    Some(step) => print_step(&step),
                    None => break,
                }
            }
            _ = watchdog.tick() => {
                if !controller.is_running() {
                    if let Some(err) = controller.last_error() {
                        eprintln!("agent.loop.error {err}");
                    }
                    eprintln!("runner.loop_stopped");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("runner.shutdown");
                controller.stop();
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    /// One-connection control stub that answers each request line with the
    /// next canned reply.
    fn spawn_control_stub(replies: Vec<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            for reply in replies {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 {
                    break;
                }
                writer.write_all(reply.as_bytes()).unwrap();
                writer.write_all(b"\n").unwrap();
            }
        });
        addr
    }

    #[test]
    fn in_range_control_values_round_trip() {
        let addr = spawn_control_stub(vec![
            r#"{"ok":true,"value":200}"#,
            r#"{"ok":true,"value":65535}"#,
        ]);
        let emu = RemoteEmulator::connect(&addr).unwrap();
        assert_eq!(emu.load_u8(0x10).unwrap(), 200);
        assert_eq!(emu.load_u16(0x12).unwrap(), 65535);
    }

    #[test]
    fn oversized_control_value_is_rejected() {
        let addr = spawn_control_stub(vec![r#"{"ok":true,"value":4096}"#]);
        let emu = RemoteEmulator::connect(&addr).unwrap();
        let err = emu.load_u8(0x10).unwrap_err();
        assert!(
            format!("{err:#}").contains("out of range"),
            "got: {err:#}"
        );
    }

    #[test]
    fn failed_control_request_is_an_error() {
        let addr = spawn_control_stub(vec![r#"{"ok":false,"error":"no core"}"#]);
        let emu = RemoteEmulator::connect(&addr).unwrap();
        let err = emu.load_u8(0x10).unwrap_err();
        assert!(format!("{err:#}").contains("control request failed"));
    }
}
