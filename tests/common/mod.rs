//! Misbehaving bots shared by the integration tests.
#![allow(dead_code)]

use mastermind_box::bots::{Bot, BotRegistry, BotSettings};
use mastermind_box::{AgentInfo, Feedback, SandboxLimits};
use std::cell::Cell;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Long enough that only a kill ends it.
pub const FOREVER: Duration = Duration::from_secs(30);

pub fn fast_limits() -> SandboxLimits {
    SandboxLimits {
        start_timeout: Duration::from_secs(5),
        call_timeout: Duration::from_millis(300),
        stop_timeout: Duration::from_secs(1),
    }
}

pub fn settings(colors: &[&str], code_length: usize) -> BotSettings {
    BotSettings {
        bot_seed: Some(1),
        code_colors: colors.iter().map(|c| c.to_string()).collect(),
        code_length,
    }
}

/// Where a [`Scripted`] bot misbehaves.
#[derive(Clone, Copy, Debug)]
pub enum Fault {
    None,
    SleepInGuess,
    SleepInFeedback,
    SleepInSecondInfo,
    ErrorInGuess,
    ErrorInFeedback,
    PanicInGuess,
    ErrorInInfo,
    ExitInGuess,
    WrongLength,
    BadColor,
}

/// Plays `code` every turn unless its fault fires.
pub struct Scripted {
    code: Vec<String>,
    fault: Fault,
    info_calls: Cell<u32>,
}

impl Scripted {
    pub fn new(code: Vec<String>, fault: Fault) -> Self {
        Self {
            code,
            fault,
            info_calls: Cell::new(0),
        }
    }
}

impl Bot for Scripted {
    fn info(&self) -> anyhow::Result<AgentInfo> {
        let calls = self.info_calls.get() + 1;
        self.info_calls.set(calls);
        match self.fault {
            // The worker probes info once while loading; the engine's call is the second.
            Fault::SleepInSecondInfo if calls >= 2 => thread::sleep(FOREVER),
            Fault::ErrorInInfo if calls >= 2 => anyhow::bail!("identity crisis"),
            _ => {}
        }
        Ok(AgentInfo::new("Scripted", "tests"))
    }

    fn make_guess(&mut self) -> anyhow::Result<Vec<String>> {
        match self.fault {
            Fault::SleepInGuess => thread::sleep(FOREVER),
            Fault::ErrorInGuess => anyhow::bail!("no idea"),
            Fault::PanicInGuess => panic!("guess exploded"),
            Fault::ExitInGuess => unsafe { libc::_exit(3) },
            Fault::WrongLength => {
                let mut code = self.code.clone();
                code.push(code[0].clone());
                return Ok(code);
            }
            Fault::BadColor => return Ok(vec!["?".to_string(); self.code.len()]),
            _ => {}
        }
        Ok(self.code.clone())
    }

    fn receive_feedback(&mut self, _feedback: &Feedback) -> anyhow::Result<()> {
        match self.fault {
            Fault::SleepInFeedback => {
                thread::sleep(FOREVER);
                Ok(())
            }
            Fault::ErrorInFeedback => anyhow::bail!("feedback rejected"),
            _ => Ok(()),
        }
    }
}

fn register_scripted(registry: &mut BotRegistry, name: &str, fault: Fault) {
    registry.register(name, move |settings: &BotSettings| {
        let code = vec![settings.code_colors[0].clone(); settings.code_length];
        let bot: Box<dyn Bot> = Box::new(Scripted::new(code, fault));
        Ok(bot)
    });
}

/// Built-in bots plus one scripted bot per fault, and a few that fail to load.
pub fn registry() -> Arc<BotRegistry> {
    let mut registry = BotRegistry::with_builtin();
    for (name, fault) in [
        ("steady", Fault::None),
        ("sleepy_guess", Fault::SleepInGuess),
        ("sleepy_feedback", Fault::SleepInFeedback),
        ("sleepy_info", Fault::SleepInSecondInfo),
        ("error_guess", Fault::ErrorInGuess),
        ("error_feedback", Fault::ErrorInFeedback),
        ("error_info", Fault::ErrorInInfo),
        ("panic_guess", Fault::PanicInGuess),
        ("exit_guess", Fault::ExitInGuess),
        ("wrong_length", Fault::WrongLength),
        ("bad_color", Fault::BadColor),
    ] {
        register_scripted(&mut registry, name, fault);
    }

    registry.register("panic_ctor", |_settings: &BotSettings| -> anyhow::Result<Box<dyn Bot>> {
        panic!("constructor exploded")
    });
    registry.register("error_ctor", |_settings: &BotSettings| -> anyhow::Result<Box<dyn Bot>> {
        anyhow::bail!("missing weights file")
    });
    registry.register("slow_ctor", |_settings: &BotSettings| -> anyhow::Result<Box<dyn Bot>> {
        thread::sleep(FOREVER);
        anyhow::bail!("unreachable")
    });

    Arc::new(registry)
}
