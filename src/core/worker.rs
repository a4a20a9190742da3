use crate::bots::{Bot, BotRegistry, BotSettings};
use crate::config::types::ArenaError;
use crate::core::channel::{read_frame, write_message};
use crate::core::types::{BotMethod, Request, Response};
use crate::game::record::Feedback;
use serde_json::Value;
use std::any::Any;
use std::io::BufReader;
use std::os::unix::net::UnixStream;
use std::panic::{self, AssertUnwindSafe};

/// Exit code for a worker that could not load its bot.
pub const EXIT_LOAD_FAILED: i32 = 1;
/// Exit code for a worker whose channel could not be set up.
pub const EXIT_CHANNEL_FAILED: i32 = 126;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run `f` behind a fault boundary: errors and panics both become text.
fn guarded<T>(f: impl FnOnce() -> anyhow::Result<T>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn dispatch(bot: &mut dyn Bot, method: BotMethod, args: Vec<Value>) -> anyhow::Result<Value> {
    match method {
        BotMethod::AgentInfo => Ok(serde_json::to_value(bot.info()?)?),
        BotMethod::MakeGuess => Ok(serde_json::to_value(bot.make_guess()?)?),
        BotMethod::ReceiveFeedback => {
            let raw = args
                .into_iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("receive_feedback() expects a feedback argument"))?;
            let feedback: Feedback = serde_json::from_value(raw)?;
            bot.receive_feedback(&feedback)?;
            Ok(Value::Null)
        }
    }
}

fn decode_request(line: &str) -> Result<Request, ArenaError> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| ArenaError::Protocol(format!("malformed message: {e}")))?;
    let op = match value.as_object() {
        Some(object) => object.get("op").cloned(),
        None => return Err(ArenaError::Protocol("expected object".to_string())),
    };
    serde_json::from_value(value).map_err(|e| match op {
        Some(Value::String(op)) if op != "call" && op != "stop" => {
            ArenaError::Protocol(format!("Unknown call: {op}"))
        }
        _ => ArenaError::Protocol(e.to_string()),
    })
}

/// Answer one frame. `None` means the supervisor asked the worker to stop.
fn handle_frame(bot: &mut dyn Bot, line: &str) -> Option<Response> {
    let (method_name, args) = match decode_request(line) {
        Ok(Request::Stop) => return None,
        Ok(Request::Call { method, args }) => (method, args),
        Err(err) => return Some(Response::failure(err.to_string())),
    };

    let Some(method) = BotMethod::parse(&method_name) else {
        return Some(Response::failure(
            ArenaError::NoSuchMethod(method_name).to_string(),
        ));
    };

    Some(match guarded(|| dispatch(bot, method, args)) {
        Ok(result) => Response::success(result),
        Err(error) => Response::failure(error),
    })
}

fn load_bot(
    registry: &BotRegistry,
    bot_name: &str,
    settings: &BotSettings,
) -> Result<Box<dyn Bot>, String> {
    let constructor = registry
        .get(bot_name)
        .ok_or_else(|| format!("Bot '{bot_name}' not found in registry"))?;

    let bot = guarded(|| constructor(settings))
        .map_err(|e| format!("Instantiation failed:\n{e}"))?;

    guarded(|| bot.info())
        .map_err(|e| format!("{}() failed:\n{e}", BotMethod::AgentInfo.as_str()))?;

    Ok(bot)
}

/// Worker entrypoint executed inside the forked worker process.
///
/// Loads the bot, reports readiness exactly once, then answers requests until
/// a stop request or end of channel. Returns the process exit code.
pub fn run_worker_main(
    stream: UnixStream,
    registry: &BotRegistry,
    bot_name: &str,
    settings: &BotSettings,
) -> i32 {
    let mut writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(_) => return EXIT_CHANNEL_FAILED,
    };
    let mut reader = BufReader::new(stream);

    let mut bot = match load_bot(registry, bot_name, settings) {
        Ok(bot) => bot,
        Err(error) => {
            let _ = write_message(&mut writer, &Response::failure(error));
            return EXIT_LOAD_FAILED;
        }
    };

    if write_message(&mut writer, &Response::ready()).is_err() {
        return EXIT_CHANNEL_FAILED;
    }

    loop {
        let response = match read_frame(&mut reader) {
            Ok(Some(line)) => match handle_frame(bot.as_mut(), &line) {
                Some(response) => response,
                None => break,
            },
            Ok(None) => break,
            Err(err @ ArenaError::Protocol(_)) => Response::failure(err.to_string()),
            Err(_) => break,
        };

        if write_message(&mut writer, &response).is_err() {
            break;
        }
    }

    0
}
