//! Newline-delimited JSON framing over the private supervisor/worker socket.

use crate::config::types::{ArenaError, Result};
use crate::core::types::Response;
use crossbeam_channel::{bounded, Receiver};
use serde::Serialize;
use std::io::{BufRead, BufReader, Read, Write};
use std::os::unix::net::UnixStream;
use std::thread;

/// Frames longer than this are treated as a broken channel.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// What the supervisor-side reader observed on the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Message(Response),
    Malformed(String),
    Closed,
}

pub fn write_message<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let mut payload = serde_json::to_vec(value)
        .map_err(|e| ArenaError::Protocol(format!("failed to encode message: {e}")))?;
    payload.push(b'\n');
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one frame without its newline. `Ok(None)` means end of channel.
pub fn read_frame<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let limit = MAX_FRAME_BYTES as u64 + 1;
    let read = reader.by_ref().take(limit).read_until(b'\n', &mut buf)?;
    if read == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if buf.len() > MAX_FRAME_BYTES {
        // Drop the remainder so the next read starts at the next frame.
        skip_past_newline(reader)?;
        return Err(ArenaError::Protocol(format!(
            "frame exceeds {MAX_FRAME_BYTES} bytes"
        )));
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|e| ArenaError::Protocol(format!("frame is not utf-8: {e}")))
}

fn skip_past_newline<R: BufRead>(reader: &mut R) -> Result<()> {
    loop {
        let (found, used) = {
            let available = reader.fill_buf()?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|b| *b == b'\n') {
                Some(i) => (true, i + 1),
                None => (false, available.len()),
            }
        };
        reader.consume(used);
        if found {
            return Ok(());
        }
    }
}

/// Spawn the thread that decodes worker responses into a channel.
///
/// The thread stops after the first unreadable frame or end of channel, so
/// killing the worker always ends it.
pub fn spawn_reader(stream: UnixStream) -> Result<Receiver<ChannelEvent>> {
    let (tx, rx) = bounded(16);
    thread::Builder::new()
        .name("worker-reader".to_string())
        .spawn(move || {
            let mut reader = BufReader::new(stream);
            loop {
                let event = match read_frame(&mut reader) {
                    Ok(Some(line)) => match serde_json::from_str::<Response>(&line) {
                        Ok(response) => ChannelEvent::Message(response),
                        Err(e) => ChannelEvent::Malformed(format!("undecodable response: {e}")),
                    },
                    Ok(None) => ChannelEvent::Closed,
                    Err(e) => ChannelEvent::Malformed(e.to_string()),
                };
                let last = !matches!(event, ChannelEvent::Message(_));
                if tx.send(event).is_err() || last {
                    break;
                }
            }
        })?;
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Request;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn frames_are_split_on_newlines() {
        let mut reader = Cursor::new(b"{\"op\":\"stop\"}\nsecond\n".to_vec());
        assert_eq!(read_frame(&mut reader).unwrap().unwrap(), "{\"op\":\"stop\"}");
        assert_eq!(read_frame(&mut reader).unwrap().unwrap(), "second");
        assert!(read_frame(&mut reader).unwrap().is_none());
    }

    #[test]
    fn trailing_frame_without_newline_is_returned() {
        let mut reader = Cursor::new(b"tail".to_vec());
        assert_eq!(read_frame(&mut reader).unwrap().unwrap(), "tail");
    }

    #[test]
    fn oversized_frame_is_an_error() {
        let mut reader = Cursor::new(vec![b'x'; MAX_FRAME_BYTES + 10]);
        assert!(matches!(
            read_frame(&mut reader),
            Err(ArenaError::Protocol(_))
        ));
    }

    #[test]
    fn oversized_frame_is_skipped_whole() {
        let mut data = vec![b'x'; MAX_FRAME_BYTES + 500_000];
        data.extend_from_slice(b"\nnext\n");
        let mut reader = BufReader::new(Cursor::new(data));
        assert!(matches!(
            read_frame(&mut reader),
            Err(ArenaError::Protocol(_))
        ));
        assert_eq!(read_frame(&mut reader).unwrap().unwrap(), "next");
        assert!(read_frame(&mut reader).unwrap().is_none());
    }

    #[test]
    fn written_messages_are_single_lines() {
        let mut out = Vec::new();
        write_message(&mut out, &Request::Stop).unwrap();
        assert_eq!(out, b"{\"op\":\"stop\"}\n");
    }

    #[test]
    fn reader_reports_messages_then_close() {
        let (mut ours, theirs) = UnixStream::pair().unwrap();
        let events = spawn_reader(theirs).unwrap();

        write_message(&mut ours, &Response::ready()).unwrap();
        ours.write_all(b"not json\n").unwrap();

        let timeout = Duration::from_secs(5);
        assert_eq!(
            events.recv_timeout(timeout).unwrap(),
            ChannelEvent::Message(Response::ready())
        );
        assert!(matches!(
            events.recv_timeout(timeout).unwrap(),
            ChannelEvent::Malformed(_)
        ));
    }

    #[test]
    fn reader_sees_close() {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let events = spawn_reader(theirs).unwrap();
        drop(ours);
        assert_eq!(
            events.recv_timeout(Duration::from_secs(5)).unwrap(),
            ChannelEvent::Closed
        );
    }
}
