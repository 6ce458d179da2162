//! Request framing for the query protocol.
//!
//! A request is `<parameter>#<opcode>` in a single read of at most 4096
//! bytes. A payload of `HEARTBEAT` tokens only refreshes liveness and gets no reply.
//! Requests are strictly one at a time per connection.

use std::borrow::Cow;

use crate::constants::HEARTBEAT_TOKEN;
use crate::constants::REQUEST_SEPARATOR;
use crate::constants::WRONG_OPTION;
use crate::query::Query;
use crate::QueryError;

const TRAILING_NOISE: &[char] = &['\0', '\r', '\n'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    KeepAlive,
    Query(Query),
    Invalid(InvalidRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidRequest {
    MissingSeparator,
    BadOpcode(String),
    UnknownOpcode(i64),
}

pub fn parse_request(payload: &[u8]) -> Request {
    let text: Cow<'_, str> = String::from_utf8_lossy(payload);
    let text = text.trim_end_matches(TRAILING_NOISE);

    if is_keep_alive(text.as_bytes()) {
        return Request::KeepAlive;
    }

    let Some((parameter, opcode)) = text.split_once(REQUEST_SEPARATOR) else {
        return Request::Invalid(InvalidRequest::MissingSeparator);
    };

    let opcode_text = opcode.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0');
    let opcode = match opcode_text.parse::<i64>() {
        Ok(opcode) => opcode,
        Err(_) => return Request::Invalid(InvalidRequest::BadOpcode(opcode_text.to_string())),
    };

    match Query::from_opcode(opcode, parameter) {
        Some(query) => Request::Query(query),
        None => Request::Invalid(InvalidRequest::UnknownOpcode(opcode)),
    }
}

/// One or more back-to-back `HEARTBEAT` tokens. Several keep-alives land in
/// a single read when the session starts late or the peer writes faster than
/// it is read.
fn is_keep_alive(mut payload: &[u8]) -> bool {
    let mut tokens = 0;
    while let Some(rest) = payload.strip_prefix(HEARTBEAT_TOKEN) {
        tokens += 1;
        payload = rest;
        while let [b'\0' | b'\r' | b'\n', tail @ ..] = payload {
            payload = tail;
        }
    }
    tokens > 0 && payload.is_empty()
}

/// Text sent back for a request. Keep-alives never reach here.
pub fn render_response(outcome: Result<String, QueryError>) -> String {
    match outcome {
        Ok(text) => text,
        Err(e) => e.to_string(),
    }
}

/// Reply to any request that does not map to a query.
pub fn wrong_option() -> String {
    WRONG_OPTION.to_string()
}
