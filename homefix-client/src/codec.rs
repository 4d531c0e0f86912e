//! Socket.IO v4 framing over Engine.IO text frames.
//!
//! Only the default namespace is spoken. Binary packets and acks are not
//! used by the backend and are rejected.

use serde_json::Value;

use homefix_shared::OutboundEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// `0{...}` engine handshake.
    Open(Value),
    /// `1`
    Close,
    /// `2`, sent by the server.
    Ping,
    /// `3`
    Pong,
    /// `40` namespace connect (client request or server ack).
    Connect,
    /// `41`
    Disconnect,
    /// `42["name", payload]`
    Event { name: String, payload: Value },
    /// `44{...}`
    ConnectError(Value),
    /// `6`
    Noop,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PacketError {
    #[error("empty frame")]
    Empty,
    #[error("unsupported packet type {0:?}")]
    Unsupported(String),
    #[error("malformed packet: {0}")]
    Malformed(String),
}

impl Packet {
    pub fn decode(frame: &str) -> Result<Packet, PacketError> {
        let mut chars = frame.chars();
        let engine = chars.next().ok_or(PacketError::Empty)?;
        let rest = chars.as_str();

        match engine {
            '0' => Ok(Packet::Open(parse_json(rest)?)),
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '6' => Ok(Packet::Noop),
            '4' => decode_socket(rest),
            other => Err(PacketError::Unsupported(other.to_string())),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Packet::Open(handshake) => format!("0{}", handshake),
            Packet::Close => "1".to_string(),
            Packet::Ping => "2".to_string(),
            Packet::Pong => "3".to_string(),
            Packet::Connect => "40".to_string(),
            Packet::Disconnect => "41".to_string(),
            Packet::Event { name, payload } => {
                format!("42{}", Value::Array(vec![Value::String(name.clone()), payload.clone()]))
            }
            Packet::ConnectError(body) => format!("44{}", body),
            Packet::Noop => "6".to_string(),
        }
    }

    pub fn event(event: &OutboundEvent) -> Packet {
        Packet::Event { name: event.name().to_string(), payload: event.payload() }
    }
}

fn decode_socket(rest: &str) -> Result<Packet, PacketError> {
    let mut chars = rest.chars();
    let kind = chars.next().ok_or_else(|| PacketError::Malformed("missing socket packet type".into()))?;
    let body = skip_namespace(chars.as_str())?;

    match kind {
        '0' => Ok(Packet::Connect),
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(body),
        '4' => Ok(Packet::ConnectError(if body.is_empty() { Value::Null } else { parse_json(body)? })),
        other => Err(PacketError::Unsupported(format!("4{}", other))),
    }
}

/// Strips a `/nsp,` prefix. Any namespace other than `/` is refused.
fn skip_namespace(body: &str) -> Result<&str, PacketError> {
    if !body.starts_with('/') {
        return Ok(body);
    }
    let (nsp, rest) = match body.find(',') {
        Some(idx) => (&body[..idx], &body[idx + 1..]),
        None => (body, ""),
    };
    if nsp != "/" {
        return Err(PacketError::Unsupported(format!("namespace {}", nsp)));
    }
    Ok(rest)
}

fn decode_event(body: &str) -> Result<Packet, PacketError> {
    // Ack ids precede the array; they are ignored.
    let array = body.trim_start_matches(|c: char| c.is_ascii_digit());
    let mut items = match parse_json(array)? {
        Value::Array(items) => items.into_iter(),
        other => return Err(PacketError::Malformed(format!("event body is not an array: {}", other))),
    };
    let name = match items.next() {
        Some(Value::String(name)) => name,
        _ => return Err(PacketError::Malformed("event name missing".into())),
    };
    Ok(Packet::Event { name, payload: items.next().unwrap_or(Value::Null) })
}

fn parse_json(raw: &str) -> Result<Value, PacketError> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw).map_err(|e| PacketError::Malformed(e.to_string()))
}

/// Turns an http(s) or ws(s) base URL into the Engine.IO websocket endpoint.
pub fn socket_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    let ws = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    if ws.contains("/socket.io") {
        ws
    } else {
        format!("{}/socket.io/?EIO=4&transport=websocket", ws)
    }
}
