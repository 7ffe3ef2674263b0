use std::collections::{BTreeMap, HashMap};
use std::fmt;

use bytes::Bytes;
use parking_lot::Mutex;
use rmpv::Value;

use crate::error::ProtoError;
use crate::urgency::Urgency;

/// The only protocol version this codec can decode frames from.
pub const CURRENT_VERSION: u8 = 0;

/// Highest version this codec knows how to *encode* into, for schema
/// generations that are wire-compatible with version 0. A hub that has
/// negotiated a higher version with a subscriber than this is simply unable
/// to serve it the frame (§8, "Fan-out under partial failure").
const MAX_ENCODE_VERSION: u8 = 2;

/// The recognized message types and their arguments for protocol version 0.
/// Unknown types remain representable (`MessageBody::Unknown`) so that
/// forward-compatible peers can carry them without loss, per §4.1.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Notify {
        app_name: String,
        summary: String,
        body: String,
        urgency: Urgency,
        category: Option<String>,
        id: Option<String>,
    },
    Accepted {
        id: String,
    },
    Subscribe,
    Subscribed,
    Goodbye,
    Error {
        reason: String,
    },
    /// A message of a `msg_type` not recognized by this version. The raw
    /// argument bag is preserved verbatim.
    Unknown {
        msg_type: String,
        args: BTreeMap<String, Value>,
    },
}

impl MessageBody {
    pub fn msg_type(&self) -> &str {
        match self {
            MessageBody::Notify { .. } => "notify",
            MessageBody::Accepted { .. } => "accepted",
            MessageBody::Subscribe => "subscribe",
            MessageBody::Subscribed => "subscribed",
            MessageBody::Goodbye => "goodbye",
            MessageBody::Error { .. } => "error",
            MessageBody::Unknown { msg_type, .. } => msg_type,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, MessageBody::Unknown { .. })
    }
}

/// An immutable protocol message.
///
/// Grounded on `heyu.protocol.Message` from the original Python source: a
/// `version`, a `msg_type`, and a bag of typed arguments, with a per-version
/// frame cache so re-encoding a decoded message into its native version
/// reproduces the original bytes exactly (§8 "Round-trip"). Unlike the
/// dynamic-attribute original, arguments are a closed, typed enum
/// (`MessageBody`) per the "Dynamic argument bags on Message" design note:
/// a Rust `Notify { .. }` literal simply cannot be built without its
/// required fields, which is the construction-time failure spec.md asks for.
pub struct Message {
    version: u8,
    body: MessageBody,
    frame_cache: Mutex<HashMap<u8, Bytes>>,
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("version", &self.version)
            .field("body", &self.body)
            .finish()
    }
}

impl Clone for Message {
    fn clone(&self) -> Self {
        Message {
            version: self.version,
            body: self.body.clone(),
            frame_cache: Mutex::new(self.frame_cache.lock().clone()),
        }
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.body == other.body
    }
}

impl Message {
    fn new(body: MessageBody) -> Self {
        Message {
            version: CURRENT_VERSION,
            body,
            frame_cache: Mutex::new(HashMap::new()),
        }
    }

    fn with_cached_frame(version: u8, body: MessageBody, frame: Bytes) -> Self {
        let mut cache = HashMap::new();
        cache.insert(version, frame);
        Message {
            version,
            body,
            frame_cache: Mutex::new(cache),
        }
    }

    pub fn notify(
        app_name: impl Into<String>,
        summary: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::new(MessageBody::Notify {
            app_name: app_name.into(),
            summary: summary.into(),
            body: body.into(),
            urgency: Urgency::default(),
            category: None,
            id: None,
        })
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        if let MessageBody::Notify { urgency: u, .. } = &mut self.body {
            *u = urgency;
        }
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        if let MessageBody::Notify { category: c, .. } = &mut self.body {
            *c = Some(category.into());
        }
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        match &mut self.body {
            MessageBody::Notify { id: i, .. } => *i = Some(id.into()),
            _ => {}
        }
        self
    }

    pub fn accepted(id: impl Into<String>) -> Self {
        Self::new(MessageBody::Accepted { id: id.into() })
    }

    pub fn subscribe() -> Self {
        Self::new(MessageBody::Subscribe)
    }

    pub fn subscribed() -> Self {
        Self::new(MessageBody::Subscribed)
    }

    pub fn goodbye() -> Self {
        Self::new(MessageBody::Goodbye)
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::new(MessageBody::Error {
            reason: reason.into(),
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn msg_type(&self) -> &str {
        self.body.msg_type()
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn known(&self) -> bool {
        self.body.is_known()
    }

    /// Encodes this message for its own (native) version, reusing the
    /// original wire bytes verbatim if this `Message` was produced by
    /// [`Message::decode`].
    pub fn to_frame(&self) -> Bytes {
        self.encode_for_version(self.version)
            .expect("a message's own version is always encodable")
    }

    /// Encodes this message for `version`, which may differ from the
    /// message's native version. Only versions up to [`MAX_ENCODE_VERSION`]
    /// are supported -- the baseline codec does not know how to serialize
    /// into arbitrary future versions, so a subscriber negotiated at a
    /// version past that point cannot be served (§8 "Fan-out under partial
    /// failure").
    pub fn encode_for_version(&self, version: u8) -> Result<Bytes, ProtoError> {
        if let Some(cached) = self.frame_cache.lock().get(&version) {
            return Ok(cached.clone());
        }

        if version != self.version && version > MAX_ENCODE_VERSION {
            return Err(ProtoError::CannotSerializeVersion(version));
        }

        let value = self.encode_value(version);
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &value).map_err(|e| ProtoError::Msgpack(e.to_string()))?;
        let frame = Bytes::from(buf);

        self.frame_cache.lock().insert(version, frame.clone());
        Ok(frame)
    }

    fn encode_value(&self, version: u8) -> Value {
        let mut map: Vec<(Value, Value)> = Vec::new();
        map.push((Value::from("__version__"), Value::from(version)));
        map.push((Value::from("msg_type"), Value::from(self.body.msg_type())));

        match &self.body {
            MessageBody::Notify {
                app_name,
                summary,
                body,
                urgency,
                category,
                id,
            } => {
                map.push((Value::from("app_name"), Value::from(app_name.as_str())));
                map.push((Value::from("summary"), Value::from(summary.as_str())));
                map.push((Value::from("body"), Value::from(body.as_str())));
                if *urgency != Urgency::default() {
                    map.push((Value::from("urgency"), Value::from(urgency.as_u8())));
                }
                if let Some(c) = category {
                    map.push((Value::from("category"), Value::from(c.as_str())));
                }
                if let Some(i) = id {
                    map.push((Value::from("id"), Value::from(i.as_str())));
                }
            }
            MessageBody::Accepted { id } => {
                map.push((Value::from("id"), Value::from(id.as_str())));
            }
            MessageBody::Subscribe | MessageBody::Subscribed | MessageBody::Goodbye => {}
            MessageBody::Error { reason } => {
                map.push((Value::from("reason"), Value::from(reason.as_str())));
            }
            MessageBody::Unknown { args, .. } => {
                for (k, v) in args {
                    map.push((Value::from(k.as_str()), v.clone()));
                }
            }
        }

        Value::Map(map)
    }

    /// Decodes a `Message` from a raw binary frame.
    ///
    /// Fails with a [`ProtoError`] when the frame is not a map, is missing
    /// `__version__` or `msg_type`, names an unsupported version, or (for a
    /// known type in that version) omits a required argument. An unknown
    /// `msg_type` in a supported version decodes successfully.
    pub fn decode(frame: &[u8]) -> Result<Message, ProtoError> {
        let mut cursor = std::io::Cursor::new(frame);
        let value =
            rmpv::decode::read_value(&mut cursor).map_err(|e| ProtoError::Msgpack(e.to_string()))?;

        let entries = match value {
            Value::Map(entries) => entries,
            _ => return Err(ProtoError::NotAMap),
        };

        let mut fields: BTreeMap<String, Value> = BTreeMap::new();
        for (k, v) in entries {
            if let Some(key) = k.as_str() {
                fields.insert(key.to_string(), v);
            }
        }

        let version = fields
            .get("__version__")
            .and_then(|v| v.as_u64())
            .ok_or(ProtoError::MissingPduField("__version__"))? as u8;
        let msg_type = fields
            .get("msg_type")
            .and_then(|v| v.as_str())
            .ok_or(ProtoError::MissingPduField("msg_type"))?
            .to_string();

        if version != CURRENT_VERSION {
            return Err(ProtoError::UnsupportedVersion(version));
        }

        fields.remove("__version__");
        fields.remove("msg_type");

        let body = Self::decode_body(&msg_type, &mut fields)?;

        Ok(Message::with_cached_frame(version, body, Bytes::copy_from_slice(frame)))
    }

    fn decode_body(
        msg_type: &str,
        fields: &mut BTreeMap<String, Value>,
    ) -> Result<MessageBody, ProtoError> {
        fn take_str(
            fields: &mut BTreeMap<String, Value>,
            msg_type: &'static str,
            field: &'static str,
        ) -> Result<String, ProtoError> {
            fields
                .remove(field)
                .and_then(|v| v.as_str().map(|s| s.to_string()))
                .ok_or(ProtoError::MissingArgument { msg_type, field })
        }

        Ok(match msg_type {
            "notify" => {
                let app_name = take_str(fields, "notify", "app_name")?;
                let summary = take_str(fields, "notify", "summary")?;
                let body = take_str(fields, "notify", "body")?;
                let urgency = fields
                    .remove("urgency")
                    .and_then(|v| v.as_u64())
                    .map(|v| Urgency::try_from(v as u8))
                    .transpose()?
                    .unwrap_or_default();
                let category = fields
                    .remove("category")
                    .and_then(|v| v.as_str().map(|s| s.to_string()));
                let id = fields
                    .remove("id")
                    .and_then(|v| v.as_str().map(|s| s.to_string()));
                MessageBody::Notify {
                    app_name,
                    summary,
                    body,
                    urgency,
                    category,
                    id,
                }
            }
            "accepted" => MessageBody::Accepted {
                id: take_str(fields, "accepted", "id")?,
            },
            "subscribe" => MessageBody::Subscribe,
            "subscribed" => MessageBody::Subscribed,
            "goodbye" => MessageBody::Goodbye,
            "error" => MessageBody::Error {
                reason: take_str(fields, "error", "reason")?,
            },
            other => MessageBody::Unknown {
                msg_type: other.to_string(),
                args: std::mem::take(fields),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_notify() {
        let msg = Message::notify("chat", "hi", "there");
        let frame = msg.to_frame();
        let decoded = Message::decode(&frame).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn decode_then_reencode_is_byte_identical() {
        let msg = Message::notify("chat", "hi", "there").with_id("abc");
        let original = msg.to_frame();
        let decoded = Message::decode(&original).unwrap();
        assert_eq!(decoded.to_frame(), original);
    }

    #[test]
    fn default_elision_matches_explicit_default() {
        let implicit = Message::notify("a", "s", "b");
        let explicit = Message::notify("a", "s", "b").with_urgency(Urgency::Low);
        assert_eq!(implicit.to_frame(), explicit.to_frame());
    }

    #[test]
    fn unknown_required_field_rejected_on_decode() {
        let mut buf = Vec::new();
        let value = Value::Map(vec![
            (Value::from("__version__"), Value::from(0u8)),
            (Value::from("msg_type"), Value::from("notify")),
            (Value::from("app_name"), Value::from("x")),
            // missing summary/body
        ]);
        rmpv::encode::write_value(&mut buf, &value).unwrap();
        let err = Message::decode(&buf).unwrap_err();
        assert!(matches!(err, ProtoError::MissingArgument { .. }));
    }

    #[test]
    fn unsupported_version_rejected() {
        let mut buf = Vec::new();
        let value = Value::Map(vec![
            (Value::from("__version__"), Value::from(9u8)),
            (Value::from("msg_type"), Value::from("goodbye")),
        ]);
        rmpv::encode::write_value(&mut buf, &value).unwrap();
        assert!(matches!(
            Message::decode(&buf).unwrap_err(),
            ProtoError::UnsupportedVersion(9)
        ));
    }

    #[test]
    fn non_map_frame_rejected() {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &Value::Array(vec![Value::from(1)])).unwrap();
        assert!(matches!(Message::decode(&buf).unwrap_err(), ProtoError::NotAMap));
    }

    #[test]
    fn unknown_msg_type_decodes_successfully() {
        let mut buf = Vec::new();
        let value = Value::Map(vec![
            (Value::from("__version__"), Value::from(0u8)),
            (Value::from("msg_type"), Value::from("ping")),
            (Value::from("nonce"), Value::from(42)),
        ]);
        rmpv::encode::write_value(&mut buf, &value).unwrap();
        let msg = Message::decode(&buf).unwrap();
        assert!(!msg.known());
        assert_eq!(msg.msg_type(), "ping");
    }

    #[test]
    fn encode_for_version_respects_max_encode_version() {
        let msg = Message::notify("a", "s", "b");
        assert!(msg.encode_for_version(0).is_ok());
        assert!(msg.encode_for_version(1).is_ok());
        assert!(msg.encode_for_version(2).is_ok());
        assert!(msg.encode_for_version(3).is_err());
        assert!(msg.encode_for_version(4).is_err());
    }
}
