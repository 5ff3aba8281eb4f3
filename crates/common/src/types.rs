use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Durable queue fed by the lifecycle intake, drained by the worker.
pub const ATTACK_QUEUE: &str = "attack-events";

/// Durable queue fed by the interactive intake; holds message-edit
/// events that retract the removal button after a block is lifted.
pub const UPDATE_QUEUE: &str = "update-events";

/// Mitigation lifecycle action reported by the detection engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackAction {
    /// Full RTBH blackhole of the target IP
    Ban,
    /// Rule-based flowspec mitigation, narrower than a blackhole
    PartialBlock,
    /// Blackhole lifted
    Unban,
    /// Any action string this relay does not understand. Kept
    /// representable so the consumer can warn and skip instead of
    /// failing the decode.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for AttackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttackAction::Ban => write!(f, "ban"),
            AttackAction::PartialBlock => write!(f, "partial_block"),
            AttackAction::Unban => write!(f, "unban"),
            AttackAction::Unknown => write!(f, "unknown"),
        }
    }
}

/// A mitigation lifecycle event as pushed by the detection engine.
///
/// `attack_details` stays an open map: the detection engine version
/// decides which volumetric fields are present, and the composer renders
/// whatever arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackEvent {
    pub action: AttackAction,
    pub ip: String,
    #[serde(default)]
    pub attack_details: Map<String, Value>,
    /// Flowspec rules; populated for partial_block events only
    #[serde(default)]
    pub flow_spec_rules: Vec<Map<String, Value>>,
    /// Sampled packet capture lines, when the engine captured any
    #[serde(default)]
    pub packet_dump: Option<Vec<String>>,
}

impl AttackEvent {
    /// String-valued attack detail, if present.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.attack_details.get(key).and_then(Value::as_str)
    }

    /// The mitigation UUID assigned by the detection engine.
    pub fn attack_uuid(&self) -> Option<&str> {
        self.detail_str("attack_uuid")
    }
}

/// A message-edit event carrying Slack's own prior message so the worker
/// can edit it in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub channel_id: String,
    pub message_ts: String,
    pub message_blocks: Vec<Value>,
}

/// Stable identifier grouping a sequence of related lifecycle events
/// into one Slack conversation thread.
///
/// Bans and unbans share the engine-assigned attack UUID. Partial blocks
/// key on direction + IP instead, because one IP can have a blackhole
/// thread and a flowspec thread running concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey(String);

impl CorrelationKey {
    /// Derive the key for an event. `None` when the event lacks the
    /// identifying fields (the event then always starts a new thread and
    /// is never persisted).
    pub fn for_event(event: &AttackEvent) -> Option<Self> {
        match event.action {
            AttackAction::Ban | AttackAction::Unban => {
                event.attack_uuid().map(|uuid| Self(uuid.to_string()))
            }
            AttackAction::PartialBlock => {
                let direction = event.detail_str("attack_direction")?;
                Some(Self(format!("{direction}:{}", event.ip)))
            }
            AttackAction::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One rich attachment: rendered in a dedicated follow-up post because
/// Slack renders at most one attachment per call cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub fallback: String,
    pub blocks: Vec<Value>,
}

/// A composed chat message, ready for delivery.
///
/// Built once by the composer, consumed once by the notifier, never
/// persisted. `thread_ts: None` means a new top-level message; `Some`
/// means a reply in that thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub channel: String,
    pub username: String,
    pub icon_emoji: String,
    pub thread_ts: Option<String>,
    pub fallback: Option<String>,
    pub blocks: Vec<Value>,
    pub attachments: Vec<Attachment>,
}

impl MessagePayload {
    pub fn builder(channel: impl Into<String>, username: impl Into<String>) -> PayloadBuilder {
        PayloadBuilder {
            channel: channel.into(),
            username: username.into(),
            thread_ts: None,
            fallback: None,
            blocks: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

/// Builder separating payload composition (pure) from posting
/// (effectful). The built payload is not mutated afterwards.
#[derive(Debug)]
pub struct PayloadBuilder {
    channel: String,
    username: String,
    thread_ts: Option<String>,
    fallback: Option<String>,
    blocks: Vec<Value>,
    attachments: Vec<Attachment>,
}

impl PayloadBuilder {
    pub fn thread_ts(mut self, ts: Option<String>) -> Self {
        self.thread_ts = ts;
        self
    }

    pub fn fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    pub fn block(mut self, block: Value) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn build(self) -> MessagePayload {
        MessagePayload {
            channel: self.channel,
            username: self.username,
            icon_emoji: ":robot_face:".to_string(),
            thread_ts: self.thread_ts,
            fallback: self.fallback,
            blocks: self.blocks,
            attachments: self.attachments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(action: &str, ip: &str, details: Value) -> AttackEvent {
        serde_json::from_value(json!({
            "action": action,
            "ip": ip,
            "attack_details": details,
        }))
        .unwrap()
    }

    #[test]
    fn test_ban_key_is_attack_uuid() {
        let e = event("ban", "192.0.2.1", json!({"attack_uuid": "abc-123"}));
        let key = CorrelationKey::for_event(&e).unwrap();
        assert_eq!(key.as_str(), "abc-123");
    }

    #[test]
    fn test_unban_key_matches_ban_key() {
        let ban = event("ban", "192.0.2.1", json!({"attack_uuid": "abc-123"}));
        let unban = event("unban", "192.0.2.1", json!({"attack_uuid": "abc-123"}));
        assert_eq!(
            CorrelationKey::for_event(&ban),
            CorrelationKey::for_event(&unban)
        );
    }

    #[test]
    fn test_partial_block_key_is_direction_and_ip() {
        let e = event(
            "partial_block",
            "192.0.2.1",
            json!({"attack_uuid": "abc-123", "attack_direction": "incoming"}),
        );
        let key = CorrelationKey::for_event(&e).unwrap();
        assert_eq!(key.as_str(), "incoming:192.0.2.1");
    }

    #[test]
    fn test_partial_block_key_distinct_from_ban_key() {
        let details = json!({"attack_uuid": "abc-123", "attack_direction": "incoming"});
        let ban = event("ban", "192.0.2.1", details.clone());
        let partial = event("partial_block", "192.0.2.1", details);
        assert_ne!(
            CorrelationKey::for_event(&ban),
            CorrelationKey::for_event(&partial)
        );
    }

    #[test]
    fn test_unknown_action_decodes_without_error() {
        let e = event("frobnicate", "192.0.2.1", json!({}));
        assert_eq!(e.action, AttackAction::Unknown);
        assert!(CorrelationKey::for_event(&e).is_none());
    }

    #[test]
    fn test_event_decode_defaults_optional_fields() {
        let e: AttackEvent =
            serde_json::from_value(json!({"action": "ban", "ip": "192.0.2.1"})).unwrap();
        assert!(e.attack_details.is_empty());
        assert!(e.flow_spec_rules.is_empty());
        assert!(e.packet_dump.is_none());
    }

    #[test]
    fn test_event_decode_requires_action_and_ip() {
        let res: Result<AttackEvent, _> = serde_json::from_value(json!({"ip": "192.0.2.1"}));
        assert!(res.is_err());
        let res: Result<AttackEvent, _> = serde_json::from_value(json!({"action": "ban"}));
        assert!(res.is_err());
    }

    #[test]
    fn test_payload_builder() {
        let payload = MessagePayload::builder("#noc", "FastNetMon")
            .thread_ts(Some("123.456".to_string()))
            .fallback("summary")
            .block(json!({"type": "divider"}))
            .attachment(Attachment {
                fallback: "details".to_string(),
                blocks: vec![json!({"type": "divider"})],
            })
            .build();

        assert_eq!(payload.channel, "#noc");
        assert_eq!(payload.thread_ts.as_deref(), Some("123.456"));
        assert_eq!(payload.icon_emoji, ":robot_face:");
        assert_eq!(payload.blocks.len(), 1);
        assert_eq!(payload.attachments.len(), 1);
    }
}
