//! Message composer — pure translation from lifecycle events and
//! correlation state into Slack payloads.
//!
//! No network and no store writes happen here. The consumer performs the
//! thread lookup and hands the result in; persisting the handle happens
//! only after a successful post, in the consumer.

use chrono::Utc;
use chrono_tz::Tz;
use serde_json::{Map, Value, json};
use thiserror::Error;

use fnm_common::types::{Attachment, AttackAction, AttackEvent, MessagePayload, UpdateEvent};

/// Slack caps a section at 10 fields; the first section spends two on
/// the Key/Value headers, so data items chunk at eight per section.
const ITEMS_PER_SECTION: usize = 8;

/// The event's action string was not one this relay understands.
/// Warn-logged by the caller; never fatal.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("unrecognized event action")]
    UnrecognizedAction,
}

/// Composes chat payloads for one configured channel/identity.
pub struct MessageComposer {
    channel: String,
    username: String,
    timezone: Tz,
}

impl MessageComposer {
    pub fn new(channel: impl Into<String>, username: impl Into<String>, timezone: Tz) -> Self {
        Self {
            channel: channel.into(),
            username: username.into(),
            timezone,
        }
    }

    /// Compose the payload for a lifecycle event.
    ///
    /// `existing_thread` is the correlation-store lookup result for the
    /// event's key: `Some` turns the payload into a threaded reply,
    /// `None` into a new top-level post.
    pub fn compose_attack(
        &self,
        event: &AttackEvent,
        existing_thread: Option<String>,
    ) -> Result<MessagePayload, ComposeError> {
        match event.action {
            AttackAction::Ban | AttackAction::PartialBlock => {
                Ok(self.compose_mitigation(event, existing_thread))
            }
            AttackAction::Unban => Ok(self.compose_unban(event, existing_thread)),
            AttackAction::Unknown => Err(ComposeError::UnrecognizedAction),
        }
    }

    /// Ban and partial-block notifications: summary line, volumetric
    /// details attachment, flow rules (partial block only), packet
    /// capture sample.
    fn compose_mitigation(
        &self,
        event: &AttackEvent,
        existing_thread: Option<String>,
    ) -> MessagePayload {
        let protocol = event.detail_str("attack_protocol").unwrap_or("unknown");
        let direction = event.detail_str("attack_direction").unwrap_or("unknown");
        let severity = event.detail_str("attack_severity").unwrap_or("unknown");
        let attack_type = event.detail_str("attack_type").unwrap_or("unknown");
        let headline = match event.action {
            AttackAction::PartialBlock => "Flow Mitigation for IP",
            _ => "RTBH IP",
        };
        let description = format!(
            "*{headline} {ip}*: {protocol} {direction} with {severity} severity {attack_type} attack",
            ip = event.ip,
        );

        let mut builder = MessagePayload::builder(&self.channel, &self.username)
            .fallback(&description)
            .block(section(mrkdwn(&description)))
            .block(json!({"type": "divider"}));

        // The removal control goes only on the thread-opening post; a
        // threaded reply's origin message already carries a live button.
        if existing_thread.is_none()
            && let Some(uuid) = event.attack_uuid()
        {
            builder = builder.block(removal_actions_block(uuid));
        }

        let detail_sections = kv_sections(&event.attack_details);
        if !detail_sections.is_empty() {
            builder = builder.attachment(Attachment {
                fallback: "Summary of attack volumetric data".to_string(),
                blocks: detail_sections,
            });
        }

        if event.action == AttackAction::PartialBlock {
            for rule in &event.flow_spec_rules {
                let mut blocks = vec![section(mrkdwn("*Flow Rules for the block*"))];
                blocks.extend(kv_sections(rule));
                builder = builder.attachment(Attachment {
                    fallback: "Flow rules for the attack".to_string(),
                    blocks,
                });
            }
        }

        let capture = match &event.packet_dump {
            Some(lines) if !lines.is_empty() => format!("```{}```", lines.join("\n")),
            _ => "Not available".to_string(),
        };
        builder = builder.attachment(Attachment {
            fallback: "Packets in the capture".to_string(),
            blocks: vec![
                section(mrkdwn("*Packet Capture Sample*")),
                section(mrkdwn(&capture)),
            ],
        });

        builder.thread_ts(existing_thread).build()
    }

    /// Short "ban removed" line, threaded under the ban's record when
    /// one is live, posted top-level (orphaned) otherwise.
    fn compose_unban(&self, event: &AttackEvent, existing_thread: Option<String>) -> MessagePayload {
        let stamp = Utc::now()
            .with_timezone(&self.timezone)
            .format("%a %b %d %H:%M:%S %Z %Y");
        let text = format!("*Ban removed* for {} at {}", event.ip, stamp);

        MessagePayload::builder(&self.channel, &self.username)
            .fallback("Ban removed")
            .block(section(mrkdwn(&text)))
            .thread_ts(existing_thread)
            .build()
    }

    /// Edit for a previously posted message: drop every interactive
    /// actions block, keep everything else untouched. Used to retract
    /// the removal button once the block has been lifted.
    pub fn compose_update(&self, event: &UpdateEvent) -> Vec<Value> {
        event
            .message_blocks
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) != Some("actions"))
            .cloned()
            .collect()
    }
}

/// Scale a raw bits-per-second figure into the first unit where the
/// value drops below 1024, rendered to three decimal places.
pub fn format_bps(value: f64) -> String {
    const UNITS: [&str; 5] = ["bps", "Kbps", "Mbps", "Gbps", "Tbps"];

    let mut scaled = value;
    let mut unit = 0;
    while scaled >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    format!("{:.3} {}", scaled, UNITS[unit])
}

fn mrkdwn(text: &str) -> Value {
    json!({"type": "mrkdwn", "text": text})
}

fn plain_text(text: &str) -> Value {
    json!({"type": "plain_text", "text": text})
}

fn section(text: Value) -> Value {
    json!({"type": "section", "text": text})
}

fn removal_actions_block(uuid: &str) -> Value {
    json!({
        "type": "actions",
        "elements": [{
            "type": "button",
            "text": {"type": "plain_text", "text": "Remove block :lock:", "emoji": true},
            "value": uuid,
        }],
    })
}

/// Render one detail value for the key/value table.
///
/// Lists join with ", "; numeric fields whose key mentions traffic are
/// scaled to human byte-rate units; empty strings become a visible
/// placeholder.
fn render_detail_value(key: &str, value: &Value) -> String {
    let rendered = match value {
        Value::Number(n) if key.contains("traffic") => {
            return format_bps(n.as_f64().unwrap_or(0.0));
        }
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if rendered.is_empty() {
        "<not set>".to_string()
    } else {
        rendered
    }
}

/// Render a field map as Slack section blocks with a Key/Value header
/// row, chunked to stay under Slack's per-section field cap. Every pair
/// is kept, including a trailing partial chunk.
fn kv_sections(fields: &Map<String, Value>) -> Vec<Value> {
    let mut items = Vec::with_capacity(fields.len() * 2);
    for (key, value) in fields {
        items.push(plain_text(key));
        items.push(plain_text(&render_detail_value(key, value)));
    }

    let mut sections = Vec::new();
    for (i, chunk) in items.chunks(ITEMS_PER_SECTION).enumerate() {
        let mut section_fields = if i == 0 {
            vec![mrkdwn("*Key*"), mrkdwn("*Value*")]
        } else {
            Vec::new()
        };
        section_fields.extend(chunk.iter().cloned());
        sections.push(json!({"type": "section", "fields": section_fields}));
    }
    sections
}
