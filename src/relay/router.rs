//! Message Router
//!
//! Routes one inbound frame from an open connection:
//! - malformed frame: `error` back to the sender, connection stays open
//! - `ping`: `pong` back to the sender
//! - `reset`: `reset` to every `users` subscriber
//! - `pick_number`: the payload, untouched, to every other `users` subscriber
//! - any other `type`: ignored

use tracing::{debug, warn};

use crate::broker::TopicName;
use crate::message::{FrameError, INVALID_FORMAT_MESSAGE, InboundEvent, OutboundEvent};
use crate::relay::Relay;

impl Relay {
    pub fn handle_text(&self, sender: &str, text: &str) {
        self.route(sender, InboundEvent::parse(text));
    }

    pub fn handle_bytes(&self, sender: &str, bytes: &[u8]) {
        self.route(sender, InboundEvent::parse_bytes(bytes));
    }

    fn route(&self, sender: &str, frame: Result<InboundEvent, FrameError>) {
        if !self.registry.contains(sender) {
            debug!(connection_id = sender, "frame from closed connection dropped");
            return;
        }

        let event = match frame {
            Ok(event) => event,
            Err(e) => {
                warn!(connection_id = sender, error = %e, "invalid client message");
                self.reply(sender, &OutboundEvent::error(INVALID_FORMAT_MESSAGE));
                return;
            }
        };

        match event {
            InboundEvent::Ping => self.reply(sender, &OutboundEvent::Pong),
            InboundEvent::Reset => {
                self.broker
                    .publish(&self.registry, TopicName::Users, &OutboundEvent::Reset, None);
            }
            InboundEvent::PickNumber { data } => {
                self.broker.publish(
                    &self.registry,
                    TopicName::Users,
                    &OutboundEvent::PickNumber { data },
                    Some(sender),
                );
            }
            InboundEvent::Unknown(kind) => {
                debug!(connection_id = sender, %kind, "ignoring unknown message type");
            }
        }
    }

    fn reply(&self, sender: &str, event: &OutboundEvent) {
        if let Err(e) = self.broker.send_direct(&self.registry, sender, event) {
            warn!(connection_id = sender, error = %e, "failed to reply");
        }
    }
}
