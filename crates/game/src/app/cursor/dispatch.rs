use engine::{Item, Vec2};
use tracing::{info, warn};

use super::collaborators::WorldStore;
use super::events::{CursorEvent, CursorEventBus};
use crate::app::net::{encode_size_prefixed, ClientPacket, DropItem, Transport, TransportError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DropAction {
    pub(crate) item: Item,
    pub(crate) position: Vec2,
}

/// Routes drop actions to the local world or to the remote authority.
pub(crate) struct ActionDispatcher {
    transport: Option<Box<dyn Transport>>,
}

impl ActionDispatcher {
    pub(crate) fn local() -> Self {
        Self { transport: None }
    }

    pub(crate) fn networked(transport: Box<dyn Transport>) -> Self {
        Self {
            transport: Some(transport),
        }
    }

    pub(crate) fn is_networked(&self) -> bool {
        self.transport.is_some()
    }

    pub(crate) fn dispatch_drop(
        &mut self,
        action: DropAction,
        world: &mut dyn WorldStore,
        events: &mut CursorEventBus,
    ) {
        let item_id = action.item.id;
        let Some(transport) = self.transport.as_mut() else {
            let entity_id = world.spawn_item(action.item, action.position);
            events.emit(CursorEvent::DropSpawnedLocally {
                item_id,
                entity_id,
                position: action.position,
            });
            info!(
                item_id = item_id.0,
                entity_id = entity_id.0,
                x = action.position.x,
                y = action.position.y,
                "drop_spawned_locally"
            );
            return;
        };

        let packet = ClientPacket::DropItem(DropItem { item_id: item_id.0 });
        match send_packet(transport.as_mut(), &packet) {
            Ok(()) => {
                events.emit(CursorEvent::DropSent { item_id });
                info!(item_id = item_id.0, "drop_sent");
            }
            Err(err) => {
                events.emit(CursorEvent::DropSendFailed { item_id });
                warn!(item_id = item_id.0, error = %err, "drop_send_failed");
            }
        }
    }

    /// Drains bytes the transport could not write on earlier frames.
    pub(crate) fn pump(&mut self) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        match transport.flush() {
            // Already reported when the connection dropped.
            Ok(()) | Err(TransportError::Disconnected) => {}
            Err(err) => warn!(error = %err, "transport_flush_failed"),
        }
    }
}

fn send_packet(transport: &mut dyn Transport, packet: &ClientPacket) -> Result<(), TransportError> {
    let frame = encode_size_prefixed(packet)?;
    transport.send(&frame)
}
