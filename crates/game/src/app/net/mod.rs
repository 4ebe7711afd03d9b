pub(crate) mod envelope;
pub(crate) mod transport;

pub(crate) use envelope::{encode_size_prefixed, ClientPacket, DropItem};
pub(crate) use transport::{
    TcpCommandTransport, Transport, TransportError, DEFAULT_OUTBOUND_CAP_BYTES,
};
