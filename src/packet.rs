use std::borrow::Cow;
use std::fmt;

use crate::error::ProtocolError;

/// Numeric packet type. `AUTH_RESPONSE` and `EXEC_COMMAND` share the value 2,
/// so the type only means something together with the direction of travel.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PacketType(i32);

impl PacketType {
    // SERVERDATA_AUTH
    pub const AUTH: PacketType = PacketType(3);
    // SERVERDATA_AUTH_RESPONSE
    pub const AUTH_RESPONSE: PacketType = PacketType(2);
    // SERVERDATA_EXECCOMMAND
    pub const EXEC_COMMAND: PacketType = PacketType(2);
    // SERVERDATA_RESPONSE_VALUE
    pub const RESPONSE_VALUE: PacketType = PacketType(0);

    pub const fn from_raw(value: i32) -> Self {
        PacketType(value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl fmt::Debug for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            3 => "AUTH",
            2 => "AUTH_RESPONSE|EXEC_COMMAND",
            0 => "RESPONSE_VALUE",
            _ => "UNKNOWN",
        };
        write!(f, "{}({})", name, self.0)
    }
}

/// Request id the server answers with when the password is wrong.
pub const AUTH_FAILED_ID: i32 = -1;

#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    id: i32,
    packet_type: PacketType,
    body: Vec<u8>,
}

impl Packet {
    /// id + type + the two trailing NULs.
    pub const BASE_PACKET_SIZE: i32 = 10;

    /// Largest body `pack` accepts without overflowing the size field.
    pub const MAX_BODY_SIZE: usize = (i32::MAX - Self::BASE_PACKET_SIZE) as usize;

    pub fn new(id: i32, packet_type: PacketType, body: impl Into<Vec<u8>>) -> Self {
        Packet {
            id,
            packet_type,
            body: body.into(),
        }
    }

    /// Parse a complete frame, size field included. The size field has to
    /// agree with the number of bytes actually handed over.
    pub fn unpack(incoming: &[u8]) -> Result<Self, ProtocolError> {
        let min_frame = 4 + Self::BASE_PACKET_SIZE as usize;
        if incoming.len() < min_frame {
            return Err(ProtocolError::TooShort(incoming.len()));
        }

        let size = read_i32(incoming, 0);
        let actual = incoming.len() - 4;
        if size < Self::BASE_PACKET_SIZE {
            return Err(ProtocolError::SizeOutOfBounds(size));
        }
        if size as usize != actual {
            return Err(ProtocolError::SizeMismatch {
                declared: size,
                actual,
            });
        }

        let id = read_i32(incoming, 4);
        let packet_type = PacketType(read_i32(incoming, 8));
        // whatever sits in the last two bytes is padding, we don't check it
        let body = incoming[12..incoming.len() - 2].to_vec();

        Ok(Packet {
            id,
            packet_type,
            body,
        })
    }

    // Since the only one of these values that can change in length is the body,
    // an easy way to calculate the size of a packet is to find the byte-length
    // of the packet body, then add 10 to it.
    pub fn size(&self) -> i32 {
        assert!(
            self.body.len() <= Self::MAX_BODY_SIZE,
            "rcon packet body of {} bytes does not fit the size field",
            self.body.len()
        );
        self.body.len() as i32 + Self::BASE_PACKET_SIZE
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text; invalid UTF-8 is replaced rather than rejected.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn pack(&self) -> Vec<u8> {
        // Size, ID, Type, Body, Terminator
        let size = self.size();
        let mut payload = Vec::<u8>::with_capacity(size as usize + 4);
        payload.extend_from_slice(&size.to_le_bytes());
        payload.extend_from_slice(&self.id.to_le_bytes());
        payload.extend_from_slice(&self.packet_type.to_le_bytes());
        payload.extend_from_slice(&self.body);
        // null terminate the body, then pad the packet with one more null
        payload.extend_from_slice(&[0u8, 0u8]);
        payload
    }
}

// Hand-written so an auth packet never prints the password.
impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("id", &self.id)
            .field("packet_type", &self.packet_type)
            .field("body_len", &self.body.len())
            .finish()
    }
}

fn read_i32(buf: &[u8], offset: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    i32::from_le_bytes(raw)
}
