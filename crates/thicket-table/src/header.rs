//! Table file header (64 bytes).
//!
//! Layout:
//! - 0-19: identity and sizes (magic, version, checksum, total_size, body_size)
//! - 20-43: counts (symbols, fields, aliases, tokens, externals as u16;
//!   states, productions, lex modes, action lists as u32)
//! - 44-63: reserved

/// Magic bytes at the start of every table.
pub const MAGIC: [u8; 4] = *b"TSKT";

/// Table format version. Bump on any change to the body layout.
pub const VERSION: u32 = 1;

pub const HEADER_SIZE: usize = 64;

/// File header, the first 64 bytes of a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C, align(64))]
pub struct Header {
    /// Magic bytes: b"TSKT"
    pub magic: [u8; 4],
    pub version: u32,
    /// CRC32 checksum of everything after the header
    pub checksum: u32,
    /// Total file size in bytes
    pub total_size: u32,
    pub body_size: u32,

    pub symbol_count: u16,
    pub field_count: u16,
    pub alias_count: u16,
    pub token_count: u16,
    pub external_count: u16,
    pub _pad: u16,
    pub state_count: u32,
    pub production_count: u32,
    pub lex_mode_count: u32,
    pub action_list_count: u32,

    pub _reserved: [u8; 16],
}

const _: () = assert!(std::mem::size_of::<Header>() == HEADER_SIZE);

impl Default for Header {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            checksum: 0,
            total_size: 0,
            body_size: 0,
            symbol_count: 0,
            field_count: 0,
            alias_count: 0,
            token_count: 0,
            external_count: 0,
            _pad: 0,
            state_count: 0,
            production_count: 0,
            lex_mode_count: 0,
            action_list_count: 0,
            _reserved: [0; 16],
        }
    }
}

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

impl Header {
    /// Decode header from its 64-byte encoding.
    ///
    /// Returns `None` if fewer than 64 bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE {
            return None;
        }

        let mut reserved = [0u8; 16];
        reserved.copy_from_slice(&bytes[48..64]);

        Some(Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: u32_at(bytes, 4),
            checksum: u32_at(bytes, 8),
            total_size: u32_at(bytes, 12),
            body_size: u32_at(bytes, 16),
            symbol_count: u16_at(bytes, 20),
            field_count: u16_at(bytes, 22),
            alias_count: u16_at(bytes, 24),
            token_count: u16_at(bytes, 26),
            external_count: u16_at(bytes, 28),
            _pad: u16_at(bytes, 30),
            state_count: u32_at(bytes, 32),
            production_count: u32_at(bytes, 36),
            lex_mode_count: u32_at(bytes, 40),
            action_list_count: u32_at(bytes, 44),
            _reserved: reserved,
        })
    }

    /// Encode header to 64 bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.total_size.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.body_size.to_le_bytes());
        bytes[20..22].copy_from_slice(&self.symbol_count.to_le_bytes());
        bytes[22..24].copy_from_slice(&self.field_count.to_le_bytes());
        bytes[24..26].copy_from_slice(&self.alias_count.to_le_bytes());
        bytes[26..28].copy_from_slice(&self.token_count.to_le_bytes());
        bytes[28..30].copy_from_slice(&self.external_count.to_le_bytes());
        bytes[30..32].copy_from_slice(&self._pad.to_le_bytes());
        bytes[32..36].copy_from_slice(&self.state_count.to_le_bytes());
        bytes[36..40].copy_from_slice(&self.production_count.to_le_bytes());
        bytes[40..44].copy_from_slice(&self.lex_mode_count.to_le_bytes());
        bytes[44..48].copy_from_slice(&self.action_list_count.to_le_bytes());
        bytes[48..64].copy_from_slice(&self._reserved);
        bytes
    }

    pub fn validate_magic(&self) -> bool {
        self.magic == MAGIC
    }

    pub fn validate_version(&self) -> bool {
        self.version == VERSION
    }
}
