//! Playfield tile-grid and level-table decoder.
//!
//! A parallel, structurally simpler binary format: the game program
//! ROM (136029.206) carries the level playfields as fixed-size records
//! with no branching and no vertex dereferencing. Tiles are the unit;
//! predefined 16-tile rows combine into chunks, chunks into chunk
//! lists, and a chunk list plus a handful of scalar fields makes a
//! level playfield.
//!
//! Unlike the mathbox side, this ROM is byte-addressed with big-endian
//! words, and the decoder window maps file offsets 0x2000..0x4000 to
//! addresses 0x4000..0x5FFF.
//!
//! # Table layout
//!
//! ```text
//! 0x4000  tile table: 64 entries of 2 bytes (indexed from 0x4010
//!         with signed offsets so the game can index backwards)
//! 0x436E  row table: 251 rows of 16 signed tile offsets
//! 0x531E  playfield info table: 26 entries
//! 0x5510  level pointer table: 52 words
//! 0x5884  bonus pyramid pointer table: 52 words (0 = none)
//! ```

use hashbrown::HashMap;
use thiserror::Error;

/// Size of the program ROM file in bytes.
pub const PROGRAM_ROM_SIZE: usize = 0x4000;

/// Base address of the level pointer table (52 levels).
pub const LEVEL_TABLE_ADDRESS: u16 = 0x5510;
/// Base address of the playfield info table.
pub const PLAYFIELD_INFO_ADDRESS: u16 = 0x531E;
/// Base address of the row template table (251 rows of 16 tiles).
pub const PLAYFIELD_ROW_TABLE: u16 = 0x436E;
/// Nominal base of the tile table; the game indexes it with signed
/// offsets so it can reach back to [`PLAYFIELD_TILE_TABLE_BASE`].
pub const PLAYFIELD_TILE_TABLE: u16 = 0x4010;
/// Real start of the 64-entry tile table.
pub const PLAYFIELD_TILE_TABLE_BASE: u16 = 0x4000;
/// Base address of the bonus pyramid pointer table.
pub const BONUS_PYRAMID_TABLE_ADDRESS: u16 = 0x5884;

/// Number of levels in the level pointer table.
pub const NUM_LEVELS: usize = 52;
/// Number of predefined row templates.
pub const NUM_ROW_TEMPLATES: usize = 251;
/// Number of tile table entries.
pub const NUM_TILES: usize = 64;
/// Tiles per row.
pub const ROW_COLUMNS: usize = 16;
/// Edge length of one tile in world units.
pub const TILE_SIZE: i32 = 128;

const ROM_WINDOW_BASE: u16 = 0x4000;
const ROM_WINDOW_SIZE: usize = 0x2000;

/// Word value terminating a chunk's row-index list.
const CHUNK_TERMINATOR: u16 = 0x0080;

/// Errors from playfield and level decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayfieldError {
    #[error("program ROM has wrong size (expected {expected} bytes, actual {actual})")]
    WrongRomSize { expected: usize, actual: usize },

    #[error("read outside program ROM window: {address:#06x}")]
    ReadOutOfRange { address: u16 },

    #[error("tile offset {offset} at {address:#06x} outside tile table")]
    BadTileOffset { address: u16, offset: i8 },

    #[error("row index {index} at {address:#06x} outside row table")]
    BadRowIndex { address: u16, index: u8 },

    #[error("chunk at {address:#06x} is empty")]
    EmptyChunk { address: u16 },

    #[error("chunk list at {address:#06x} is empty")]
    EmptyChunkList { address: u16 },
}

/// The game program ROM, exposing the byte window the playfield
/// tables live in.
#[derive(Debug)]
pub struct LevelRom {
    data: Box<[u8; ROM_WINDOW_SIZE]>,
}

impl LevelRom {
    /// Wrap a full program ROM image (0x4000 bytes); only the upper
    /// half holds playfield data.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PlayfieldError> {
        if bytes.len() != PROGRAM_ROM_SIZE {
            return Err(PlayfieldError::WrongRomSize {
                expected: PROGRAM_ROM_SIZE,
                actual: bytes.len(),
            });
        }
        let mut data = Box::new([0u8; ROM_WINDOW_SIZE]);
        data.copy_from_slice(&bytes[ROM_WINDOW_SIZE..]);
        Ok(Self { data })
    }

    /// Read one byte at a window address (0x4000..0x5FFF).
    pub fn byte(&self, address: u16) -> Result<u8, PlayfieldError> {
        address
            .checked_sub(ROM_WINDOW_BASE)
            .and_then(|offset| self.data.get(offset as usize))
            .copied()
            .ok_or(PlayfieldError::ReadOutOfRange { address })
    }

    /// Read one big-endian word.
    pub fn word(&self, address: u16) -> Result<u16, PlayfieldError> {
        let high = self.byte(address)?;
        let low = self.byte(address.wrapping_add(1))?;
        Ok(u16::from(high) << 8 | u16::from(low))
    }
}

/// What a tile is, from the low nibble of its second byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Empty = 0,
    Blue = 1,
    BlueJewel = 2,
    UpDown = 3,
    Bridge = 4,
    Red = 5,
    Black = 6,
    KillEye = 7,
    BlueSlope = 8,
    Destructible = 9,
    Green = 10,
    Blue11 = 11,
    Blue12 = 12,
    RedSlope = 13,
    Yellow = 14,
    Illegal = 15,
}

impl TileKind {
    fn from_bits(bits: u8) -> Self {
        match bits & 0xF {
            0 => Self::Empty,
            1 => Self::Blue,
            2 => Self::BlueJewel,
            3 => Self::UpDown,
            4 => Self::Bridge,
            5 => Self::Red,
            6 => Self::Black,
            7 => Self::KillEye,
            8 => Self::BlueSlope,
            9 => Self::Destructible,
            10 => Self::Green,
            11 => Self::Blue11,
            12 => Self::Blue12,
            13 => Self::RedSlope,
            14 => Self::Yellow,
            _ => Self::Illegal,
        }
    }

    /// One-character glyph for ASCII playfield dumps.
    pub fn glyph(self) -> char {
        match self {
            Self::Empty => ' ',
            kind => char::from_digit(kind as u32, 16)
                .unwrap_or('?')
                .to_ascii_uppercase(),
        }
    }
}

/// The basic playfield building block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// World-space height (signed height byte scaled by 4).
    pub height: i16,
    /// Whether the tile flashes.
    pub flash: bool,
    pub kind: TileKind,
}

impl Tile {
    fn decode(rom: &LevelRom, address: u16) -> Result<Self, PlayfieldError> {
        let height = i16::from(rom.byte(address)? as i8) * 4;
        let flags = rom.byte(address.wrapping_add(1))?;
        Ok(Self {
            height,
            flash: flags & 0x80 != 0,
            kind: TileKind::from_bits(flags),
        })
    }
}

/// The 64-entry tile table, addressable by the game's signed offsets.
struct TileSet {
    tiles: Vec<Tile>,
}

impl TileSet {
    fn decode(rom: &LevelRom) -> Result<Self, PlayfieldError> {
        let mut tiles = Vec::with_capacity(NUM_TILES);
        for n in 0..NUM_TILES as u16 {
            tiles.push(Tile::decode(rom, PLAYFIELD_TILE_TABLE_BASE + n * 2)?);
        }
        Ok(Self { tiles })
    }

    /// Resolve a signed byte offset relative to
    /// [`PLAYFIELD_TILE_TABLE`].
    fn at_offset(&self, address: u16, offset: i8) -> Result<Tile, PlayfieldError> {
        let index = i32::from(offset) / 2 + 8;
        usize::try_from(index)
            .ok()
            .and_then(|i| self.tiles.get(i))
            .copied()
            .ok_or(PlayfieldError::BadTileOffset { address, offset })
    }
}

/// The 251 predefined rows, resolved to tiles.
struct RowTable {
    rows: Vec<[Tile; ROW_COLUMNS]>,
}

impl RowTable {
    fn decode(rom: &LevelRom, tiles: &TileSet) -> Result<Self, PlayfieldError> {
        let mut rows = Vec::with_capacity(NUM_ROW_TEMPLATES);
        for n in 0..NUM_ROW_TEMPLATES as u16 {
            let base = PLAYFIELD_ROW_TABLE + n * ROW_COLUMNS as u16;
            let mut row = [Tile {
                height: 0,
                flash: false,
                kind: TileKind::Empty,
            }; ROW_COLUMNS];
            for (column, tile) in row.iter_mut().enumerate() {
                let address = base + column as u16;
                let offset = rom.byte(address)? as i8;
                *tile = tiles.at_offset(address, offset)?;
            }
            rows.push(row);
        }
        Ok(Self { rows })
    }

    /// Rows are 1-indexed in chunk data.
    fn get(&self, address: u16, index: u8) -> Result<&[Tile; ROW_COLUMNS], PlayfieldError> {
        if index == 0 {
            return Err(PlayfieldError::BadRowIndex { address, index });
        }
        self.rows
            .get(usize::from(index) - 1)
            .ok_or(PlayfieldError::BadRowIndex { address, index })
    }
}

/// A decoded tile grid: the rows of one chunk list, in chunk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playfield {
    /// Address of the chunk list this grid was assembled from.
    pub address: u16,
    rows: Vec<[Tile; ROW_COLUMNS]>,
}

impl Playfield {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        ROW_COLUMNS
    }

    /// World-space dimensions (columns x rows, in tile units).
    pub fn dimensions(&self) -> (i32, i32) {
        (
            self.num_columns() as i32 * TILE_SIZE,
            self.num_rows() as i32 * TILE_SIZE,
        )
    }

    pub fn tile(&self, row: usize, column: usize) -> Option<Tile> {
        self.rows.get(row)?.get(column).copied()
    }

    /// Rows in storage order (first chunk first).
    pub fn rows(&self) -> std::slice::Iter<'_, [Tile; ROW_COLUMNS]> {
        self.rows.iter()
    }
}

/// Bonus pyramid attached to some levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BonusPyramid {
    pub address: u16,
    pub playfield: Playfield,
    pub byte1: u8,
    pub byte2: u8,
}

/// One entry of the level table, fully decoded.
#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    /// 1-based level number; the two unused playfields carry -1.
    pub number: i32,
    pub address: u16,
    pub playfield: Playfield,
    pub rows_to_pyramid: u8,
    pub num_reds: u8,
    pub empty_rows_before_pyramid: u8,
    pub bonus_timer_secs: u8,
    pub flags: u8,
    pub best_time_secs: u8,
    pub bonus_pyramid: Option<BonusPyramid>,
}

/// Decoder over one program ROM, caching chunks and assembled
/// playfields by address (chunk lists are shared between levels).
pub struct PlayfieldDecoder<'a> {
    rom: &'a LevelRom,
    tiles: TileSet,
    rows: RowTable,
    chunks: HashMap<u16, Vec<u8>>,
    playfields: HashMap<u16, Playfield>,
}

impl<'a> PlayfieldDecoder<'a> {
    /// Decode the tile and row tables up front; chunk data is decoded
    /// on demand.
    pub fn new(rom: &'a LevelRom) -> Result<Self, PlayfieldError> {
        let tiles = TileSet::decode(rom)?;
        let rows = RowTable::decode(rom, &tiles)?;
        Ok(Self {
            rom,
            tiles,
            rows,
            chunks: HashMap::new(),
            playfields: HashMap::new(),
        })
    }

    /// Assemble the playfield for the chunk list at `address`.
    pub fn playfield(&mut self, address: u16) -> Result<Playfield, PlayfieldError> {
        if let Some(playfield) = self.playfields.get(&address) {
            return Ok(playfield.clone());
        }

        let chunk_addresses = self.chunk_list(address)?;
        let mut rows = Vec::new();
        for chunk_address in chunk_addresses {
            for index in self.chunk(chunk_address)? {
                rows.push(*self.rows.get(chunk_address, index)?);
            }
        }
        let playfield = Playfield { address, rows };
        self.playfields.insert(address, playfield.clone());
        Ok(playfield)
    }

    /// Decode one level-table entry.
    ///
    /// `info_override` substitutes the playfield info address for the
    /// two unused playfields that have no level-table entry of their
    /// own.
    pub fn level(
        &mut self,
        name: String,
        number: i32,
        address: u16,
        info_override: Option<u16>,
    ) -> Result<Level, PlayfieldError> {
        let info = match info_override {
            Some(address) => address,
            None => PLAYFIELD_INFO_ADDRESS + u16::from(self.rom.byte(address)?),
        };

        let playfield = self.playfield(self.rom.word(info)?)?;
        let rows_to_pyramid = self.rom.byte(info + 2)?;
        let num_reds = self.rom.byte(info + 3)?;
        let empty_rows_before_pyramid = self.rom.byte(info + 4)?;

        let bonus_timer_secs = self.rom.byte(address + 1)?;
        let flags = self.rom.byte(address + 4)?;
        let best_time_secs = self.rom.byte(address + 14)?;

        // the unused playfields have no pyramid table slot
        let bonus_pyramid = if number >= 1 {
            let slot = BONUS_PYRAMID_TABLE_ADDRESS + (number as u16 - 1) * 2;
            match self.rom.word(slot)? {
                0 => None,
                pyramid_address => Some(BonusPyramid {
                    address: pyramid_address,
                    playfield: self.playfield(self.rom.word(pyramid_address)?)?,
                    byte1: self.rom.byte(pyramid_address + 2)?,
                    byte2: self.rom.byte(pyramid_address + 3)?,
                }),
            }
        } else {
            None
        };

        Ok(Level {
            name,
            number,
            address,
            playfield,
            rows_to_pyramid,
            num_reds,
            empty_rows_before_pyramid,
            bonus_timer_secs,
            flags,
            best_time_secs,
            bonus_pyramid,
        })
    }

    /// Decode the full level table: 52 levels plus the two unused
    /// playfields left in the ROM.
    pub fn level_table(&mut self) -> Result<Vec<Level>, PlayfieldError> {
        let mut levels = Vec::with_capacity(NUM_LEVELS + 2);
        for n in 0..NUM_LEVELS as u16 {
            let address = self.rom.word(LEVEL_TABLE_ADDRESS + n * 2)?;
            let name = format!("Level {} @ {address:04X}", n + 1);
            levels.push(self.level(name, i32::from(n) + 1, address, None)?);
        }
        levels.push(self.level("Unused playfield @ 5323".into(), -1, 0x56C2, Some(0x5323))?);
        levels.push(self.level("Unused playfield @ 5378".into(), -1, 0x56C2, Some(0x5378))?);
        Ok(levels)
    }

    fn chunk_list(&mut self, address: u16) -> Result<Vec<u16>, PlayfieldError> {
        let mut chunks = Vec::new();
        let mut cursor = address;
        loop {
            let pointer = self.rom.word(cursor)?;
            if pointer == 0 {
                break;
            }
            chunks.push(pointer);
            cursor = cursor.wrapping_add(2);
        }
        if chunks.is_empty() {
            return Err(PlayfieldError::EmptyChunkList { address });
        }
        Ok(chunks)
    }

    fn chunk(&mut self, address: u16) -> Result<Vec<u8>, PlayfieldError> {
        if let Some(rows) = self.chunks.get(&address) {
            return Ok(rows.clone());
        }
        if self.rom.word(address)? == CHUNK_TERMINATOR {
            return Err(PlayfieldError::EmptyChunk { address });
        }

        let mut rows = Vec::new();
        let mut cursor = address;
        loop {
            let index = self.rom.byte(cursor)?;
            if index == 0 || usize::from(index) > NUM_ROW_TEMPLATES {
                return Err(PlayfieldError::BadRowIndex {
                    address: cursor,
                    index,
                });
            }
            rows.push(index);
            cursor = cursor.wrapping_add(1);
            if self.rom.word(cursor)? == CHUNK_TERMINATOR {
                break;
            }
        }
        self.chunks.insert(address, rows.clone());
        Ok(rows)
    }
}
