//! Constants for the DSP-1750 wire protocol

// Frame headers
pub const NORMAL_DATA_HEADER: [u8; 4] = [0xFE, 0x81, 0xFF, 0x55];
pub const BIT_DATA_HEADER: [u8; 4] = [0xFE, 0x81, 0x00, 0xAA];
pub const HEADER_SIZE: usize = 4;

// Frame sizes
pub const NORMAL_FRAME_SIZE: usize = 36; // HEADER(4) + GYRO(12) + ACCEL(12) + STATUS(1) + SEQ(1) + TEMP(2) + CRC(4)
pub const BIT_FRAME_SIZE: usize = 11; // HEADER(4) + RESULTS(6) + CHECKSUM(1)
pub const MAX_FRAME_SIZE: usize = NORMAL_FRAME_SIZE;

// Normal frame offsets
pub const OFFSET_GYRO_X: usize = 4;
pub const OFFSET_ACCEL_X: usize = 16;
pub const OFFSET_STATUS: usize = 28;
pub const OFFSET_SEQUENCE: usize = 29;
pub const OFFSET_TEMPERATURE: usize = 30;
pub const OFFSET_CRC: usize = 32;

// BIT frame offsets
pub const OFFSET_BIT_RESULTS: usize = 4;
pub const BIT_RESULT_COUNT: usize = 6;
pub const OFFSET_BIT_CHECKSUM: usize = 10;

// Status byte masks
pub const STATUS_GYRO_X: u8 = 0x01;
pub const STATUS_GYRO_Y: u8 = 0x02;
pub const STATUS_GYRO_Z: u8 = 0x04;
pub const STATUS_RESERVED_3: u8 = 0x08;
pub const STATUS_ACCEL_X: u8 = 0x10;
pub const STATUS_ACCEL_Y: u8 = 0x20;
pub const STATUS_ACCEL_Z: u8 = 0x40;
pub const STATUS_RESERVED_7: u8 = 0x80;
pub const STATUS_ALL_VALID: u8 = 0x77;

// BIT result byte reserved bit
pub const BIT_RESERVED: u8 = 0x80;

// CRC-32 parameters (MSB-first, no reflection, no final XOR)
pub const CRC_POLY: u32 = 0x04C1_1DB7;
pub const CRC_INIT: u32 = 0xFFFF_FFFF;

// Serial link
pub const BAUD_RATE: u32 = 921_600;

// ASCII commands
pub const CMD_CONFIG_ENTER: &[u8] = b"=config,1\n";
pub const CMD_CONFIG_LEAVE: &[u8] = b"=config,0\n";
pub const CMD_BUILT_IN_TEST: &[u8] = b"?bit\n";

// Physical constants
pub const STANDARD_GRAVITY: f64 = 9.806_65; // m/s² per g
