// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2018-2022 Andre Richter <andre.o.richter@gmail.com>

//! STM32 image header, version 2.0.
//! STM32MP13のboot ROMがFSBLの前に要求するheader
//!
//! The boot ROM of the STM32MP13 only starts a first stage boot loader that carries this header.
//! The image is unsigned: the signature, the public key and the version number stay zero, which
//! is what a device that is not closed accepts.
//!
//! ```text
//!   0x000  magic "STM2"
//!   0x004  ECDSA signature (64 bytes, zero)
//!   0x044  payload checksum (sum of all payload bytes)
//!   0x048  header version 2.0
//!   0x04C  payload length
//!   0x050  entry point
//!   0x058  load address
//!   0x064  extension flags (padding extension present)
//!   0x068  length of all extension headers
//!   0x06C  binary type
//!   0x080  padding extension: "ST\xFF\xFF", its length, zeros up to 0x200
//!   0x200  payload
//! ```

use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

const MAGIC: [u8; 4] = *b"STM2";
const VERSION_2_0: u32 = 0x0002_0000;

const PADDING_EXTENSION_PRESENT: u32 = 1 << 31;
const PADDING_EXTENSION_MAGIC: [u8; 4] = [b'S', b'T', 0xFF, 0xFF];

#[rustfmt::skip]
mod offset {
    pub const MAGIC:                    usize = 0x00;
    pub const CHECKSUM:                 usize = 0x44;
    pub const VERSION:                  usize = 0x48;
    pub const IMAGE_LENGTH:             usize = 0x4C;
    pub const ENTRY_POINT:              usize = 0x50;
    pub const LOAD_ADDRESS:             usize = 0x58;
    pub const EXTENSION_FLAGS:          usize = 0x64;
    pub const EXTENSION_HEADERS_LENGTH: usize = 0x68;
    pub const BINARY_TYPE:              usize = 0x6C;
    pub const EXTENSION_TYPE:           usize = 0x80;
    pub const EXTENSION_LENGTH:         usize = 0x84;
}

const EXTENSION_HEADERS_LENGTH: u32 = (HEADER_SIZE - offset::EXTENSION_TYPE) as u32;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Size of the header, and offset of the payload in a wrapped image.
pub const HEADER_SIZE: usize = 0x200;

/// The fields of the header that describe the payload.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Header {
    pub checksum: u32,
    pub image_length: u32,
    pub entry_point: u32,
    pub load_address: u32,
    pub binary_type: u32,
}

/// Why an image was rejected.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum HeaderError {
    #[error("image of {0} bytes is shorter than the STM32 header")]
    TooShort(usize),

    #[error("no STM32 header, magic is {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("unsupported STM32 header version {0:#010x}")]
    UnsupportedVersion(u32),

    #[error("header announces {announced} payload bytes, the image has {present}")]
    Truncated { announced: usize, present: usize },

    #[error("stored checksum {stored:#010x} does not match the payload checksum {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("payload of {0} bytes does not fit the 32 bit length field")]
    PayloadTooLarge(usize),
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);

    u32::from_le_bytes(word)
}

fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// The checksum the boot ROM verifies: the byte sum of the payload, wrapping at 32 bit.
pub fn checksum(payload: &[u8]) -> u32 {
    payload
        .iter()
        .fold(0_u32, |sum, byte| sum.wrapping_add(u32::from(*byte)))
}

impl Header {
    /// Describe `payload`.
    pub fn for_payload(
        payload: &[u8],
        load_address: u32,
        entry_point: u32,
        binary_type: u32,
    ) -> Result<Self, HeaderError> {
        let image_length =
            u32::try_from(payload.len()).map_err(|_| HeaderError::PayloadTooLarge(payload.len()))?;

        Ok(Self {
            checksum: checksum(payload),
            image_length,
            entry_point,
            load_address,
            binary_type,
        })
    }

    /// The header as it is stored in front of the payload.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0; HEADER_SIZE];

        bytes[offset::MAGIC..offset::MAGIC + 4].copy_from_slice(&MAGIC);
        write_u32(&mut bytes, offset::CHECKSUM, self.checksum);
        write_u32(&mut bytes, offset::VERSION, VERSION_2_0);
        write_u32(&mut bytes, offset::IMAGE_LENGTH, self.image_length);
        write_u32(&mut bytes, offset::ENTRY_POINT, self.entry_point);
        write_u32(&mut bytes, offset::LOAD_ADDRESS, self.load_address);
        write_u32(&mut bytes, offset::EXTENSION_FLAGS, PADDING_EXTENSION_PRESENT);
        write_u32(
            &mut bytes,
            offset::EXTENSION_HEADERS_LENGTH,
            EXTENSION_HEADERS_LENGTH,
        );
        write_u32(&mut bytes, offset::BINARY_TYPE, self.binary_type);

        bytes[offset::EXTENSION_TYPE..offset::EXTENSION_TYPE + 4]
            .copy_from_slice(&PADDING_EXTENSION_MAGIC);
        write_u32(
            &mut bytes,
            offset::EXTENSION_LENGTH,
            EXTENSION_HEADERS_LENGTH,
        );

        bytes
    }

    /// Read and verify the header of a wrapped image.
    pub fn parse(image: &[u8]) -> Result<Self, HeaderError> {
        if image.len() < HEADER_SIZE {
            return Err(HeaderError::TooShort(image.len()));
        }

        let mut magic = [0; 4];
        magic.copy_from_slice(&image[offset::MAGIC..offset::MAGIC + 4]);
        if magic != MAGIC {
            return Err(HeaderError::BadMagic(magic));
        }

        // Major version in the third byte; the minor version may grow.
        let version = read_u32(image, offset::VERSION);
        if version >> 16 != VERSION_2_0 >> 16 {
            return Err(HeaderError::UnsupportedVersion(version));
        }

        let header = Self {
            checksum: read_u32(image, offset::CHECKSUM),
            image_length: read_u32(image, offset::IMAGE_LENGTH),
            entry_point: read_u32(image, offset::ENTRY_POINT),
            load_address: read_u32(image, offset::LOAD_ADDRESS),
            binary_type: read_u32(image, offset::BINARY_TYPE),
        };

        let payload = &image[HEADER_SIZE..];
        let announced = header.image_length as usize;
        if announced > payload.len() {
            return Err(HeaderError::Truncated {
                announced,
                present: payload.len(),
            });
        }

        let computed = checksum(&payload[..announced]);
        if computed != header.checksum {
            return Err(HeaderError::ChecksumMismatch {
                stored: header.checksum,
                computed,
            });
        }

        Ok(header)
    }
}

/// Put a header in front of `payload`.
pub fn wrap(
    payload: &[u8],
    load_address: u32,
    entry_point: u32,
    binary_type: u32,
) -> Result<Vec<u8>, HeaderError> {
    let header = Header::for_payload(payload, load_address, entry_point, binary_type)?;

    let mut image = Vec::with_capacity(HEADER_SIZE + payload.len());
    image.extend_from_slice(&header.to_bytes());
    image.extend_from_slice(payload);

    Ok(image)
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SYSRAM: u32 = 0x2FFE_0000;

    #[test]
    fn checksum_is_the_wrapping_byte_sum() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[1, 2, 3, 0xFF]), 261);

        let large = vec![0xFF_u8; 0x0101_0102];
        assert_eq!(
            checksum(&large),
            (0x0101_0102_u64 * 0xFF % (1 << 32)) as u32
        );
    }

    #[test]
    fn header_fields_land_at_their_offsets() {
        let payload = [0xE5_u8, 0x9F, 0xF0, 0x18];
        let image = wrap(&payload, SYSRAM, SYSRAM + 0x20, 0x10).unwrap();

        assert_eq!(image.len(), HEADER_SIZE + payload.len());
        assert_eq!(&image[0x00..0x04], b"STM2");
        assert!(image[0x04..0x44].iter().all(|byte| *byte == 0));
        assert_eq!(read_u32(&image, 0x44), checksum(&payload));
        assert_eq!(&image[0x48..0x4C], &[0x00, 0x00, 0x02, 0x00]);
        assert_eq!(read_u32(&image, 0x4C), 4);
        assert_eq!(read_u32(&image, 0x50), SYSRAM + 0x20);
        assert_eq!(read_u32(&image, 0x58), SYSRAM);
        assert_eq!(read_u32(&image, 0x64), 0x8000_0000);
        assert_eq!(read_u32(&image, 0x68), 0x180);
        assert_eq!(read_u32(&image, 0x6C), 0x10);
        assert_eq!(&image[0x80..0x84], &[b'S', b'T', 0xFF, 0xFF]);
        assert_eq!(read_u32(&image, 0x84), 0x180);
        assert_eq!(&image[HEADER_SIZE..], &payload);
    }

    #[test]
    fn wrapped_image_parses_back() {
        let payload: Vec<u8> = (0..=255).collect();
        let image = wrap(&payload, SYSRAM, SYSRAM, 0x10).unwrap();

        let header = Header::parse(&image).unwrap();

        assert_eq!(
            header,
            Header::for_payload(&payload, SYSRAM, SYSRAM, 0x10).unwrap()
        );
    }

    #[test]
    fn corrupted_payload_is_rejected() {
        let mut image = wrap(&[1, 2, 3, 4], SYSRAM, SYSRAM, 0x10).unwrap();
        image[HEADER_SIZE + 2] ^= 0x40;

        assert!(matches!(
            Header::parse(&image),
            Err(HeaderError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn raw_binary_is_rejected() {
        let raw = [0xE5_u8; HEADER_SIZE + 16];

        assert_eq!(
            Header::parse(&raw),
            Err(HeaderError::BadMagic([0xE5; 4]))
        );
        assert_eq!(
            Header::parse(&raw[..16]),
            Err(HeaderError::TooShort(16))
        );
    }

    #[test]
    fn truncated_image_is_rejected() {
        let image = wrap(&[7; 64], SYSRAM, SYSRAM, 0x10).unwrap();

        assert_eq!(
            Header::parse(&image[..HEADER_SIZE + 10]),
            Err(HeaderError::Truncated {
                announced: 64,
                present: 10
            })
        );
    }

    #[test]
    fn other_major_version_is_rejected() {
        let mut image = wrap(&[1], SYSRAM, SYSRAM, 0x10).unwrap();
        image[0x4A] = 1;

        assert_eq!(
            Header::parse(&image),
            Err(HeaderError::UnsupportedVersion(0x0001_0000))
        );
    }
}
