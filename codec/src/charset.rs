//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! SMS character sets.
//!
//! Two mappings are provided:
//!
//! - [`gsm`]: the GSM 03.38 7-bit default alphabet with its `0x1B` escape
//!   extension table, plus septet packing for PDU user data.
//! - [`ucs2`]: UTF-16 code units rendered as 4 uppercase hex digits, the text
//!   form modems expect after `AT+CSCS="UCS2"`.
//!
//! Both directions use the same pass-through policy: characters without a
//! table entry are carried verbatim instead of being dropped.

/// Character set selected on the modem with `AT+CSCS`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// GSM 03.38 default alphabet.
    #[default]
    Gsm,
    /// UCS2 hex text.
    Ucs2,
}

impl Encoding {
    /// Name passed to `AT+CSCS`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Gsm => "GSM",
            Encoding::Ucs2 => "UCS2",
        }
    }

    /// Data coding scheme passed as the last `AT+CSMP` parameter.
    pub fn data_coding_scheme(&self) -> u8 {
        match self {
            Encoding::Gsm => 0,
            Encoding::Ucs2 => 8,
        }
    }

    /// Renders text the way the modem expects it in this character set.
    ///
    /// GSM text is sent as-is, the modem performs the translation itself.
    pub fn encode_text(&self, text: &str) -> String {
        match self {
            Encoding::Gsm => text.to_string(),
            Encoding::Ucs2 => ucs2::encode(text),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GSM 03.38 default alphabet.
pub mod gsm {
    use std::collections::HashMap;
    use std::sync::LazyLock;

    /// Escape septet introducing a character from the extension table.
    pub const ESCAPE: u8 = 0x1B;

    /// Default alphabet indexed by septet. Slot `0x1B` is the escape and is
    /// never produced by a lookup.
    #[rustfmt::skip]
    pub const DEFAULT_ALPHABET: [char; 128] = [
        '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å',
        'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1B}', 'Æ', 'æ', 'ß', 'É',
        ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
        '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
        '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
        'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§',
        '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
        'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
    ];

    /// Extension table: characters sent as `ESCAPE` followed by the septet.
    pub const EXTENSION: [(u8, char); 10] = [
        (0x0A, '\u{0C}'),
        (0x14, '^'),
        (0x28, '{'),
        (0x29, '}'),
        (0x2F, '\\'),
        (0x3C, '['),
        (0x3D, '~'),
        (0x3E, ']'),
        (0x40, '|'),
        (0x65, '€'),
    ];

    static ENCODE: LazyLock<HashMap<char, Vec<u8>>> = LazyLock::new(|| {
        let mut table = HashMap::with_capacity(DEFAULT_ALPHABET.len() + EXTENSION.len());
        for (code, &ch) in DEFAULT_ALPHABET.iter().enumerate() {
            if code as u8 != ESCAPE {
                table.insert(ch, vec![code as u8]);
            }
        }
        for &(code, ch) in EXTENSION.iter() {
            table.insert(ch, vec![ESCAPE, code]);
        }
        table
    });

    fn extension_char(code: u8) -> Option<char> {
        EXTENSION
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, ch)| *ch)
    }

    /// Encodes text as one septet per byte.
    ///
    /// Characters outside both tables pass through as their UTF-8 bytes.
    pub fn encode(text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());
        for ch in text.chars() {
            match ENCODE.get(&ch) {
                Some(code) => out.extend_from_slice(code),
                None => {
                    let mut utf8 = [0u8; 4];
                    out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
                }
            }
        }
        out
    }

    /// Decodes one septet per byte.
    ///
    /// Escape pairs map through the extension table; an escape followed by an
    /// unassigned septet decodes as that septet's default character. Bytes
    /// outside the septet range are decoded back as UTF-8.
    pub fn decode(septets: &[u8]) -> String {
        let mut out = String::with_capacity(septets.len());
        let mut i = 0;
        while i < septets.len() {
            let byte = septets[i];
            if byte == ESCAPE {
                match septets.get(i + 1) {
                    Some(&next) if next < 0x80 => {
                        out.push(extension_char(next).unwrap_or(DEFAULT_ALPHABET[next as usize]));
                        i += 2;
                    }
                    _ => {
                        out.push('\u{1B}');
                        i += 1;
                    }
                }
            } else if byte < 0x80 {
                out.push(DEFAULT_ALPHABET[byte as usize]);
                i += 1;
            } else {
                let end = septets[i..]
                    .iter()
                    .position(|b| *b < 0x80)
                    .map_or(septets.len(), |n| i + n);
                out.push_str(&String::from_utf8_lossy(&septets[i..end]));
                i = end;
            }
        }
        out
    }

    /// Packs septets into octets, least significant bit first.
    pub fn pack(septets: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; (septets.len() * 7).div_ceil(8)];
        for (i, &septet) in septets.iter().enumerate() {
            let septet = septet & 0x7F;
            let bit = i * 7;
            let (index, shift) = (bit / 8, bit % 8);
            out[index] |= septet << shift;
            if shift > 1 {
                out[index + 1] |= septet >> (8 - shift);
            }
        }
        out
    }

    /// Unpacks `count` septets from packed octets.
    ///
    /// Stops early when the octets run out.
    pub fn unpack(octets: &[u8], count: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            let bit = i * 7;
            let (index, shift) = (bit / 8, bit % 8);
            let Some(&low) = octets.get(index) else {
                break;
            };
            let mut septet = low >> shift;
            if shift > 1 {
                match octets.get(index + 1) {
                    Some(&high) => septet |= high << (8 - shift),
                    None => break,
                }
            }
            out.push(septet & 0x7F);
        }
        out
    }
}

/// UCS2 hex text.
pub mod ucs2 {
    use crate::{AtCodecError, AtCodecResult};
    use std::fmt::Write;

    /// Encodes every UTF-16 code unit as 4 uppercase hex digits.
    pub fn encode(text: &str) -> String {
        let mut out = String::with_capacity(text.len() * 4);
        for unit in text.encode_utf16() {
            // Writing into a String cannot fail.
            let _ = write!(out, "{:04X}", unit);
        }
        out
    }

    /// Decodes 4-hex-digit UTF-16 code units back into text.
    pub fn decode(hex: &str) -> AtCodecResult<String> {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AtCodecError::Decoding {
                reason: format!("non-hex digit in UCS2 text {:?}", hex),
            });
        }
        if hex.len() % 4 != 0 {
            return Err(AtCodecError::Decoding {
                reason: format!("UCS2 text length {} is not a multiple of 4", hex.len()),
            });
        }
        let units = (0..hex.len())
            .step_by(4)
            .map(|i| u16::from_str_radix(&hex[i..i + 4], 16))
            .collect::<Result<Vec<u16>, _>>()
            .map_err(|e| AtCodecError::Decoding {
                reason: e.to_string(),
            })?;
        char::decode_utf16(units)
            .map(|unit| {
                unit.map_err(|e| AtCodecError::Decoding {
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}
