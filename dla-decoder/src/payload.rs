//! Struct-format payload decoding
//!
//! CAN payloads arrive as comma-separated byte tokens (`"00,00,80,3F"`) in wire
//! order. A schema's format string describes how to slice them into values, one
//! directive character at a time:
//!
//! | code  | bytes     | value                                              |
//! |-------|-----------|----------------------------------------------------|
//! | `B`   | 1         | unsigned 8-bit, hex byte                           |
//! | `H`   | 2         | unsigned 16-bit, little-endian                     |
//! | `f`   | 4         | IEEE-754 single, little-endian                     |
//! | `s`   | count + 1 | string; each token read as a *decimal* char code   |
//! | `x`   | count + 1 | padding, no value                                  |
//! | digit | 0         | sets count for the next directive                  |
//!
//! Any other character is ignored without consuming bytes.

use crate::types::{DecoderError, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Stateless decoder for the struct-format mini-language
pub struct PayloadDecoder;

impl PayloadDecoder {
    /// Decode byte tokens according to a format string
    ///
    /// Returns one string per value-producing directive, in format order.
    /// Running out of tokens or hitting a token that is not a number fails the
    /// whole payload; partial results are never returned.
    ///
    /// # Example
    /// ```
    /// use dla_decoder::PayloadDecoder;
    ///
    /// let values = PayloadDecoder::decode(&["00", "00", "80", "3F"], "f").unwrap();
    /// assert_eq!(values, vec!["1.0"]);
    /// ```
    pub fn decode(tokens: &[&str], format: &str) -> Result<Vec<String>> {
        let mut values = Vec::new();
        let mut cursor = Cursor::new(tokens);
        let mut count: usize = 0;

        for directive in format.chars() {
            match directive {
                'B' => {
                    let bytes = cursor.hex_bytes(1)?;
                    values.push(bytes[0].to_string());
                }
                'H' => {
                    let bytes = cursor.hex_bytes(2)?;
                    values.push(LittleEndian::read_u16(&bytes).to_string());
                }
                'f' => {
                    let bytes = cursor.hex_bytes(4)?;
                    values.push(format!("{:?}", LittleEndian::read_f32(&bytes)));
                }
                's' => {
                    let text: String = cursor
                        .decimal_bytes(count.saturating_add(1))?
                        .into_iter()
                        .map(char::from)
                        .collect();
                    values.push(text);
                }
                'x' => {
                    cursor.skip(count.saturating_add(1))?;
                }
                '0'..='9' => {
                    let digit = directive as usize - '0' as usize;
                    count = count.saturating_mul(10).saturating_add(digit);
                    continue;
                }
                other => {
                    log::trace!("Ignoring format directive {:?}", other);
                    continue;
                }
            }
            count = 0;
        }

        Ok(values)
    }
}

/// Running position in the payload tokens
struct Cursor<'a> {
    tokens: &'a [&'a str],
    index: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [&'a str]) -> Self {
        Self { tokens, index: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [&'a str]> {
        let end = self.index.saturating_add(n);
        if end > self.tokens.len() {
            return Err(DecoderError::PayloadDecode(format!(
                "need {} bytes at offset {} but payload has {}",
                n,
                self.index,
                self.tokens.len()
            )));
        }
        let window = &self.tokens[self.index..end];
        self.index = end;
        Ok(window)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    fn hex_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.take(n)?
            .iter()
            .map(|token| {
                u8::from_str_radix(token, 16).map_err(|e| {
                    DecoderError::PayloadDecode(format!("byte {:?} is not hex: {}", token, e))
                })
            })
            .collect()
    }

    fn decimal_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.take(n)?
            .iter()
            .map(|token| {
                token.parse::<u8>().map_err(|e| {
                    DecoderError::PayloadDecode(format!(
                        "character code {:?} is not decimal: {}",
                        token, e
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_byte() {
        assert_eq!(PayloadDecoder::decode(&["EC"], "B").unwrap(), vec!["236"]);
    }

    #[test]
    fn test_u16_is_little_endian() {
        let values = PayloadDecoder::decode(&["34", "12"], "H").unwrap();
        assert_eq!(values, vec!["4660"]); // 0x1234
    }

    #[test]
    fn test_float_is_little_endian() {
        let values = PayloadDecoder::decode(&["00", "00", "80", "3F"], "f").unwrap();
        assert_eq!(values, vec!["1.0"]);

        // 0x43010560 reassembled from reversed wire order
        let values = PayloadDecoder::decode(&["60", "05", "01", "43"], "f").unwrap();
        assert_eq!(values[0].parse::<f32>().unwrap(), f32::from_bits(0x4301_0560));
    }

    #[test]
    fn test_mixed_format_consumes_in_order() {
        let tokens = ["01", "02", "03", "00", "00", "20", "41"];
        let values = PayloadDecoder::decode(&tokens, "BHf").unwrap();
        assert_eq!(values, vec!["1", "770", "10.0"]);
    }

    #[test]
    fn test_string_reads_decimal_codes() {
        // count 2 consumes three tokens
        let values = PayloadDecoder::decode(&["72", "105", "33"], "2s").unwrap();
        assert_eq!(values, vec!["Hi!"]);

        // without a count, one token
        let values = PayloadDecoder::decode(&["65"], "s").unwrap();
        assert_eq!(values, vec!["A"]);
    }

    #[test]
    fn test_padding_skips_bytes() {
        let values = PayloadDecoder::decode(&["FF", "FF", "FF", "07"], "2xB").unwrap();
        assert_eq!(values, vec!["7"]);

        let values = PayloadDecoder::decode(&["FF", "07"], "xB").unwrap();
        assert_eq!(values, vec!["7"]);
    }

    #[test]
    fn test_count_is_cleared_after_use() {
        let values = PayloadDecoder::decode(&["00", "00", "01", "02"], "1xBB").unwrap();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    fn test_unknown_directives_are_ignored() {
        let values = PayloadDecoder::decode(&["34", "12", "05"], "<H?B").unwrap();
        assert_eq!(values, vec!["4660", "5"]);
    }

    #[test]
    fn test_running_out_of_tokens() {
        let result = PayloadDecoder::decode(&["00", "00", "80"], "f");
        assert!(matches!(result, Err(DecoderError::PayloadDecode(_))));

        let result = PayloadDecoder::decode(&["00"], "BB");
        assert!(matches!(result, Err(DecoderError::PayloadDecode(_))));
    }

    #[test]
    fn test_non_numeric_tokens() {
        assert!(PayloadDecoder::decode(&["ZZ"], "B").is_err());
        // hex is not accepted where decimal character codes are expected
        assert!(PayloadDecoder::decode(&["4A"], "s").is_err());
    }

    #[test]
    fn test_decode_is_deterministic() {
        let tokens = ["10", "27", "00", "00", "C8", "42", "09"];
        let first = PayloadDecoder::decode(&tokens, "Hf B").unwrap();
        let second = PayloadDecoder::decode(&tokens, "Hf B").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, vec!["10000", "100.0", "9"]);
    }

    #[test]
    fn test_empty_format() {
        assert!(PayloadDecoder::decode(&["01"], "").unwrap().is_empty());
    }
}
