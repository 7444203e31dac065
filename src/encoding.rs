//! Encoding detection and strict decoding / 编码检测与解码
//!
//! Two separate steps: [`detect`] guesses an encoding from a byte prefix, [`decode`]
//! turns the full buffer into text and fails on any malformed sequence instead of
//! inserting replacement characters.

use encoding_rs::{Encoding, BIG5, EUC_KR, GB18030, SHIFT_JIS, UTF_8, WINDOWS_1252};

use crate::error::DecodeError;

/// Legacy encodings tried when the input is not UTF-8. A later candidate has to
/// score strictly higher to replace an earlier one, so narrower repertoires come first.
const LEGACY_CANDIDATES: [&Encoding; 5] = [EUC_KR, SHIFT_JIS, GB18030, BIG5, WINDOWS_1252];

/// Below this plausibility a legacy guess is rejected / 低于该值视为无法识别
const MIN_CONFIDENCE: f32 = 0.6;

/// Single-byte text is mostly ASCII; above this non-ASCII share the guess is dropped
const MAX_SINGLE_BYTE_SHARE: f32 = 0.3;

/// Detection result / 检测结果
#[derive(Debug, Clone, Copy)]
pub struct Detection {
    pub encoding: &'static Encoding,
    /// 0.0..=1.0, informational only
    pub confidence: f32,
}

impl Detection {
    pub fn label(&self) -> &'static str {
        self.encoding.name()
    }
}

/// Guess the encoding of a (possibly truncated) byte prefix / 猜测编码
pub fn detect(bytes: &[u8]) -> Option<Detection> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Some(Detection {
            encoding,
            confidence: 1.0,
        });
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => {
            return Some(Detection {
                encoding: UTF_8,
                confidence: if text.is_ascii() { 1.0 } else { 0.99 },
            })
        }
        // 前缀在多字节字符中间被截断
        Err(e) if e.error_len().is_none() => {
            return Some(Detection {
                encoding: UTF_8,
                confidence: 0.99,
            })
        }
        Err(_) => {}
    }

    let mut best: Option<Detection> = None;
    for encoding in LEGACY_CANDIDATES {
        let Some(text) = decode_prefix(encoding, bytes) else {
            continue;
        };
        let confidence = plausibility(encoding, &text);
        tracing::trace!("Encoding candidate {}: {:.3}", encoding.name(), confidence);
        // strict comparison keeps the earlier candidate on ties
        if best.map_or(true, |b| confidence > b.confidence) {
            best = Some(Detection {
                encoding,
                confidence,
            });
        }
    }

    best.filter(|d| d.confidence >= MIN_CONFIDENCE)
}

/// Decode the whole buffer, failing on malformed input / 严格解码
pub fn decode(bytes: &[u8], detection: Option<Detection>) -> Result<String, DecodeError> {
    let encoding = detection.ok_or(DecodeError::Undetected)?.encoding;

    let body = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
        _ => bytes,
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or(DecodeError::Malformed {
            encoding: encoding.name(),
        })
}

/// Decode a prefix that may end inside a multi-byte sequence (up to 4 bytes for GB18030)
fn decode_prefix(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    (0..=3usize)
        .filter(|cut| *cut <= bytes.len())
        .find_map(|cut| {
            encoding
                .decode_without_bom_handling_and_without_replacement(&bytes[..bytes.len() - cut])
                .map(|text| text.into_owned())
        })
}

/// Weighted share of non-ASCII characters that are common in `encoding`'s own script / 可信度
fn plausibility(encoding: &'static Encoding, text: &str) -> f32 {
    let mut total = 0usize;
    let mut scored = 0usize;
    let mut weight = 0.0f32;
    for c in text.chars() {
        total += 1;
        if c.is_ascii_graphic() || matches!(c, ' ' | '\t' | '\r' | '\n') {
            continue;
        }
        scored += 1;
        weight += char_weight(encoding, c);
    }

    if scored == 0 {
        return 1.0;
    }
    if encoding == WINDOWS_1252 && scored as f32 > total as f32 * MAX_SINGLE_BYTE_SHARE {
        return 0.0;
    }
    weight / scored as f32
}

/// How typical `c` is for text written in `encoding` (0.0..=1.0)
fn char_weight(encoding: &'static Encoding, c: char) -> f32 {
    let single_byte = encoding == WINDOWS_1252;
    match c {
        // Hangul syllables, only the KS X 1001 set is common
        '\u{ac00}'..='\u{d7af}' if encoding == EUC_KR => match encode_pair(encoding, c) {
            Some((lead, trail)) if lead >= 0xA1 && trail >= 0xA1 => 1.0,
            _ => 0.2,
        },
        '\u{ac00}'..='\u{d7af}' => 0.2,
        // Hiragana and katakana
        '\u{3040}'..='\u{30ff}' => {
            if encoding == SHIFT_JIS {
                1.0
            } else {
                0.5
            }
        }
        '\u{4e00}'..='\u{9fff}' => ideograph_weight(encoding, c),
        '\u{3400}'..='\u{4dbf}' => 0.2,
        // CJK punctuation, full-width ASCII
        '\u{3000}'..='\u{303f}' | '\u{ff01}'..='\u{ff5e}' => 1.0,
        // half-width katakana
        '\u{ff61}'..='\u{ff9f}' => 0.3,
        'À'..='ÿ' | 'Œ' | 'œ' | 'Š' | 'š' | 'Ž' | 'ž' | 'Ÿ' if c != '×' && c != '÷' => {
            if single_byte {
                1.0
            } else {
                0.3
            }
        }
        '\u{a0}'..='\u{bf}' | '×' | '÷' | '\u{2013}' | '\u{2014}' | '\u{2018}'..='\u{201e}' | '\u{2026}' | '\u{20ac}' => {
            if single_byte {
                0.5
            } else {
                0.3
            }
        }
        _ => 0.0,
    }
}

/// CJK ideographs score by the region of the code table they come from
fn ideograph_weight(encoding: &'static Encoding, c: char) -> f32 {
    let Some((lead, trail)) = encode_pair(encoding, c) else {
        return 0.2;
    };
    if encoding == GB18030 {
        // GB2312 hanzi
        if (0xB0..=0xF7).contains(&lead) && trail >= 0xA1 {
            1.0
        } else {
            0.2
        }
    } else if encoding == BIG5 {
        // frequently used hanzi
        if (0xA4..=0xC6).contains(&lead) {
            1.0
        } else {
            0.5
        }
    } else if encoding == SHIFT_JIS {
        // JIS level 1 kanji
        if (0x88..=0x98).contains(&lead) {
            1.0
        } else {
            0.6
        }
    } else if encoding == EUC_KR {
        // hanja are rare in Korean text
        0.3
    } else {
        0.2
    }
}

/// Two-byte encoding of `c`, or `None` when it is unmappable or not double-byte
fn encode_pair(encoding: &'static Encoding, c: char) -> Option<(u8, u8)> {
    let mut buf = [0u8; 4];
    let (bytes, _, had_errors) = encoding.encode(c.encode_utf8(&mut buf));
    match bytes.as_ref() {
        &[lead, trail] if !had_errors => Some((lead, trail)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "zhangsan----pw1----张三丰----110101199003071234----太极宗师----13800000000----zs@example.com\n\
                          lisi----pw2----李四----110101199003075678----小李飞刀----13900000000----ls@example.com\n";

    #[test]
    fn test_ascii_and_empty_are_utf8() {
        let d = detect(b"alice----pw----Alice").unwrap();
        assert_eq!(d.encoding, UTF_8);
        assert_eq!(d.confidence, 1.0);

        let d = detect(b"").unwrap();
        assert_eq!(d.encoding, UTF_8);
    }

    #[test]
    fn test_utf8_with_truncated_tail() {
        let bytes = "张三丰".as_bytes();
        let d = detect(&bytes[..bytes.len() - 1]).unwrap();
        assert_eq!(d.encoding, UTF_8);
    }

    #[test]
    fn test_bom_wins() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"abc");
        let d = detect(&bytes).unwrap();
        assert_eq!(d.encoding, UTF_8);
        assert_eq!(decode(&bytes, Some(d)).unwrap(), "abc");

        let utf16 = [0xFF, 0xFE, b'a', 0x00, b'b', 0x00];
        let d = detect(&utf16).unwrap();
        assert_eq!(d.encoding, encoding_rs::UTF_16LE);
        assert_eq!(decode(&utf16, Some(d)).unwrap(), "ab");
    }

    #[test]
    fn test_gbk_detected_and_decoded() {
        let (bytes, _, had_errors) = encoding_rs::GBK.encode(SAMPLE);
        assert!(!had_errors);

        let d = detect(&bytes).unwrap();
        assert_eq!(d.encoding, GB18030);
        assert_eq!(decode(&bytes, Some(d)).unwrap(), SAMPLE);
    }

    #[test]
    fn test_gbk_prefix_cut_mid_character() {
        let (bytes, _, _) = encoding_rs::GBK.encode(SAMPLE);
        // "zhangsan----pw1----" is 19 bytes, then 张 (2 bytes), so 22 bytes ends inside 三
        let d = detect(&bytes[..22]).unwrap();
        assert_eq!(d.encoding, GB18030);
    }

    fn assert_round_trip(encoding: &'static Encoding, sample: &str) {
        let (bytes, _, had_errors) = encoding.encode(sample);
        assert!(!had_errors);

        let d = detect(&bytes).unwrap();
        assert_eq!(d.encoding, encoding);
        assert_eq!(decode(&bytes, Some(d)).unwrap(), sample);
    }

    #[test]
    fn test_shift_jis_detected_and_decoded() {
        assert_round_trip(
            SHIFT_JIS,
            "tanaka----pw----田中太郎----110101199003071234----たなかさん----09012345678----tanaka@example.jp\n",
        );
    }

    #[test]
    fn test_euc_kr_detected_and_decoded() {
        assert_round_trip(
            EUC_KR,
            "kim----pw----김철수----110101199003071234----철수친구----01012345678----kim@example.kr\n",
        );
    }

    #[test]
    fn test_big5_detected_and_decoded() {
        assert_round_trip(
            BIG5,
            "chan----pw----陳大文----110101199003071234----小明----91234567----chan@example.hk\n",
        );
    }

    #[test]
    fn test_windows_1252_detected_and_decoded() {
        assert_round_trip(
            WINDOWS_1252,
            "jose----pw----José Müller----110101199003071234----señor…----13800000000----jm@example.com\n",
        );
    }

    #[test]
    fn test_gbk_not_taken_for_korean() {
        let (bytes, _, _) = encoding_rs::GBK.encode(SAMPLE);
        assert!(plausibility(EUC_KR, &EUC_KR.decode_without_bom_handling(&bytes).0) < 1.0);
        assert_eq!(detect(&bytes).unwrap().encoding, GB18030);
    }

    #[test]
    fn test_garbage_is_undetected() {
        assert!(detect(&[0xFF; 64]).is_none());
        assert_eq!(decode(&[0xFF; 64], None), Err(DecodeError::Undetected));
    }

    #[test]
    fn test_decode_fails_on_malformed_tail() {
        let mut bytes = b"alice----pw----Alice----1----a----1----a@x.io\n".to_vec();
        let d = detect(&bytes).unwrap();
        bytes.push(0xFF);
        assert_eq!(
            decode(&bytes, Some(d)),
            Err(DecodeError::Malformed { encoding: "UTF-8" })
        );
    }
}
