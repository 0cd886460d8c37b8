/// Content fingerprint used as the dedup cache key. Derived from post text
/// only, so two posts with identical text share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// FNV-1a over the text's characters, folded to 64 bits and rendered in
/// base 36. Deterministic and collision-tolerant; a collision only costs a
/// skipped re-analysis, never a wrong cache write.
pub fn fingerprint(text: &str) -> Fingerprint {
    let mut hash = FNV_OFFSET;
    for ch in text.chars() {
        hash ^= ch as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    Fingerprint(to_base36(hash))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equal_input_equal_fingerprint() {
        let text = "Breaking: this isn't just news. It's a revolution.";
        assert_eq!(fingerprint(text), fingerprint(text));
    }

    #[test]
    fn distinct_inputs_rarely_collide() {
        let mut seen = HashSet::new();
        for i in 0..1000 {
            let text = format!("post number {i} with some filler text to look realistic");
            seen.insert(fingerprint(&text));
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn fingerprint_is_compact_base36() {
        let fp = fingerprint("hello world");
        assert!(fp.as_str().len() <= 13);
        assert!(fp
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn empty_text_has_a_fingerprint() {
        assert_eq!(fingerprint(""), fingerprint(""));
        assert_ne!(fingerprint(""), fingerprint(" "));
    }
}
