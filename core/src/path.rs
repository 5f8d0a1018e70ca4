// Copyright (c) 2024-2025 The Tapcard Developers

//! Hierarchical derivation path codec
//!
//! Paths are sequences of 31 bit indices with an optional hardened flag
//! in bit 31, written `m/84h/0h/0` style. Parsing accepts the usual
//! hardening marker spellings, formatting always emits `h`.

use crate::error::Error;

/// Bit flagging a hardened path component
pub const HARDENED: u32 = 0x8000_0000;

/// Marker characters accepted after a hardened component
const HARDENED_MARKERS: [char; 5] = ['\'', 'h', 'H', 'p', 'P'];

/// Parse a textual derivation path into raw components.
///
/// Components must lie in `[0, 2^31)` before hardening; out of range
/// values fail with [`Error::PathRange`], a marker without digits or a
/// non-numeric component with [`Error::MalformedPath`].
pub fn str2path(path: &str) -> Result<Vec<u32>, Error> {
    let body = path.strip_prefix(['m', 'M']).unwrap_or(path);
    let body = body.strip_prefix('/').unwrap_or(body);

    if body.is_empty() {
        return Ok(Vec::new());
    }

    let mut components = Vec::new();

    for part in body.split('/') {
        let (digits, hardened) = match part.chars().last() {
            Some(c) if HARDENED_MARKERS.contains(&c) => (&part[..part.len() - 1], true),
            _ => (part, false),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::MalformedPath);
        }

        let num: u64 = digits.parse().map_err(|_| Error::PathRange)?;
        if num >= HARDENED as u64 {
            return Err(Error::PathRange);
        }

        let num = num as u32;
        components.push(if hardened { num | HARDENED } else { num });
    }

    Ok(components)
}

/// Format raw path components back to text
pub fn path2str(path: &[u32]) -> String {
    let mut out = String::from("m");

    for component in path {
        out.push('/');
        out.push_str(&(component & !HARDENED).to_string());
        if component & HARDENED != 0 {
            out.push('h');
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_common_paths() {
        assert_eq!(str2path("m").unwrap(), Vec::<u32>::new());
        assert_eq!(str2path("m/0").unwrap(), vec![0]);
        assert_eq!(
            str2path("m/84h/0h/0h").unwrap(),
            vec![84 | HARDENED, HARDENED, HARDENED]
        );
        assert_eq!(
            str2path("m/44'/0'/0'/1/3").unwrap(),
            vec![44 | HARDENED, HARDENED, HARDENED, 1, 3]
        );

        // Marker spellings are equivalent
        assert_eq!(str2path("m/84h"), str2path("m/84'"));
        assert_eq!(str2path("m/84H"), str2path("m/84p"));
    }

    #[test]
    fn roundtrip() {
        for p in [
            "m",
            "m/0",
            "m/84h/0h/0h",
            "m/44h/0h/0h/1/3",
            "m/2147483647/2147483647h",
        ] {
            let parsed = str2path(p).unwrap();
            assert_eq!(path2str(&parsed), p);
            assert_eq!(str2path(&path2str(&parsed)).unwrap(), parsed);
        }
    }

    #[test]
    fn component_range() {
        // 2^31 is the first value that no longer fits
        assert_eq!(str2path("m/2147483647").unwrap(), vec![0x7fff_ffff]);
        assert_eq!(str2path("m/2147483648"), Err(Error::PathRange));
        assert_eq!(str2path("m/2147483648h"), Err(Error::PathRange));
        assert_eq!(str2path("m/99999999999999999999"), Err(Error::PathRange));
    }

    #[test]
    fn malformed_components() {
        assert_eq!(str2path("m/h"), Err(Error::MalformedPath));
        assert_eq!(str2path("m/'"), Err(Error::MalformedPath));
        assert_eq!(str2path("m/12x"), Err(Error::MalformedPath));
        assert_eq!(str2path("m/0//1"), Err(Error::MalformedPath));
        assert_eq!(str2path("m/abc"), Err(Error::MalformedPath));
    }
}
