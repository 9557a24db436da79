use std::collections::BTreeSet;
use std::io::Write;

use crate::errors::*;
use crate::parse_utils::skip_whitespace;

/// Set of path identifiers annotating one alternative string.
///
/// `Universal` is written as `{0}` and means "every path"; explicit sets
/// hold positive path ids only. The mixed form (`0` alongside other ids)
/// is rejected on parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSet {
    Universal,
    Paths(BTreeSet<u32>),
}

impl SourceSet {
    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        SourceSet::Paths(ids.into_iter().collect())
    }

    pub fn is_universal(&self) -> bool {
        matches!(self, SourceSet::Universal)
    }

    /// Number of ids in the set; the universal marker counts as one.
    pub fn len(&self) -> usize {
        match self {
            SourceSet::Universal => 1,
            SourceSet::Paths(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        false // well-formed sets are never empty
    }

    /// Intersection with a distinguished universal element:
    /// `U ∩ U = U`, `U ∩ S = S ∩ U = S`, otherwise ordinary intersection.
    /// Returns `None` when the ordinary intersection is empty.
    pub fn intersect(&self, other: &SourceSet) -> Option<SourceSet> {
        use SourceSet::*;
        match (self, other) {
            (Universal, Universal) => Some(Universal),
            (Universal, Paths(p)) | (Paths(p), Universal) => Some(Paths(p.clone())),
            (Paths(a), Paths(b)) => {
                let both: BTreeSet<u32> = a.intersection(b).copied().collect();
                if both.is_empty() {
                    None
                } else {
                    Some(Paths(both))
                }
            }
        }
    }

    pub fn write_to(&self, w: &mut impl Write) -> std::io::Result<()> {
        w.write_all(b"{")?;
        match self {
            SourceSet::Universal => w.write_all(b"0")?,
            SourceSet::Paths(p) => {
                for (i, id) in p.iter().enumerate() {
                    if i > 0 {
                        w.write_all(b",")?;
                    }
                    write!(w, "{id}")?;
                }
            }
        }
        w.write_all(b"}")
    }
}

/// Parse sEDS text: `{nat(,nat)*}` repeated, one group per alternative
/// string. Whitespace is ignored everywhere. The group count is validated
/// against the EDS cardinality by the caller.
pub fn parse_sources(input: &[u8]) -> Result<Vec<SourceSet>> {
    let mut sets = Vec::new();
    let mut pos = 0;

    loop {
        pos = skip_whitespace(input, pos);
        if pos >= input.len() {
            break;
        }
        if input[pos] != b'{' {
            return Err(Error::ParseSources {
                pos,
                reason: "expected '{'",
            });
        }
        let group_start = pos;
        pos += 1;

        let mut ids = BTreeSet::new();
        let mut universal = false;
        let mut current: Option<u32> = None;

        loop {
            pos = skip_whitespace(input, pos);
            let Some(&b) = input.get(pos) else {
                return Err(Error::ParseSources {
                    pos,
                    reason: "missing '}' at end of group",
                });
            };
            match b {
                b'0'..=b'9' => {
                    let digit = (b - b'0') as u32;
                    let next = current
                        .unwrap_or(0)
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(digit))
                        .ok_or(Error::ParseSources {
                            pos,
                            reason: "path id does not fit in 32 bits",
                        })?;
                    current = Some(next);
                    pos += 1;
                }
                b',' | b'}' => {
                    if let Some(id) = current.take() {
                        if id == 0 {
                            universal = true;
                        } else {
                            ids.insert(id);
                        }
                    }
                    pos += 1;
                    if b == b'}' {
                        break;
                    }
                }
                _ => {
                    return Err(Error::ParseSources {
                        pos,
                        reason: "expected digit, ',' or '}'",
                    });
                }
            }
        }

        if universal && !ids.is_empty() {
            return Err(Error::ParseSources {
                pos: group_start,
                reason: "universal marker 0 mixed with explicit path ids",
            });
        }
        if universal {
            sets.push(SourceSet::Universal);
        } else if ids.is_empty() {
            return Err(Error::ParseSources {
                pos: group_start,
                reason: "empty path set",
            });
        } else {
            sets.push(SourceSet::Paths(ids));
        }
    }

    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(ids: &[u32]) -> SourceSet {
        SourceSet::from_ids(ids.iter().copied())
    }

    #[test]
    fn algebra_universal_laws() {
        let u = SourceSet::Universal;
        let s = paths(&[1, 3]);

        assert_eq!(u.intersect(&u), Some(SourceSet::Universal));
        assert_eq!(u.intersect(&s), Some(s.clone()));
        assert_eq!(s.intersect(&u), Some(s.clone()));
    }

    #[test]
    fn algebra_ordinary_intersection() {
        let a = paths(&[1, 2, 3]);
        let b = paths(&[2, 3, 4]);
        assert_eq!(a.intersect(&b), Some(paths(&[2, 3])));
        assert_eq!(paths(&[1]).intersect(&paths(&[2])), None);
    }

    #[test]
    fn algebra_commutative_associative() {
        let sets = [SourceSet::Universal, paths(&[1, 2]), paths(&[2, 5])];
        for a in &sets {
            for b in &sets {
                assert_eq!(a.intersect(b), b.intersect(a));
                for c in &sets {
                    let left = a.intersect(b).and_then(|ab| ab.intersect(c));
                    let right = b.intersect(c).and_then(|bc| a.intersect(&bc));
                    assert_eq!(left, right);
                }
            }
        }
    }

    #[test]
    fn parse_basic() {
        let sets = parse_sources(b"{0}{1,3}{2}").unwrap();
        assert_eq!(
            sets,
            vec![SourceSet::Universal, paths(&[1, 3]), paths(&[2])]
        );
    }

    #[test]
    fn parse_with_whitespace() {
        let sets = parse_sources(b"{ 1 } { 2 , 3 }\n").unwrap();
        assert_eq!(sets, vec![paths(&[1]), paths(&[2, 3])]);
    }

    #[test]
    fn parse_rejects_mixed_universal() {
        assert!(parse_sources(b"{0,2}").is_err());
    }

    #[test]
    fn parse_rejects_empty_group() {
        assert!(parse_sources(b"{1}{}").is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_sources(b"{1,x}").is_err());
        assert!(parse_sources(b"1,2").is_err());
        assert!(parse_sources(b"{1,2").is_err());
    }

    #[test]
    fn serialize_round_trip() {
        let sets = vec![paths(&[1]), paths(&[2]), paths(&[1, 2])];
        let mut out = Vec::new();
        for s in &sets {
            s.write_to(&mut out).unwrap();
        }
        assert_eq!(out, b"{1}{2}{1,2}");
        assert_eq!(parse_sources(&out).unwrap(), sets);
    }
}
