//! Packed k-mer values and nucleotide helpers
//! =========================================
//!
//! Graph nodes are keyed by a 2-bit packed k-mer (`A=00, C=01, G=10, T=11`,
//! first symbol in the most significant position). A k-mer and its reverse
//! complement fold onto one canonical value: the larger of the two encodings.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest k-mer that fits in a single `u64` with room for the shift mask
pub const MAX_KMER_LENGTH: usize = 31;

const SYMBOLS: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Two-bit code for a nucleotide, `None` for anything outside `ACGT`
#[inline]
pub fn encode_base(base: u8) -> Option<u64> {
    match base {
        b'A' | b'a' => Some(0b00),
        b'C' | b'c' => Some(0b01),
        b'G' | b'g' => Some(0b10),
        b'T' | b't' => Some(0b11),
        _ => None,
    }
}

#[inline]
pub fn decode_base(bits: u64) -> u8 {
    SYMBOLS[(bits & 0b11) as usize]
}

/// Watson-Crick complement; unknown symbols are passed through unchanged
#[inline]
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        other => other,
    }
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// True when every symbol is an unambiguous nucleotide
pub fn is_unambiguous_dna(seq: &[u8]) -> bool {
    seq.iter().all(|&b| encode_base(b).is_some())
}

/// Mask covering the low `2k` bits
#[inline]
pub fn kmer_mask(k: usize) -> u64 {
    if k >= 32 {
        u64::MAX
    } else {
        (1u64 << (2 * k)) - 1
    }
}

/// Reverse complement of a packed k-mer
#[inline]
pub fn reverse_complement_bits(mut bits: u64, k: usize) -> u64 {
    let mut rc = 0u64;
    for _ in 0..k {
        rc = (rc << 2) | (0b11 - (bits & 0b11));
        bits >>= 2;
    }
    rc
}

/// Canonical k-mer value stored on a graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KmerValue(u64);

impl KmerValue {
    /// Wrap an already-canonical packed value
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Canonicalize a packed k-mer.
    ///
    /// Returns the canonical value and whether it is the k-mer in its original
    /// orientation (`true`) or its reverse complement (`false`).
    #[inline]
    pub fn canonical(bits: u64, k: usize) -> (Self, bool) {
        let rc = reverse_complement_bits(bits, k);
        if bits >= rc {
            (Self(bits), true)
        } else {
            (Self(rc), false)
        }
    }

    /// Pack a symbol slice without canonicalizing it
    pub fn pack(seq: &[u8]) -> Result<u64> {
        if seq.is_empty() || seq.len() > MAX_KMER_LENGTH {
            return Err(anyhow!(
                "Invalid k-mer length: {} (must be 1..={})",
                seq.len(),
                MAX_KMER_LENGTH
            ));
        }

        seq.iter().try_fold(0u64, |acc, &b| {
            encode_base(b)
                .map(|code| (acc << 2) | code)
                .ok_or_else(|| anyhow!("Invalid nucleotide: {}", b as char))
        })
    }

    /// Canonical value of a symbol slice
    pub fn from_sequence(seq: &[u8]) -> Result<(Self, bool)> {
        let bits = Self::pack(seq)?;
        Ok(Self::canonical(bits, seq.len()))
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    /// Symbols of the stored (canonical) orientation
    pub fn symbols(self, k: usize) -> Vec<u8> {
        (0..k)
            .map(|i| decode_base(self.0 >> (2 * (k - 1 - i))))
            .collect()
    }

    pub fn reverse_complement_symbols(self, k: usize) -> Vec<u8> {
        Self(reverse_complement_bits(self.0, k)).symbols(k)
    }

    /// A k-mer equal to its own reverse complement. Only possible for even k.
    pub fn is_palindrome(self, k: usize) -> bool {
        self.0 == reverse_complement_bits(self.0, k)
    }

    /// First symbol of the k-mer in the requested orientation
    pub fn first_symbol(self, k: usize, same_orientation: bool) -> u8 {
        if same_orientation {
            decode_base(self.0 >> (2 * (k - 1)))
        } else {
            // first symbol of the reverse complement is the complement of the last
            complement(decode_base(self.0))
        }
    }

    /// Last symbol of the k-mer in the requested orientation
    pub fn last_symbol(self, k: usize, same_orientation: bool) -> u8 {
        if same_orientation {
            decode_base(self.0)
        } else {
            complement(decode_base(self.0 >> (2 * (k - 1))))
        }
    }
}

impl fmt::Display for KmerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Rolling iterator over the packed k-mers of a sequence.
///
/// Yields `(offset, packed_bits)` for every window made only of `ACGT`;
/// windows containing another symbol are skipped.
pub struct PackedKmers<'a> {
    seq: &'a [u8],
    k: usize,
    mask: u64,
    pos: usize,
    bits: u64,
    valid_run: usize,
}

impl<'a> PackedKmers<'a> {
    pub fn new(seq: &'a [u8], k: usize) -> Self {
        Self {
            seq,
            k,
            mask: kmer_mask(k),
            pos: 0,
            bits: 0,
            valid_run: 0,
        }
    }
}

impl Iterator for PackedKmers<'_> {
    type Item = (usize, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.k == 0 {
            return None;
        }
        while self.pos < self.seq.len() {
            let base = self.seq[self.pos];
            self.pos += 1;
            match encode_base(base) {
                Some(code) => {
                    self.bits = ((self.bits << 2) | code) & self.mask;
                    self.valid_run += 1;
                    if self.valid_run >= self.k {
                        return Some((self.pos - self.k, self.bits));
                    }
                }
                None => {
                    self.bits = 0;
                    self.valid_run = 0;
                }
            }
        }
        None
    }
}
