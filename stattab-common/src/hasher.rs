// Copyright 2026 stattab Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The sdbm hash generates 64-bit values that are well distributed across the
//! entire 64-bit range and, unlike hashers with a randomized seed, are stable
//! across runs and builds. Entity hash values key durable-store records, so
//! stability is a requirement, not an optimization.

use std::hash::{BuildHasher, Hasher};

/// Fold one byte into an sdbm hash value.
#[inline(always)]
pub fn hash_byte(hashval: u64, byte: u8) -> u64 {
    (byte as u64)
        .wrapping_add(hashval << 6)
        .wrapping_add(hashval << 16)
        .wrapping_sub(hashval)
}

/// Fold a byte slice into an sdbm hash value.
pub fn hash_bin(hashval: u64, buf: &[u8]) -> u64 {
    buf.iter().fold(hashval, |h, &b| hash_byte(h, b))
}

/// Fold a string into an sdbm hash value.
pub fn hash_str(hashval: u64, s: &str) -> u64 {
    hash_bin(hashval, s.as_bytes())
}

/// Fold an unsigned number into an sdbm hash value, byte by byte.
pub fn hash_num(hashval: u64, num: u64) -> u64 {
    hash_bin(hashval, &num.to_le_bytes())
}

/// An sdbm hasher behind the [`std::hash::Hasher`] interface.
///
/// Multi-byte writes use little-endian order so hash values do not depend on
/// the host platform.
#[derive(Debug, Default)]
pub struct SdbmHasher {
    state: u64,
}

impl Hasher for SdbmHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        self.state = hash_bin(self.state, bytes);
    }

    fn write_u8(&mut self, i: u8) {
        self.write(&[i])
    }

    fn write_u16(&mut self, i: u16) {
        self.write(&i.to_le_bytes())
    }

    fn write_u32(&mut self, i: u32) {
        self.write(&i.to_le_bytes())
    }

    fn write_u64(&mut self, i: u64) {
        self.write(&i.to_le_bytes())
    }

    fn write_u128(&mut self, i: u128) {
        self.write(&i.to_le_bytes())
    }

    fn write_usize(&mut self, i: usize) {
        self.write_u64(i as u64)
    }

    fn write_i8(&mut self, i: i8) {
        self.write_u8(i as u8)
    }

    fn write_i16(&mut self, i: i16) {
        self.write_u16(i as u16)
    }

    fn write_i32(&mut self, i: i32) {
        self.write_u32(i as u32)
    }

    fn write_i64(&mut self, i: i64) {
        self.write_u64(i as u64)
    }

    fn write_i128(&mut self, i: i128) {
        self.write_u128(i as u128)
    }

    fn write_isize(&mut self, i: isize) {
        self.write_usize(i as usize)
    }
}

impl BuildHasher for SdbmHasher {
    type Hasher = Self;

    fn build_hasher(&self) -> Self::Hasher {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdbm_known_values() {
        assert_eq!(hash_str(0, ""), 0);
        assert_eq!(hash_str(0, "a"), 97);
        // h("ab") = 98 + (97 << 6) + (97 << 16) - 97
        assert_eq!(hash_str(0, "ab"), 98 + (97 << 6) + (97 << 16) - 97);
    }

    #[test]
    fn test_sdbm_chaining() {
        let whole = hash_str(0, "10.0.0.1:file.tar.gz");
        let chained = hash_str(hash_str(0, "10.0.0.1:"), "file.tar.gz");
        assert_eq!(whole, chained);
    }

    #[test]
    fn test_hasher_matches_free_functions() {
        let mut hasher = SdbmHasher::default();
        hasher.write("example.com".as_bytes());
        assert_eq!(hasher.finish(), hash_str(0, "example.com"));

        let mut hasher = SdbmHasher::default();
        hasher.write_u64(0xdead_beef);
        assert_eq!(hasher.finish(), hash_num(0, 0xdead_beef));
    }

    #[test]
    fn test_distribution_over_buckets() {
        // Sequential IP-style keys must not collapse into a few buckets.
        let mut buckets = vec![0usize; 64];
        for i in 0..4096 {
            let key = format!("192.168.{}.{}", i / 256, i % 256);
            buckets[(hash_str(0, &key) & 63) as usize] += 1;
        }
        assert!(buckets.iter().all(|&n| n > 0));
    }
}
