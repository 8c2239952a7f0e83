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

use std::{
    fmt::{Debug, Display},
    ops::{BitAnd, Not, Sub},
};

/// An unsigned trait that used by the utils.
pub trait Unsigned:
    Sub<Output = Self> + BitAnd<Output = Self> + Not<Output = Self> + Sized + From<u8> + Eq + Debug + Display + Clone + Copy
{
}

impl<U: Sub<Output = Self> + BitAnd<Output = Self> + Not<Output = Self> + Sized + From<u8> + Eq + Debug + Display + Clone + Copy>
    Unsigned for U
{
}

/// Check if the given value is a power of 2.
#[inline(always)]
pub fn is_pow2<U: Unsigned>(v: U) -> bool {
    v & (v - U::from(1)) == U::from(0)
}

/// Assert that the given value is a power of 2.
#[inline(always)]
pub fn assert_pow2<U: Unsigned>(v: U) {
    assert_eq!(v & (v - U::from(1)), U::from(0), "v: {}", v);
}

/// Debug assert that the given value is a power of 2.
#[inline(always)]
pub fn debug_assert_pow2<U: Unsigned>(v: U) {
    debug_assert_eq!(v & (v - U::from(1)), U::from(0), "v: {}", v);
}

/// The smallest power of 2 that is not less than the given value.
///
/// Used to derive a bucket count from an expected entry count. Zero maps to 1.
#[inline(always)]
pub fn next_pow2(v: usize) -> usize {
    v.max(1).next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pow2() {
        for shift in 0..usize::BITS {
            assert!(is_pow2(1usize << shift));
        }
        assert!(!is_pow2(3u64));
        assert!(!is_pow2(12u32));
        assert!(!is_pow2(1000u64));
    }

    #[test]
    fn test_next_pow2() {
        assert_eq!(next_pow2(0), 1);
        assert_eq!(next_pow2(1), 1);
        assert_eq!(next_pow2(2), 2);
        assert_eq!(next_pow2(3), 4);
        assert_eq!(next_pow2(1000), 1024);
        assert_eq!(next_pow2(16384), 16384);
        assert_eq!(next_pow2(16385), 32768);
    }
}
