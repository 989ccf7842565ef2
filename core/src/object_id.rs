// Copyright 2024 The Subsplit Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A content-addressed object id, opaque outside of its 20-byte
//! representation and hex encoding.

use std::fmt;

/// A commit, tree or blob id as produced by the object store. Compared by
/// bytewise equality; the only interpretation the core ever performs is
/// hex encode/decode and raw-byte access for cache keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 20];
        buf.copy_from_slice(bytes);
        Self(buf)
    }

    pub fn from_git2(oid: git2::Oid) -> Self {
        Self::from_bytes(oid.as_bytes())
    }

    pub fn to_git2(self) -> git2::Oid {
        git2::Oid::from_bytes(&self.0).expect("ObjectId always holds a valid git2::Oid")
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut buf = [0u8; 20];
        hex::decode_to_slice(s, &mut buf)?;
        Ok(Self(buf))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&self.hex()).finish()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl From<git2::Oid> for ObjectId {
    fn from(oid: git2::Oid) -> Self {
        Self::from_git2(oid)
    }
}

impl From<ObjectId> for git2::Oid {
    fn from(id: ObjectId) -> Self {
        id.to_git2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_round_trips_through_hex() {
        let id = ObjectId::from_bytes(&[0xab; 20]);
        assert_eq!(ObjectId::from_hex(&id.hex()).unwrap(), id);
    }

    #[test]
    fn from_hex_rejects_wrong_length_instead_of_panicking() {
        assert!(ObjectId::from_hex("ab").is_err());
        assert!(ObjectId::from_hex(&"ab".repeat(21)).is_err());
    }
}
