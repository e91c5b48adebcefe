//! Stable hashing helpers for table configs and manifests.

use blake3::Hasher;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(bytes);
    let out = h.finalize();
    Hash256(out.into())
}

/// Hash any serde-serializable value deterministically (via JSON).
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256, crate::error::Error> {
    let bytes = serde_json::to_vec(v).map_err(|e| crate::error::Error::Hash(e.to_string()))?;
    Ok(hash_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableSpec;

    #[test]
    fn table_list_hash_is_stable_and_order_sensitive() {
        let a = vec![
            TableSpec::full("countries", "c.csv"),
            TableSpec::incremental("orders", "updated_at", "o.csv"),
        ];
        let mut b = a.clone();
        assert_eq!(hash_serde(&a).unwrap(), hash_serde(&b).unwrap());

        b.reverse();
        assert_ne!(hash_serde(&a).unwrap(), hash_serde(&b).unwrap());
        assert_eq!(hash_serde(&a).unwrap().to_hex().len(), 64);
    }
}
