use rand::RngCore;
use sha2::{Digest, Sha256};

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// `n` random bytes, hex-encoded
pub fn random_hex(n: usize) -> String {
    let mut bytes = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

pub fn generate_salt() -> String {
    random_hex(16)
}

/// JWT signing secret for persisted credentials and unconfigured processes
pub fn generate_secret() -> String {
    random_hex(32)
}

/// SHA-256 of `password ‖ salt`, hex-encoded
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    to_hex(&hasher.finalize())
}

pub fn verify_password(password: &str, hash: &str, salt: &str) -> bool {
    constant_time_eq(hash_password(password, salt).as_bytes(), hash.as_bytes())
}

/// Compare without short-circuiting on the first differing byte
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
