use sha2::{Digest, Sha256};

pub fn duration_to_ms_string(duration: std::time::Duration) -> String {
    format!("{:.2}ms", duration.as_secs_f64() * 1000.0)
}

pub fn hash_string(string: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(string);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(
            hash_string("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn ms_string_has_two_decimals() {
        let duration = std::time::Duration::from_micros(1500);
        assert_eq!(duration_to_ms_string(duration), "1.50ms");
    }
}
