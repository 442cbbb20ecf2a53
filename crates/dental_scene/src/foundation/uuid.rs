//! Random unique identifiers

use std::fmt;

/// 128-bit random identifier, displayed as `xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uuid(u128);

impl Uuid {
    /// Generate a new random (version 4) identifier
    pub fn new_v4() -> Self {
        let bits: u128 = rand::random();
        // version nibble 4, variant bits 10
        let bits = (bits & !(0xF_u128 << 76)) | (0x4_u128 << 76);
        let bits = (bits & !(0x3_u128 << 62)) | (0x2_u128 << 62);
        Self(bits)
    }

    /// Raw value
    pub const fn as_u128(&self) -> u128 {
        self.0
    }
}

impl Default for Uuid {
    fn default() -> Self {
        Self::new_v4()
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xFFFF_FFFF_FFFF,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(id.len(), 36);
        let groups: Vec<&str> = id.split('-').collect();
        assert_eq!(groups.iter().map(|g| g.len()).collect::<Vec<_>>(), vec![8, 4, 4, 4, 12]);
        assert!(groups[2].starts_with('4'));
        assert!(matches!(groups[3].chars().next(), Some('8' | '9' | 'a' | 'b')));
    }

    #[test]
    fn test_uuid_unique() {
        assert_ne!(Uuid::new_v4(), Uuid::new_v4());
    }
}
