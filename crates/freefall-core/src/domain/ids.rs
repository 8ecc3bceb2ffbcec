//! Attempt identifiers.
//!
//! Every admitted attempt gets a ULID so the lines it leaves in the request log
//! (claim, execution, resolution) can be correlated, even when an earlier crashed
//! attempt left lines in the same file.
//!
//! ULID の特性:
//! - 時刻でソート可能（ログの順序と一致する）
//! - 調整なしで生成できる

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of one execution attempt of a request.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttemptId(Ulid);

impl AttemptId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for AttemptId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_prefix() {
        let ulid = Ulid::new();
        let id = AttemptId::from(ulid);
        assert_eq!(id.as_ulid(), ulid);
        assert_eq!(id.to_string(), format!("attempt-{ulid}"));
    }

    #[test]
    fn ids_sort_by_creation_time() {
        // ULID は時刻ベースなので、生成順序でソート可能
        let id1 = AttemptId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = AttemptId::from_ulid(Ulid::new());
        assert!(id1 < id2);
    }
}
