use serde::{Deserialize, Serialize};

/// Whether the caller may stream the motivational video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoAccess {
    pub granted: bool,
}
