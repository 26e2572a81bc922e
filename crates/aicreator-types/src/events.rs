use serde::{Deserialize, Serialize};

/// Tables that emit change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Images,
    Videos,
    Preferences,
}

/// Published on the change feed after every local store write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StoreEvent {
    /// A user row was inserted or replaced
    UserSaved { id: i64 },

    /// A user row was removed
    UserDeleted { id: i64 },

    /// An image row was inserted or replaced
    ImageSaved { id: i64, user_id: i64 },

    /// A single column of an image row changed (favorite, local path)
    ImageUpdated { id: i64 },

    /// An image row was removed
    ImageDeleted { id: i64 },

    /// Every image of one user was removed (user delete cascade)
    ImagesPurged { user_id: i64 },

    /// A video row was inserted
    VideoSaved { id: i64, user_id: i64 },

    /// A single column of a video row changed
    VideoUpdated { id: i64 },

    /// A video row was removed
    VideoDeleted { id: i64 },

    /// Session or preference keys changed
    SessionChanged,
}

impl StoreEvent {
    pub fn table(&self) -> Table {
        match self {
            Self::UserSaved { .. } | Self::UserDeleted { .. } => Table::Users,
            Self::ImageSaved { .. }
            | Self::ImageUpdated { .. }
            | Self::ImageDeleted { .. }
            | Self::ImagesPurged { .. } => Table::Images,
            Self::VideoSaved { .. } | Self::VideoUpdated { .. } | Self::VideoDeleted { .. } => {
                Table::Videos
            }
            Self::SessionChanged => Table::Preferences,
        }
    }

    /// Returns the owning user if this event is known to be scoped to one.
    /// Events that return `None` may affect any user's queries.
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::ImageSaved { user_id, .. } | Self::ImagesPurged { user_id } => Some(*user_id),
            Self::VideoSaved { user_id, .. } => Some(*user_id),
            Self::UserSaved { id } | Self::UserDeleted { id } => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoping() {
        assert_eq!(StoreEvent::ImageSaved { id: 1, user_id: 7 }.user_id(), Some(7));
        assert_eq!(StoreEvent::ImageDeleted { id: 1 }.user_id(), None);
        assert_eq!(StoreEvent::VideoUpdated { id: 2 }.table(), Table::Videos);
        assert_eq!(StoreEvent::SessionChanged.table(), Table::Preferences);
    }
}
