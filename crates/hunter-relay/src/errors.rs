/// Well-formed requests the current room state does not allow.
///
/// The `Display` text is sent verbatim as the `message` of an `error` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("room not found")]
    RoomNotFound,

    #[error("room is full")]
    RoomFull,

    #[error("game already started")]
    GameAlreadyStarted,

    #[error("not in a room")]
    NotInRoom,

    #[error("already in this room")]
    AlreadyInRoom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_display() {
        assert_eq!(RequestError::RoomNotFound.to_string(), "room not found");
        assert_eq!(RequestError::RoomFull.to_string(), "room is full");
        assert_eq!(
            RequestError::GameAlreadyStarted.to_string(),
            "game already started"
        );
        assert_eq!(RequestError::NotInRoom.to_string(), "not in a room");
        assert_eq!(
            RequestError::AlreadyInRoom.to_string(),
            "already in this room"
        );
    }
}
