#[cfg(test)]
mod tests {
    use crate::message::{Message, RoomSummary};
    use crate::{ServerEvent, parse_server_event};

    #[test]
    fn test_parse_init_success() {
        let frame = r#"{"event":"init_success"}"#;
        let event = parse_server_event(frame).unwrap();

        assert_eq!(event, ServerEvent::InitSuccess);
    }

    #[test]
    fn test_parse_room_joined() {
        let frame = r#"{"event":"room_joined","data":{"roomId":"r1","activeUsers":["alice","bob"]}}"#;
        let event = parse_server_event(frame).unwrap();

        assert_eq!(
            event,
            ServerEvent::RoomJoined {
                room_id: "r1".to_string(),
                active_users: vec!["alice".to_string(), "bob".to_string()],
            }
        );
    }

    #[test]
    fn test_parse_room_joined_without_user_list() {
        let frame = r#"{"event":"room_joined","data":{"roomId":"r1"}}"#;
        let event = parse_server_event(frame).unwrap();

        assert_eq!(
            event,
            ServerEvent::RoomJoined {
                room_id: "r1".to_string(),
                active_users: Vec::new(),
            }
        );
    }

    #[test]
    fn test_parse_receive_message() {
        let frame = r#"{
            "event": "receive_message",
            "data": {
                "id": "123",
                "content": "hello",
                "sender": {"id": "u1", "username": "alice", "first_name": "Alice", "last_name": "Archer"},
                "timestamp": "2024-01-01T00:00:00Z"
            }
        }"#;

        let event = parse_server_event(frame).unwrap();
        let ServerEvent::ReceiveMessage(message) = event else {
            panic!("expected receive_message");
        };

        assert_eq!(message.id, "123");
        assert_eq!(message.content, "hello");
        assert_eq!(message.sender.username, "alice");
        assert_eq!(message.room_id, None);
    }

    #[test]
    fn test_parse_typing_pair() {
        let typing = parse_server_event(r#"{"event":"user_typing","data":{"username":"alice"}}"#);
        let stopped =
            parse_server_event(r#"{"event":"user_stopped_typing","data":{"username":"alice"}}"#);

        assert_eq!(
            typing.unwrap(),
            ServerEvent::UserTyping {
                username: "alice".to_string()
            }
        );
        assert_eq!(
            stopped.unwrap(),
            ServerEvent::UserStoppedTyping {
                username: "alice".to_string()
            }
        );
    }

    #[test]
    fn test_parse_error_event() {
        let frame = r#"{"event":"error","data":{"message":"room full"}}"#;
        let event = parse_server_event(frame).unwrap();

        assert_eq!(
            event,
            ServerEvent::Error {
                message: "room full".to_string()
            }
        );
    }

    #[test]
    fn test_parse_empty_frame() {
        assert!(parse_server_event("").is_err());
        assert!(parse_server_event("   ").is_err());
    }

    #[test]
    fn test_parse_unknown_event() {
        let result = parse_server_event(r#"{"event":"mystery","data":{}}"#);

        assert!(result.is_err());
    }

    #[test]
    fn test_parse_malformed_json() {
        assert!(parse_server_event("{not json").is_err());
    }

    #[test]
    fn test_message_round_trip_keeps_room_id() {
        let frame = r#"{"id":"1","content":"hi","sender":{"id":"u1","username":"a","first_name":"A","last_name":"B"},"roomId":"r9","timestamp":"2024-01-01T00:00:00Z"}"#;
        let message: Message = serde_json::from_str(frame).unwrap();

        assert_eq!(message.room_id.as_deref(), Some("r9"));

        let back = serde_json::to_string(&message).unwrap();
        let again: Message = serde_json::from_str(&back).unwrap();
        assert_eq!(again, message);
    }

    #[test]
    fn test_room_summary_listing() {
        let body = r#"[{"id":"r1","name":"Acme deal"},{"id":"r2","name":"Outreach"}]"#;
        let rooms: Vec<RoomSummary> = serde_json::from_str(body).unwrap();

        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].id, "r1");
        assert_eq!(rooms[1].name, "Outreach");
    }
}
