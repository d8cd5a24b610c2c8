//! Server-sent event plumbing shared by the room endpoints

use axum::response::sse::Event;
use futures::{Stream, stream};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::models::RealtimeEvent;

/// Encode an event as an SSE frame named after its kind
pub fn to_sse_event(event: &RealtimeEvent) -> Result<Event, axum::Error> {
    Event::default().event(event.kind()).json_data(event)
}

/// Turn a room subscription into an SSE stream.
///
/// A lagging subscriber skips what it missed and keeps going; the stream ends
/// when the room is dropped.
pub fn room_stream(
    rx: broadcast::Receiver<RealtimeEvent>,
) -> impl Stream<Item = Result<Event, axum::Error>> + Send + 'static {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((to_sse_event(&event), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged, dropping missed events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FirstBloodEvent, Room};
    use crate::realtime::{Publisher, RoomHub};
    use futures::StreamExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_room_stream_yields_published_events() {
        let hub = RoomHub::default();
        let contest_id = Uuid::new_v4();
        let room = Room::Contest(contest_id);
        let stream = room_stream(hub.subscribe(room).unwrap());
        futures::pin_mut!(stream);

        let event = RealtimeEvent::FirstBlood(FirstBloodEvent {
            contest_id,
            problem_id: Uuid::new_v4(),
            problem_label: "B".to_string(),
            user_id: Uuid::new_v4(),
            submission_time: 7,
        });
        hub.publish(room, &event).await.unwrap();

        let frame = stream.next().await.unwrap();
        assert!(frame.is_ok());
    }
}
