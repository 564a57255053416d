use crate::{AlertEvent, ChannelKind, Effect, Msg, Phase, WatchState};

/// Pure update function: applies a message to state and returns any effects.
///
/// A scan that finds nothing new produces no effects at all: removals are
/// never written back to the snapshot.
pub fn update(mut state: WatchState, msg: Msg) -> (WatchState, Vec<Effect>) {
    let effects = match msg {
        Msg::Tick => {
            if state.phase() == Phase::Idle {
                state.begin_scan();
                vec![Effect::StartScan]
            } else {
                Vec::new()
            }
        }
        Msg::ScanCompleted {
            current,
            previous,
            detected_at,
        } => {
            if state.phase() != Phase::Scanning {
                return (state, Vec::new());
            }
            let new = current.difference(&previous);
            state.finish_scan(new.len());
            if new.is_empty() {
                Vec::new()
            } else {
                let event = AlertEvent {
                    current,
                    new,
                    previous,
                    detected_at,
                };
                vec![
                    Effect::RecordAlert(event.clone()),
                    Effect::SaveSnapshot(event.current.clone()),
                    Effect::Notify {
                        channel: ChannelKind::Webhook,
                        event: event.clone(),
                    },
                    Effect::Notify {
                        channel: ChannelKind::Mail,
                        event,
                    },
                ]
            }
        }
    };

    (state, effects)
}
