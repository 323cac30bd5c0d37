use super::*;

#[test]
fn participant_label_pluralizes() {
    assert_eq!(participants_label(0), "0 participants");
    assert_eq!(participants_label(1), "1 participant");
    assert_eq!(participants_label(2), "2 participants");
}

#[test]
fn pending_states_render_as_connecting() {
    let feed = CueFeed::new();
    for status in [
        SessionStatus::Idle,
        SessionStatus::Connecting,
        SessionStatus::Joining,
        SessionStatus::Leaving,
    ] {
        assert_eq!(render_view(&status, 0, &feed), SessionView::Connecting);
    }
}

#[test]
fn error_carries_message_and_configuration_hint() {
    let status = SessionStatus::Error("failed to connect user: Token fetch failed: Internal Server Error".into());
    match render_view(&status, 0, &CueFeed::new()) {
        SessionView::Failed { message, hint } => {
            assert!(message.contains("Internal Server Error"));
            assert!(hint.contains("API_SECRET"));
            assert!(hint.contains("API_KEY"));
        }
        other => panic!("unexpected view: {other:?}"),
    }
}

#[test]
fn live_view_with_empty_feed_shows_listening_caption() {
    let SessionView::Live(live) = render_view(&SessionStatus::Connected, 1, &CueFeed::new()) else {
        panic!("expected live view");
    };
    assert_eq!(live.participants, "1 participant");
    assert_eq!(live.caption, LISTENING_CAPTION);
    assert!(live.cards.is_empty());
    assert_eq!(live.voice_commands.len(), 4);
}

#[test]
fn live_view_lists_cards_newest_first_with_priority_styles() {
    let mut feed = CueFeed::new();
    feed.append(CueEvent::new("Bob smiled", "10:01:00", CuePriority::Normal));
    feed.append(CueEvent::new("Carol raised her hand", "10:01:40", CuePriority::Urgent));
    feed.append(CueEvent::new("Alice is waving", "10:02:15", CuePriority::High));

    let SessionView::Live(live) = render_view(&SessionStatus::Connected, 2, &feed) else {
        panic!("expected live view");
    };
    assert_eq!(live.participants, "2 participants");
    assert_eq!(live.caption, "Alice is waving");
    let styles: Vec<CueStyle> = live.cards.iter().map(|card| card.style).collect();
    assert_eq!(styles, [CueStyle::Highlight, CueStyle::Alert, CueStyle::Plain]);
    assert_eq!(live.cards[0].timestamp, "10:02:15");
}

#[test]
fn headline_only_for_full_screen_states() {
    assert_eq!(SessionView::Connecting.headline(), Some(CONNECTING_HEADLINE));
    let failed = render_view(&SessionStatus::Error("boom".into()), 0, &CueFeed::new());
    assert_eq!(failed.headline(), Some(FAILED_HEADLINE));
    let live = render_view(&SessionStatus::Connected, 1, &CueFeed::new());
    assert_eq!(live.headline(), None);
}
