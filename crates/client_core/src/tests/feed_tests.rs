use super::*;
use shared::cue::CuePriority;

fn cue(n: usize, priority: CuePriority) -> CueEvent {
    CueEvent::new(format!("cue {n}"), format!("10:00:{n:02}"), priority)
}

#[test]
fn empty_feed_has_no_latest_cue() {
    let feed = CueFeed::new();
    assert!(feed.is_empty());
    assert!(feed.latest().is_none());
    assert_eq!(feed.history().len(), 0);
}

#[test]
fn history_is_exact_reverse_of_arrival_order() {
    let priorities = [CuePriority::Normal, CuePriority::Urgent, CuePriority::High];
    for n in [1usize, 2, 7, 50] {
        let mut feed = CueFeed::new();
        let appended: Vec<CueEvent> = (0..n).map(|i| cue(i, priorities[i % 3])).collect();
        for event in &appended {
            feed.append(event.clone());
        }

        let history: Vec<CueEvent> = feed.history().cloned().collect();
        let mut expected = appended.clone();
        expected.reverse();
        assert_eq!(history.len(), n);
        assert_eq!(history, expected);
        assert_eq!(feed.latest(), appended.last());
    }
}

#[test]
fn priority_never_reorders_entries() {
    let mut feed = CueFeed::new();
    feed.append(cue(1, CuePriority::Normal));
    feed.append(cue(2, CuePriority::Urgent));
    feed.append(cue(3, CuePriority::Normal));

    let texts: Vec<&str> = feed.history().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["cue 3", "cue 2", "cue 1"]);
}

#[test]
fn identical_cues_keep_their_arrival_positions() {
    let mut feed = CueFeed::new();
    let same = CueEvent::new("Someone laughed", "10:00:00", CuePriority::Normal);
    feed.append(same.clone());
    feed.append(cue(1, CuePriority::High));
    feed.append(same.clone());

    let history: Vec<&CueEvent> = feed.history().collect();
    assert_eq!(history[0], &same);
    assert_eq!(history[1].text, "cue 1");
    assert_eq!(history[2], &same);
}

#[tokio::test]
async fn store_appends_notify_subscribers_and_clear_resets() {
    let store = CueFeedStore::new();
    let mut updates = store.subscribe();
    assert!(store.latest().await.is_none());

    let waving = CueEvent::new("Alice is waving", "10:02:15", CuePriority::High);
    store.append(cue(0, CuePriority::Normal)).await;
    store.append(waving.clone()).await;

    assert_eq!(store.len().await, 2);
    assert_eq!(store.latest().await, Some(waving.clone()));
    assert_eq!(store.history().await[0], waving);
    assert_eq!(
        updates.recv().await.expect("update"),
        CueFeedUpdate::Appended(cue(0, CuePriority::Normal))
    );
    assert_eq!(
        updates.recv().await.expect("update"),
        CueFeedUpdate::Appended(waving)
    );

    store.clear().await;
    assert!(store.snapshot().await.is_empty());
    assert_eq!(updates.recv().await.expect("update"), CueFeedUpdate::Cleared);
}

#[tokio::test]
async fn concurrent_appends_are_all_recorded() {
    let store = CueFeedStore::new();
    let mut tasks = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store.append(cue(i, CuePriority::Normal)).await;
        }));
    }
    for task in tasks {
        task.await.expect("append task");
    }

    let history = store.history().await;
    assert_eq!(history.len(), 20);
    let mut texts: Vec<String> = history.into_iter().map(|c| c.text).collect();
    texts.sort();
    texts.dedup();
    assert_eq!(texts.len(), 20);
}
