use std::sync::Arc;

use paraglider_ticker::{
    DeliveryError, InMemoryStores, Notifier, TickerConfig, TickerEngine, Timestamp, TrackMetadata,
    TrackService, TrackStore,
};

struct Silent;

impl Notifier for Silent {
    fn deliver(&self, _target_url: &str, _message: &str) -> Result<(), DeliveryError> {
        Ok(())
    }
}

fn metadata(pilot: &str) -> TrackMetadata {
    TrackMetadata {
        h_date: "2016-02-19".to_string(),
        pilot: pilot.to_string(),
        glider: "RV8".to_string(),
        glider_id: "EXP-2".to_string(),
        track_length: 443.2,
        track_url: format!("http://skypolaris.org/{pilot}.igc"),
    }
}

#[test]
fn ticker_pages_through_service_ingest() {
    let config = TickerConfig {
        page_cap: 3,
        ..TickerConfig::default()
    };
    let service = TrackService::in_memory(Arc::new(Silent), &config).unwrap();
    assert!(service.ticker().window_from_start().unwrap().is_none());

    let ids: Vec<_> = (0..7)
        .map(|i| service.ingest(metadata(&format!("pilot{i}"))).unwrap().track.id)
        .collect();
    assert_eq!(service.track_ids().unwrap(), ids);
    assert_eq!(service.track_count().unwrap(), 7);

    let first = service.ticker().window_from_start().unwrap().unwrap();
    assert_eq!(first.ids, ids[..3]);
    let second = service.ticker().window_after(first.stop).unwrap().unwrap();
    assert_eq!(second.ids, ids[3..6]);
    let third = service.ticker().window_after(second.stop).unwrap().unwrap();
    assert_eq!(third.ids, ids[6..]);
    assert_eq!(third.stop, third.latest);

    let done = service.ticker().window_after(third.stop).unwrap().unwrap();
    assert!(done.is_empty());
    assert_eq!(done.start, Timestamp::ZERO);
    assert_eq!(done.stop, Timestamp::ZERO);
    assert_eq!(done.latest, third.latest);

    service.shutdown();
}

#[test]
fn stored_track_keeps_metadata() {
    let service = TrackService::in_memory(Arc::new(Silent), &TickerConfig::default()).unwrap();
    let receipt = service.ingest(metadata("Aldo")).unwrap();

    let stored = service.track(receipt.track.id).unwrap().unwrap();
    assert_eq!(stored.metadata.pilot, "Aldo");
    assert_eq!(stored.metadata.track_length, 443.2);

    let json = serde_json::to_value(&stored).unwrap();
    assert_eq!(json["H_date"], "2016-02-19");
    assert_eq!(json["timestamp"], stored.ingested_at.as_millis());
    service.shutdown();
}

#[test]
fn purge_empties_the_ticker() {
    let service = TrackService::in_memory(Arc::new(Silent), &TickerConfig::default()).unwrap();
    for i in 0..4 {
        service.ingest(metadata(&format!("p{i}"))).unwrap();
    }
    assert_eq!(service.purge_tracks().unwrap(), 4);
    assert_eq!(service.track_count().unwrap(), 0);
    assert!(service.ticker().latest_timestamp().unwrap().is_none());
    assert!(service.ticker().window_after(Timestamp::ZERO).unwrap().is_none());
    service.shutdown();
}

#[test]
fn same_instant_ingests_get_distinct_increasing_timestamps() {
    let stores = InMemoryStores::new();
    let tracks: Arc<dyn TrackStore> = Arc::new(stores.tracks);
    let at = Timestamp::from_millis(1_000);

    let a = tracks.append(metadata("a"), at).unwrap();
    let b = tracks.append(metadata("b"), at).unwrap();
    let c = tracks.append(metadata("c"), Timestamp::from_millis(999)).unwrap();
    assert!(a.ingested_at < b.ingested_at && b.ingested_at < c.ingested_at);

    let ticker = TickerEngine::new(tracks, 5).unwrap();
    let window = ticker.window_after(a.ingested_at).unwrap().unwrap();
    assert_eq!(window.ids, vec![b.id, c.id]);
}
