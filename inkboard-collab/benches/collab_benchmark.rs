use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use inkboard_collab::broadcast::{BroadcastGroup, PeerInfo, RelayFrame};
use inkboard_collab::transport::{Transport, TransportEvent};
use inkboard_collab::wiring::Wiring;
use inkboard_core::{BoardBus, StrokeHead, StrokeMsg, StrokeStore};
use std::net::SocketAddr;
use std::rc::Rc;
use tokio::sync::mpsc;
use uuid::Uuid;

const POINTS_FRAME: &str = r#"{"kind":"stroke-points","id":"s","pts":[12.5,40.25]}"#;

fn peer(i: u16) -> PeerInfo {
    PeerInfo {
        conn_id: Uuid::new_v4(),
        addr: SocketAddr::from(([127, 0, 0, 1], 10_000 + i)),
    }
}

fn bench_broadcast_100_peers(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("broadcast_1_frame_100_peers", |b| {
        b.iter(|| {
            rt.block_on(async {
                let group = BroadcastGroup::new(1024);

                let mut receivers = Vec::new();
                for i in 0..100 {
                    receivers.push(group.add_peer(peer(i)).await);
                }

                let frame = RelayFrame { from: Uuid::new_v4(), text: POINTS_FRAME.to_string() };
                black_box(group.broadcast(black_box(frame)));
            });
        })
    });
}

fn bench_broadcast_1000_frames(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("broadcast_1000_frames_100_peers", |b| {
        b.iter(|| {
            rt.block_on(async {
                let group = BroadcastGroup::new(2048);

                let mut receivers = Vec::new();
                for i in 0..100 {
                    receivers.push(group.add_peer(peer(i)).await);
                }

                let from = Uuid::new_v4();
                for _ in 0..1000 {
                    group.broadcast(black_box(RelayFrame { from, text: POINTS_FRAME.to_string() }));
                }
            });
        })
    });
}

/// What the relay does per inbound frame before fan-out.
fn bench_relay_decode_merge(c: &mut Criterion) {
    let mut replica = StrokeStore::new("relay");
    replica.merge_stroke(&StrokeMsg::StrokeStart {
        stroke: StrokeHead {
            id: "s".to_string(),
            owner_id: "remote".to_string(),
            color: "#000000".to_string(),
            width: 2.0,
        },
        first: [0.0, 0.0],
    });

    c.bench_function("relay_decode_merge_points", |b| {
        b.iter(|| {
            let msg = StrokeMsg::decode(black_box(POINTS_FRAME)).unwrap();
            black_box(replica.merge_stroke(&msg));
        })
    });
}

struct NullTransport;

impl Transport for NullTransport {
    fn is_connected(&self) -> bool {
        true
    }

    fn send(&self, msg: &StrokeMsg) {
        black_box(msg);
    }
}

fn bench_wiring_pump_1000(c: &mut Criterion) {
    c.bench_function("wiring_pump_1000_frames", |b| {
        b.iter_batched(
            || {
                let store = StrokeStore::new("local").into_shared();
                let (tx, rx) = mpsc::channel(1024);
                let wiring =
                    Wiring::bind(store, Rc::new(BoardBus::new()), Rc::new(NullTransport), rx).unwrap();
                for i in 0..1000 {
                    let msg = StrokeMsg::StrokeStart {
                        stroke: StrokeHead {
                            id: format!("s{i}"),
                            owner_id: "remote".to_string(),
                            color: "#ef4444".to_string(),
                            width: 4.0,
                        },
                        first: [i as f64, 0.0],
                    };
                    tx.try_send(TransportEvent::Message(msg)).unwrap();
                }
                (wiring, tx)
            },
            |(mut wiring, _tx)| black_box(wiring.pump()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_broadcast_100_peers,
    bench_broadcast_1000_frames,
    bench_relay_decode_merge,
    bench_wiring_pump_1000,
);
criterion_main!(benches);
