use criterion::{Criterion, black_box, criterion_group, criterion_main};

use stormstream_protocol::options::TrimOptions;
use stormstream_protocol::{ClaimModifiers, CommandExecutor};
use stormstream_storage::Db;

fn fields(i: usize) -> Vec<(String, String)> {
    vec![("field".to_string(), format!("value:{i}"))]
}

fn bench_xadd_sequential(c: &mut Criterion) {
    c.bench_function("xadd_sequential_10k", |b| {
        b.iter(|| {
            let db = Db::new();
            for i in 0..10_000 {
                black_box(db.xadd("stream", true, None, "*", fields(i)).unwrap());
            }
        })
    });
}

fn bench_xadd_with_trim(c: &mut Criterion) {
    let trim = TrimOptions::max_len(1_000).approximate_with_limit(100);

    c.bench_function("xadd_maxlen_1k_10k", |b| {
        b.iter(|| {
            let db = Db::new();
            for i in 0..10_000 {
                black_box(db.xadd("stream", true, Some(&trim), "*", fields(i)).unwrap());
            }
        })
    });
}

fn bench_xadd_concurrent(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("xadd_concurrent_4_tasks_10k", |b| {
        b.iter(|| {
            rt.block_on(async {
                let db = Db::new();
                let mut handles = Vec::new();

                for t in 0..4 {
                    let db = db.clone();
                    handles.push(tokio::spawn(async move {
                        for i in 0..2_500 {
                            let args = vec![
                                format!("stream:{t}"),
                                "*".to_string(),
                                "field".to_string(),
                                format!("value:{i}"),
                            ];
                            black_box(db.execute("XADD", args).await.unwrap());
                        }
                    }));
                }

                for h in handles {
                    h.await.unwrap();
                }
            });
        })
    });
}

fn bench_read_and_claim(c: &mut Criterion) {
    c.bench_function("xreadgroup_xclaim_1k", |b| {
        b.iter(|| {
            let db = Db::new();
            let mut ids = Vec::with_capacity(1_000);
            for i in 0..1_000 {
                let id = db.xadd("stream", true, None, "*", fields(i)).unwrap().unwrap();
                ids.push(id.to_string());
            }
            db.xgroup_create("stream", "group", "0", false).unwrap();
            db.xreadgroup("group", "alice", None, &[("stream".into(), ">".into())])
                .unwrap();
            black_box(
                db.xclaim("stream", "group", "bob", 0, &ids, &ClaimModifiers::default())
                    .unwrap(),
            );
        })
    });
}

criterion_group!(
    benches,
    bench_xadd_sequential,
    bench_xadd_with_trim,
    bench_xadd_concurrent,
    bench_read_and_claim,
);
criterion_main!(benches);
