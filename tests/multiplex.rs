//! Integration tests for fan-in, first-of-N and combined value/error reads

use std::collections::HashSet;
use std::time::Duration;
use stageweld::prelude::*;
use stageweld::TryRecvError;

const DEADLINE: Duration = Duration::from_secs(2);

fn tagged(pp: &Pipeline, tag: u32, count: u32) -> Conduit<(u32, u32)> {
    generate(pp, move |w| async move {
        for k in 0..count {
            if !w.write((tag, k)).await {
                return;
            }
        }
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fan_in_merges_then_closes() {
    let pp = Pipeline::new();
    let merged = fan_in(&pp, vec![tagged(&pp, 0, 10), tagged(&pp, 1, 3), tagged(&pp, 2, 7)]);

    let mut seen = HashSet::new();
    while let Some(v) = tokio::time::timeout(DEADLINE, read(&pp, &merged))
        .await
        .expect("merged conduit never closed")
    {
        assert!(seen.insert(v), "duplicate value {v:?}");
    }

    assert_eq!(seen.len(), 20);
    pp.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fan_in_cancel_abandons_output() {
    let pp = Pipeline::new();
    let endless = generate(&pp, |w| async move { while w.write(1u8).await {} });
    let merged = fan_in(&pp, vec![endless]);

    assert_eq!(read(&pp, &merged).await, Some(1));
    pp.shutdown().await;

    // Drain whatever made it in before cancellation; the conduit must not end.
    while merged.try_recv().is_ok() {}
    assert_eq!(merged.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_first_takes_earliest_value() {
    let pp = Pipeline::new();
    let (_slow_tx, slow) = conduit::<&'static str>(1);
    let (fast_tx, fast) = conduit::<&'static str>(1);

    let winner = first(&pp, vec![slow, fast]);
    let writer = pp.clone();
    go(&pp, async move {
        write(&writer, &fast_tx, "fast").await;
    });

    let got = tokio::time::timeout(DEADLINE, winner.recv()).await.unwrap();
    assert_eq!(got, Some("fast"));
    pp.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_first_unwritten_when_all_close() {
    let pp = Pipeline::new();
    let inputs: Vec<Conduit<u32>> = (0..4)
        .map(|_| {
            let (tx, rx) = conduit(1);
            tx.close();
            rx
        })
        .collect();

    let result = first(&pp, inputs);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(pp.live_tasks(), 0);
    assert_eq!(result.try_recv(), None);
    pp.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_err_over_many_stages() -> Result<()> {
    let pp = Pipeline::new();

    let (numbers, gen_errs) = generate_err(&pp, |w| async move {
        for k in 0..20u32 {
            if !w.write(k).await {
                return Ok(());
            }
        }
        Ok(())
    });
    let (squares, sq_errs) = transform_err(&pp, 3, numbers, |x| async move { Ok(x * x) });
    let errors = vec![gen_errs, sq_errs];

    let mut total = 0;
    loop {
        match read_err(&pp, &squares, &errors).await {
            Ok(v) => total += v,
            Err(Error::ChannelClosed) => break,
            Err(err) => return Err(err),
        }
    }
    assert_eq!(total, (0..20).map(|x| x * x).sum::<u32>());

    pp.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_err_after_cancel_reports_cancelled() {
    let pp = Pipeline::new();
    let (_tx, values) = conduit::<u32>(1);
    let errs = OneshotMut::<Error>::new();

    pp.shutdown().await;
    let err = read_err(&pp, &values, &[errs.reader()]).await.unwrap_err();
    assert!(err.is_cancelled());
}
