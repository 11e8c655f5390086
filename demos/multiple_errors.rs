//! Several fallible sources merged with fan-in, two fallible transform pools and
//! a fallible aggregation, all watched by a single `read_err`.
//!
//! Run with: cargo run --example multiple_errors

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use stageweld::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SUFFIXES: [&str; 5] = ["/v1", "/v1/foo", "/v1/foo/{}", "/v1/bar", "/v1/bar/{}"];

/// Fails for roughly one call in two hundred, deterministically per input.
fn try_fail(stage: &str, subject: &str) -> Result<()> {
    let mut hasher = DefaultHasher::new();
    (stage, subject).hash(&mut hasher);
    if hasher.finish() % 200 == 0 {
        return Err(Error::custom(format!("failed: {stage} {subject}")));
    }
    Ok(())
}

fn crawl(pp: &Pipeline, base_url: &'static str) -> (Conduit<String>, Oneshot<Error>) {
    generate_err(pp, move |w| async move {
        for suffix in SUFFIXES {
            let url = format!("{base_url}{suffix}");
            if !url.ends_with("{}") {
                if !w.write(url).await {
                    return Ok(());
                }
                continue;
            }

            for k in 0..10 {
                try_fail("collecting", base_url)?;
                if !w.write(url.replace("{}", &k.to_string())).await {
                    return Ok(());
                }
            }
        }
        Ok::<(), Error>(())
    })
}

async fn download(url: String) -> Result<String> {
    tokio::time::sleep(Duration::from_millis(200)).await;
    try_fail("downloading", &url)?;
    info!(%url, "downloaded");
    Ok(format!("<content:{url:?}>"))
}

async fn stats(content: String) -> Result<usize> {
    tokio::time::sleep(Duration::from_millis(100)).await;
    try_fail("stats for", &content)?;
    info!(%content, len = content.len(), "stats");
    Ok(content.len())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let pp = Pipeline::builder().name("multiple_errors").build();

    let (urls1, urls_err1) = crawl(&pp, "www.foo.com");
    let (urls2, urls_err2) = crawl(&pp, "www.bar.com");
    let (urls3, urls_err3) = crawl(&pp, "www.quz.com");

    let urls = fan_in(&pp, vec![urls1, urls2, urls3]);
    let urls_err = first_err(&pp, vec![urls_err1, urls_err2, urls_err3]);

    let (contents, contents_err) = transform_err(&pp, 5, urls, download);
    let (sizes, sizes_err) = transform_err(&pp, 2, contents, stats);

    let reader = pp.clone();
    let (total, total_err) = collect_err(&pp, async move {
        let mut sum = 0;
        while let Some(size) = read(&reader, &sizes).await {
            try_fail("collect", &size.to_string())?;
            sum += size;
        }
        Ok::<usize, Error>(sum)
    });

    match read_err(&pp, &total, &[urls_err, contents_err, sizes_err, total_err]).await {
        Ok(sum) => info!(sum, "results"),
        Err(err) => warn!(%err, "**STOPPING**"),
    }

    info!("shutting down...");
    pp.shutdown().await;
    info!("shutdown finished");
}
