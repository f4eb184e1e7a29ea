mod support;

use std::sync::Mutex;

use tempfile::TempDir;

use nufeed_core::prelude::*;

use support::WarningCounter;

/// Fails every url containing "down", succeeds otherwise.
#[derive(Default)]
struct FakeHttp {
    calls: Mutex<Vec<String>>,
}

impl HttpProbe for FakeHttp {
    async fn probe(&self, url: &str, _credentials: Option<&Credentials>) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(url.to_string());
        if url.contains("down") {
            anyhow::bail!("timed out");
        }
        Ok(())
    }
}

#[tokio::test]
async fn missing_local_feed_warns_exactly_once() {
    let (warnings, _guard) = WarningCounter::install();
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("no-such-feed");
    let source = PackageSource::local(missing.to_string_lossy());

    let prober = Prober::new(FakeHttp::default());
    prober.warn_if_unreachable(&source).await;

    assert_eq!(warnings.count(), 1);
}

#[tokio::test]
async fn existing_local_feed_is_quiet() {
    let (warnings, _guard) = WarningCounter::install();
    let temp = TempDir::new().unwrap();
    let source = PackageSource::local(temp.path().to_string_lossy());

    let prober = Prober::new(FakeHttp::default());
    assert!(prober.check(&source).await.is_reachable());
    prober.warn_if_unreachable(&source).await;

    assert_eq!(warnings.count(), 0);
}

#[tokio::test]
async fn quoted_local_feed_path_is_unquoted() {
    let temp = TempDir::new().unwrap();
    let quoted = format!("\"{}\"", temp.path().display());

    let prober = Prober::new(FakeHttp::default());
    let outcome = prober.check(&PackageSource::local(quoted)).await;

    assert!(outcome.is_reachable());
}

#[tokio::test]
async fn unreachable_remote_feed_warns_and_returns() {
    let (warnings, _guard) = WarningCounter::install();
    let prober = Prober::new(FakeHttp::default());

    prober
        .warn_if_unreachable(&PackageSource::nuget_v2("https://down.example.com/api/v2"))
        .await;
    prober
        .warn_if_unreachable(&PackageSource::nuget_v2("https://up.example.com/api/v2"))
        .await;

    assert_eq!(warnings.count(), 1);
}

#[tokio::test]
async fn all_sources_are_probed_independently() {
    let temp = TempDir::new().unwrap();
    let sources = vec![
        PackageSource::nuget_v3("https://up.example.com/v3/index.json"),
        PackageSource::nuget_v2("https://down.example.com/api/v2"),
        PackageSource::local(temp.path().to_string_lossy()),
        PackageSource::local(temp.path().join("missing").to_string_lossy()),
    ];

    let prober = Prober::new(FakeHttp::default());
    let outcomes = prober.warn_all_unreachable(&sources).await;

    assert_eq!(outcomes.len(), 4);
    let mut unreachable: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.is_reachable())
        .map(ProbeOutcome::url)
        .collect();
    unreachable.sort();

    let missing = temp.path().join("missing").to_string_lossy().into_owned();
    let mut expected = vec!["https://down.example.com/api/v2", missing.as_str()];
    expected.sort();
    assert_eq!(unreachable, expected);
}

#[cfg(unix)]
#[tokio::test]
async fn file_url_feed_to_existing_directory_is_reachable() {
    let (warnings, _guard) = WarningCounter::install();
    let temp = TempDir::new().unwrap();
    let parser = SourceParser::new().with_platform(Platform::Posix);
    let source = parser
        .parse_url(&format!("file://{}", temp.path().display()), None)
        .unwrap();
    assert!(source.is_local());

    let prober = Prober::new(FakeHttp::default());
    assert!(prober.check(&source).await.is_reachable());
    prober.warn_if_unreachable(&source).await;

    assert_eq!(warnings.count(), 0);
}

#[tokio::test]
async fn cache_backed_feeds_are_probed_with_sources() {
    let temp = TempDir::new().unwrap();
    let cache_dir = temp.path().join("nupkgs");
    std::fs::create_dir(&cache_dir).unwrap();

    let parser = SourceParser::new().with_platform(Platform::Posix);
    let file = parser
        .parse_sources(&format!(
            "source https://up.example.com/api/v2\ncache \"{}\" versions: all\ncache {}\n",
            cache_dir.display(),
            temp.path().join("missing-cache").display()
        ))
        .unwrap();

    let sources = file.all_sources();
    assert_eq!(sources.len(), 3);
    assert_eq!(sources[1].cache(), Some(&file.caches[0]));

    let prober = Prober::new(FakeHttp::default());
    let outcomes = prober.warn_all_unreachable(&sources).await;

    let unreachable: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.is_reachable())
        .map(ProbeOutcome::url)
        .collect();
    let missing = temp.path().join("missing-cache").to_string_lossy().into_owned();
    assert_eq!(unreachable, vec![missing.as_str()]);
}
