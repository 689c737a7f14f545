//! End-to-end pipeline tests against local sources

mod common;

use common::{RecordingObserver, SNI_LIST, unreachable_address};
use sni_ranges::pipeline;
use sni_ranges::{
    ChannelSink, CollectingSink, Config, Error, Event, ExtractionMode, Fetcher, NoopObserver,
    Pipeline, RetryConfig, SourceConfig,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(sources: Vec<SourceConfig>, mode: ExtractionMode, concurrency: usize) -> Config {
    Config {
        sources,
        concurrency,
        mode,
        retry: RetryConfig {
            max_attempts: 3,
            backoff: Duration::from_millis(20),
        },
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

async fn mount_list(server: &MockServer, route: &str, body: &str) -> String {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
    format!("{}{}", server.uri(), route)
}

#[tokio::test]
async fn test_one_source_up_one_unreachable() {
    let mock_server = MockServer::start().await;
    let a = mount_list(&mock_server, "/a.txt", "1.2.3.4 [x y]\n").await;
    let b = unreachable_address().await;

    let config = test_config(
        vec![SourceConfig::new("A", &a), SourceConfig::new("B", &b)],
        ExtractionMode::RawLine,
        2,
    );
    let pipeline = Pipeline::new(config, Arc::new(NoopObserver)).unwrap();
    let sink = Arc::new(CollectingSink::new());

    let reports = pipeline.run(&[String::new()], sink.clone()).await.unwrap();

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.outcomes.len(), 2);
    assert!(report.get(&a).unwrap().is_success());
    let failed = report.get(&b).unwrap();
    assert!(!failed.is_success());
    assert_eq!(failed.attempts(), 3);
    assert!(matches!(failed.error(), Some(Error::Transport(_))));

    assert_eq!(sink.items(), vec!["1.2.3.4 [x y]"]);
}

#[tokio::test]
async fn test_queries_run_as_sequential_passes() {
    let mock_server = MockServer::start().await;
    let first = mount_list(&mock_server, "/first.txt", SNI_LIST).await;
    let second = mount_list(
        &mock_server,
        "/second.txt",
        "8.8.8.8 -- [dns.example.com]\n9.9.9.9 -- [quad9.test]\n",
    )
    .await;

    let observer = RecordingObserver::new();
    let config = test_config(
        vec![
            SourceConfig::new("First", &first),
            SourceConfig::new("Second", &second),
        ],
        ExtractionMode::Subdomains,
        2,
    );
    let pipeline = Pipeline::new(config, Arc::new(observer.clone())).unwrap();
    let sink = Arc::new(CollectingSink::new());

    let queries = vec!["example.com".to_string(), "quad9".to_string()];
    let reports = pipeline.run(&queries, sink.clone()).await.unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].query, "example.com");
    assert_eq!(reports[1].query, "quad9");
    assert!(reports.iter().all(|r| r.is_success()));

    // No overlap between passes: the second pass starts after the first completes
    let pass_events: Vec<_> = observer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::PassStarted { query, .. } => Some(format!("start:{query}")),
            Event::PassCompleted { query, .. } => Some(format!("end:{query}")),
            _ => None,
        })
        .collect();
    assert_eq!(
        pass_events,
        vec![
            "start:example.com",
            "end:example.com",
            "start:quad9",
            "end:quad9"
        ]
    );

    let items = sink.items();
    let (first_pass, second_pass) = items.split_at(items.len() - 1);
    let mut first_pass = first_pass.to_vec();
    first_pass.sort();
    assert_eq!(
        first_pass,
        vec![
            "api.example.com",
            "dns.example.com",
            "example.com",
            "www.example.com"
        ]
    );
    assert_eq!(second_pass, ["quad9.test".to_string()]);
}

#[tokio::test]
async fn test_wildcard_query_from_input() {
    let mock_server = MockServer::start().await;
    let list = mount_list(&mock_server, "/list.txt", SNI_LIST).await;

    let input: &[u8] = b"*.cloudfront.net\n\n";
    let queries = sni_ranges::query::read_queries(input).await.unwrap();
    assert_eq!(queries, vec!["cloudfront.net"]);

    let config = test_config(
        vec![SourceConfig::new("List", &list)],
        ExtractionMode::Ipv4Prefix,
        1,
    );
    let pipeline = Pipeline::new(config, Arc::new(NoopObserver)).unwrap();
    let (sink, mut rx) = ChannelSink::new();

    let reports = pipeline.run(&queries, Arc::new(sink)).await.unwrap();
    assert!(reports[0].is_success());
    assert_eq!(rx.recv().await.unwrap(), "13.32.0.10");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_free_run_with_explicit_parameters() {
    let mock_server = MockServer::start().await;
    let addresses: Vec<String> = vec![
        mount_list(&mock_server, "/1.txt", "1.1.1.1 [one.test]\n").await,
        mount_list(&mock_server, "/2.txt", "2.2.2.2 [two.test]\n").await,
        mount_list(&mock_server, "/3.txt", "3.3.3.3 [three.test]\n").await,
    ];
    let fetcher = Arc::new(Fetcher::with_client(
        reqwest::Client::new(),
        RetryConfig::default(),
        Arc::new(NoopObserver),
    ));
    let sink = Arc::new(CollectingSink::new());

    let reports = pipeline::run(
        fetcher,
        &["".to_string(), ".test".to_string()],
        &addresses,
        ExtractionMode::Ipv4Prefix,
        2,
        sink.clone(),
    )
    .await
    .unwrap();

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.outcomes.len() == 3 && r.is_success()));

    let mut items = sink.items();
    items.sort();
    assert_eq!(
        items,
        vec!["1.1.1.1", "1.1.1.1", "2.2.2.2", "2.2.2.2", "3.3.3.3", "3.3.3.3"]
    );
}

#[tokio::test]
async fn test_config_file_drives_pipeline() {
    let mock_server = MockServer::start().await;
    let list = mount_list(&mock_server, "/list.txt", SNI_LIST).await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    let json = serde_json::json!({
        "sources": [{"name": "Local", "url": list}],
        "concurrency": 1,
        "mode": "subdomains",
        "retry": {"max_attempts": 1, "backoff": 0},
    });
    tokio::fs::write(&config_path, json.to_string()).await.unwrap();

    let config = Config::from_json_file(&config_path).await.unwrap();
    let pipeline = Pipeline::new(config, Arc::new(NoopObserver)).unwrap();
    let sink = Arc::new(CollectingSink::new());
    pipeline
        .run(&["cloudfront".to_string()], sink.clone())
        .await
        .unwrap();

    assert_eq!(sink.items(), vec!["d1.cloudfront.net"]);
}
