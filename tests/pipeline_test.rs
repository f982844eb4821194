use chrono::NaiveDate;
use journal_subscription::clients::{CrossrefClient, NotionClient};
use journal_subscription::config::NotionConfig;
use journal_subscription::services::{MetadataFetcher, NotionWorkspace};
use journal_subscription::testing::{FakeModel, FakeSource, FakeStore};
use journal_subscription::{App, Article, Config, RunSummary, Subscription};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn subscription(id: &str, journal: &str, issn: &str) -> Subscription {
    Subscription {
        id: id.to_string(),
        journal: journal.to_string(),
        online_issn: issn.to_string(),
        print_issn: String::new(),
        start_date: None,
        last_update: None,
        enabled: true,
    }
}

fn article(title: &str, volume: &str, issue: &str) -> Article {
    Article {
        title: title.to_string(),
        journal: "Nature Genetics".to_string(),
        volume: volume.to_string(),
        issue: issue.to_string(),
        year: Some(2024),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_run_continues_past_failed_subscription() {
    let mut disabled = subscription("page-3", "Disabled", "0000-0000");
    disabled.enabled = false;
    let store = Arc::new(FakeStore::with_subscriptions(vec![
        subscription("page-1", "No ISSN", ""),
        subscription("page-2", "Nature Genetics", "1546-1718"),
        disabled,
    ]));
    let source = Arc::new(FakeSource::with_articles(vec![
        article("A", "56", "8"),
        article("B", "56", "8"),
        article("C", "56", "9"),
    ]));
    let app = App::from_parts(
        store.clone(),
        source.clone(),
        Arc::new(FakeModel::replying("中文标题")),
    );

    let summary = app.run_on(date(2024, 8, 31)).await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            total: 2,
            succeeded: 1,
            failed: 1,
            articles_written: 3,
            summaries_written: 2,
        }
    );
    assert_eq!(source.fetches().len(), 1);
    assert_eq!(source.fetches()[0].from, date(2024, 8, 1));

    let statuses: Vec<(String, String)> = store
        .statuses()
        .into_iter()
        .map(|s| (s.subscription_id, s.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("page-1".to_string(), "错误：缺少ISSN".to_string()),
            ("page-2".to_string(), "成功：推送3篇文章".to_string()),
        ]
    );

    assert!(store.articles().iter().all(|a| a.title_cn == "中文标题"));
    let counts: Vec<usize> = store.summaries().iter().map(|s| s.article_count).collect();
    assert_eq!(counts, vec![2, 1]);
}

#[tokio::test]
async fn test_full_run_against_mock_services() {
    let mut server = Server::new_async().await;

    let listing = server
        .mock("POST", "/v1/databases/subs/query")
        .with_status(200)
        .with_body(
            json!({"results": [{
                "id": "page-1",
                "properties": {
                    "Journal": {"type": "title", "title": [{"plain_text": "Nature Genetics"}]},
                    "Online ISSN": {"type": "rich_text", "rich_text": [{"plain_text": "1546-1718"}]},
                    "Print ISSN": {"type": "rich_text", "rich_text": []},
                    "起始抓取日期": {"type": "date", "date": {"start": "2024-01-01"}},
                    "最后更新日期": {"type": "date", "date": {"start": "2024-05-01"}},
                    "是否启用订阅": {"type": "checkbox", "checkbox": true}
                }
            }]})
            .to_string(),
        )
        .create_async()
        .await;

    let works = server
        .mock("GET", "/works")
        .match_query(Matcher::UrlEncoded(
            "filter".into(),
            "issn:1546-1718,from-pub-date:2024-05-01,until-pub-date:2024-06-01".into(),
        ))
        .with_status(200)
        .with_body(
            json!({
                "status": "ok",
                "message": {
                    "total-results": 1,
                    "items": [{
                        "DOI": "10.1038/s41588-024-0001",
                        "title": ["Enhancer grammar"],
                        "author": [{"given": "Ada", "family": "Lovelace"}],
                        "published-print": {"date-parts": [[2024, 5, 20]]},
                        "volume": "56",
                        "issue": "5",
                        "container-title": ["Nature Genetics"]
                    }]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let article_page = server
        .mock("POST", "/v1/pages")
        .match_body(Matcher::PartialJson(json!({
            "parent": {"database_id": "arts"},
            "properties": {
                "标题": {"rich_text": [{"text": {"content": "增强子语法"}}]},
                "YearQuarter": {"rich_text": [{"text": {"content": "2024Q2"}}]},
                "上传日期": {"date": {"start": "2024-06-01"}}
            }
        })))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let summary_page = server
        .mock("POST", "/v1/pages")
        .match_body(Matcher::PartialJson(json!({
            "parent": {"database_id": "sums"},
            "properties": {
                "文章数量": {"number": 1.0},
                "小结生成日期": {"date": {"start": "2024-06-01"}}
            }
        })))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let status = server
        .mock("PATCH", "/v1/pages/page-1")
        .match_body(Matcher::PartialJson(json!({
            "properties": {
                "最近处理日期": {"date": {"start": "2024-06-01"}},
                "最近处理状态": {"rich_text": [{"text": {"content": "成功：推送1篇文章"}}]},
                "最后更新日期": {"date": {"start": "2024-06-01"}}
            }
        })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let notion = NotionConfig {
        api_key: "ntn_test".to_string(),
        subscriptions_db: "subs".to_string(),
        articles_db: "arts".to_string(),
        summaries_db: "sums".to_string(),
        base_url: server.url(),
    };
    let app = App::from_parts(
        Arc::new(NotionWorkspace::new(NotionClient::new(&notion), &notion)),
        Arc::new(MetadataFetcher::new(CrossrefClient::with_base_url(&server.url()))),
        Arc::new(FakeModel::replying("增强子语法")),
    );

    let summary = app.run_on(date(2024, 6, 1)).await.unwrap();

    listing.assert_async().await;
    works.assert_async().await;
    article_page.assert_async().await;
    summary_page.assert_async().await;
    status.assert_async().await;
    assert_eq!(summary.articles_written, 1);
    assert_eq!(summary.summaries_written, 1);
}

#[tokio::test]
#[ignore] // 需要真实凭证，手动运行：cargo test -- --ignored
async fn test_live_run() {
    journal_subscription::utils::logging::init();

    let config = Config::load_validated().expect("加载配置失败");
    let summary = App::new(&config).run().await.expect("运行失败");

    println!("{:?}", summary);
}
