mod support;

use std::time::Duration;

use novel_ingest::core::error::IngestError;
use novel_ingest::core::model::ImportRequest;

use support::{FixtureSite, Harness, Routes, fanmtl_novel};

#[tokio::test]
async fn imports_requested_range_across_toc_pages() {
    let site = FixtureSite::spawn(fanmtl_novel(20));
    let h = Harness::new().await;
    let orchestrator = h.orchestrator(site.config(&["fanmtl.com"]));

    let request = ImportRequest::builder()
        .source_url(site.url("fanmtl.com", "/novel/mp.html"))
        .start_chapter(5)
        .end_chapter(7)
        .build();
    let outcome = orchestrator.run(request).await.unwrap();

    assert!(!outcome.reused);
    assert_eq!(outcome.source_tag, "fanmtl");
    assert_eq!(outcome.chapters_saved, 3);
    assert_eq!(outcome.first_order_index, 5);

    let novel = h.store.novel(outcome.novel_id).await.unwrap().unwrap();
    assert_eq!(novel.title, "Martial Peak");
    assert_eq!(novel.author, "Momo");
    assert_eq!(novel.tags, "fanmtl");
    assert_eq!(
        novel.cover_url.as_deref(),
        Some(site.url("fanmtl.com", "/cover.jpg").as_str())
    );

    let chapters = h.store.chapters(outcome.novel_id).await.unwrap();
    let titles: Vec<_> = chapters.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["Chapter 5: Title 5", "Chapter 6: Title 6", "Chapter 7: Title 7"]);
    let orders: Vec<_> = chapters.iter().map(|c| c.order_index).collect();
    assert_eq!(orders, [5, 6, 7]);
    assert_eq!(chapters[0].content, "Body of chapter 5.\n\nSecond & last.");

    // 主页 + 3 个目录分页 + 3 章
    let hits = site.hits();
    assert_eq!(hits.len(), 7);
    assert!(hits.contains(&"/e/extend/fy.php?page=3&wjm=mp".to_string()));
    assert!(!hits.contains(&"/novel/mp_8.html".to_string()));

    // 第 1 页重复的第 5 章只保留主页上的那一条
    assert!(h.log.contains("TOC page returned 6 chapter links."));
    assert!(h.log.contains("Total discovered chapter links: 20"));
    assert!(h.log.contains("Fetching chapter 5 (Chapter 5 Title 5)"));
    assert!(h.log.contains("Fetching chapter 6 (Chapter 6 Title 6)"));
    assert!(h.log.contains("Saved chapter 7 to DB."));
    assert!(h.log.contains("FanMTL import complete for novel ID"));
}

#[tokio::test]
async fn throttle_never_drops_below_site_floor() {
    let site = FixtureSite::spawn(fanmtl_novel(5));
    let h = Harness::new().await;
    let orchestrator = h.orchestrator(site.config(&["fanmtl.com"]));

    let request = ImportRequest::builder()
        .source_url(site.url("fanmtl.com", "/novel/mp.html"))
        .end_chapter(2)
        .throttle_seconds(0.1)
        .build();
    orchestrator.run(request).await.unwrap();

    // 首个请求不等待，其后每个请求等待 3 秒
    let requests = site.hits().len();
    let calls = h.sleeper.calls();
    assert_eq!(calls.len(), requests - 1);
    assert!(calls.iter().all(|d| *d == Duration::from_secs(3)));
}

#[tokio::test]
async fn failed_toc_page_is_skipped() {
    let mut routes = fanmtl_novel(20);
    routes.insert("/e/extend/fy.php?page=2&wjm=mp".into(), (500, "boom".into()));
    let site = FixtureSite::spawn(routes);
    let h = Harness::new().await;
    let orchestrator = h.orchestrator(site.config(&["fanmtl.com"]));

    let request = ImportRequest::builder()
        .source_url(site.url("fanmtl.com", "/novel/mp.html"))
        .start_chapter(15)
        .build();
    let outcome = orchestrator.run(request).await.unwrap();

    // 第 11-15 章缺失，剩余 15 章，第 15 个条目是原第 20 章
    assert_eq!(outcome.chapters_saved, 1);
    let chapters = h.store.chapters(outcome.novel_id).await.unwrap();
    assert_eq!(chapters[0].title, "Chapter 15: Title 20");
    assert!(h.log.contains("Warning: failed to fetch TOC page"));
    assert!(h.log.contains("Total discovered chapter links: 15"));
}

#[tokio::test]
async fn reimport_reuses_existing_novel() {
    let site = FixtureSite::spawn(fanmtl_novel(10));
    let h = Harness::new().await;
    let orchestrator = h.orchestrator(site.config(&["fanmtl.com"]));
    let url = site.url("fanmtl.com", "/novel/mp.html");

    let first = orchestrator
        .run(ImportRequest::builder().source_url(&url).end_chapter(3).build())
        .await
        .unwrap();
    let second = orchestrator
        .run(
            ImportRequest::builder()
                .source_url(&url)
                .start_chapter(4)
                .end_chapter(5)
                .build(),
        )
        .await
        .unwrap();

    assert!(!first.reused);
    assert!(second.reused);
    assert_eq!(first.novel_id, second.novel_id);
    assert_eq!(h.store.novel_count().await.unwrap(), 1);
    assert_eq!(h.store.chapters(first.novel_id).await.unwrap().len(), 5);
    assert!(h.log.contains("Reusing existing FanMTL novel"));
}

#[tokio::test]
async fn overlapping_reimport_rolls_back() {
    let site = FixtureSite::spawn(fanmtl_novel(10));
    let h = Harness::new().await;
    let orchestrator = h.orchestrator(site.config(&["fanmtl.com"]));
    let url = site.url("fanmtl.com", "/novel/mp.html");

    let first = orchestrator
        .run(ImportRequest::builder().source_url(&url).end_chapter(3).build())
        .await
        .unwrap();
    let err = orchestrator
        .run(
            ImportRequest::builder()
                .source_url(&url)
                .start_chapter(2)
                .end_chapter(4)
                .build(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Persistence(_)));
    assert_eq!(h.store.chapters(first.novel_id).await.unwrap().len(), 3);
    assert!(h.log.contains("ERROR:"));
}

#[tokio::test]
async fn chapter_failure_discards_whole_import() {
    let mut routes = fanmtl_novel(10);
    routes.remove("/novel/mp_3.html");
    let site = FixtureSite::spawn(routes);
    let h = Harness::new().await;
    let orchestrator = h.orchestrator(site.config(&["fanmtl.com"]));

    let err = orchestrator
        .run(
            ImportRequest::builder()
                .source_url(site.url("fanmtl.com", "/novel/mp.html"))
                .end_chapter(4)
                .build(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::HttpStatus { status: 404, .. }));
    assert_eq!(h.store.novel_count().await.unwrap(), 0);
    assert!(h.log.contains("Saved chapter 2 to DB."));
    assert!(!site.hits().contains(&"/novel/mp_4.html".to_string()));
}

#[tokio::test]
async fn unsupported_host_fails_before_any_request() {
    let site = FixtureSite::spawn(fanmtl_novel(3));
    let h = Harness::new().await;
    let orchestrator = h.orchestrator(site.config(&["unknown.example"]));

    let err = orchestrator
        .run(
            ImportRequest::builder()
                .source_url(site.url("unknown.example", "/novel/mp.html"))
                .allow_generic(false)
                .build(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::UnsupportedHost { ref host } if host == "unknown.example"));
    assert!(site.hits().is_empty());
    assert_eq!(h.store.novel_count().await.unwrap(), 0);
}

#[tokio::test]
async fn empty_chapter_list_is_an_error() {
    let mut routes = Routes::new();
    routes.insert(
        "/novel/empty.html".into(),
        (200, r#"<html><body><div class="main-head"><h1>Empty</h1></div></body></html>"#.into()),
    );
    let site = FixtureSite::spawn(routes);
    let h = Harness::new().await;
    let orchestrator = h.orchestrator(site.config(&["fanmtl.com"]));

    let err = orchestrator
        .run(ImportRequest::builder().source_url(site.url("fanmtl.com", "/novel/empty.html")).build())
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::NoChaptersFound));
    assert_eq!(h.store.novel_count().await.unwrap(), 0);
}

#[tokio::test]
async fn unreachable_landing_page_is_reported() {
    let site = FixtureSite::spawn(Routes::new());
    let h = Harness::new().await;
    let orchestrator = h.orchestrator(site.config(&["fanmtl.com"]));

    let err = orchestrator
        .run(ImportRequest::builder().source_url(site.url("fanmtl.com", "/novel/gone.html")).build())
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::UnreachablePage { .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn generic_adapter_follows_next_links() {
    let page = |title: &str, body: &str, next: Option<&str>| {
        let nav = next
            .map(|href| format!(r#"<a href="{href}">Next »</a>"#))
            .unwrap_or_default();
        format!(
            r#"<html><body><h1>{title}</h1>
            <div class="entry"><p>{body} The story keeps going for quite a while here.</p></div>
            {nav}</body></html>"#
        )
    };

    let mut routes = Routes::new();
    routes.insert("/story/one.html".into(), (200, page("The Beginning", "Dawn.", Some("/story/two.html"))));
    routes.insert("/story/two.html".into(), (200, page("The Middle", "Noon.", Some("/story/three.html"))));
    routes.insert("/story/three.html".into(), (200, page("The End", "Dusk.", None)));
    let site = FixtureSite::spawn(routes);
    let h = Harness::new().await;
    let orchestrator = h.orchestrator(site.config(&["serial.example"]));

    let outcome = orchestrator
        .run(ImportRequest::builder().source_url(site.url("serial.example", "/story/one.html")).build())
        .await
        .unwrap();

    assert_eq!(outcome.source_tag, "generic");
    assert_eq!(outcome.chapters_saved, 3);

    let chapters = h.store.chapters(outcome.novel_id).await.unwrap();
    let titles: Vec<_> = chapters.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, ["Chapter 1: The Beginning", "Chapter 2: The Middle", "Chapter 3: The End"]);
    assert!(chapters[2].content.starts_with("Dusk."));

    // 串联页携带正文，导入阶段不再重复请求
    assert_eq!(site.hits().len(), 3);
    assert!(h.log.contains("No chapter list found; following next-chapter links."));
}

#[tokio::test]
async fn cancelled_import_is_rolled_back() {
    let site = FixtureSite::spawn(fanmtl_novel(5));
    let h = Harness::new().await;
    let orchestrator = h.orchestrator(site.config(&["fanmtl.com"]));
    orchestrator.cancel_token().cancel();

    let err = orchestrator
        .run(ImportRequest::builder().source_url(site.url("fanmtl.com", "/novel/mp.html")).build())
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Cancelled));
    assert_eq!(h.store.novel_count().await.unwrap(), 0);
    assert!(h.log.contains("Creating new FanMTL novel"));
    assert!(!site.hits().iter().any(|p| p.starts_with("/novel/mp_")));
    assert!(h.log.contains("ERROR: Import cancelled"));
}
