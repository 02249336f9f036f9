use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use proptest::prelude::*;
use snafu::Snafu;
use tidings_core::{
    AccountId, FollowEdge, PageRequest, PageRequestError, Post, PostId, Timestamp, Visibility,
    feed_order,
};
use tokio::sync::watch;

use crate::{
    ContentQuery, ContentStore, FeedConfig, FeedConfigError, FeedError, FeedResolver,
    FixedClock, FollowEdgeStore, FollowGraphReader, PagePolicy, RequestCtx, Stage, StoreResult,
};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);
const HOUR: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Snafu)]
#[snafu(display("connection refused"))]
struct ConnectionRefused;

#[derive(Default)]
struct MemStore {
    follows: Vec<FollowEdge>,
    posts: Vec<Post>,
    fail_follows: bool,
    fail_content: bool,
    content_delay: Option<Duration>,
    follows_calls: AtomicUsize,
    content_calls: AtomicUsize,
}

impl MemStore {
    fn follow(mut self, follower: AccountId, following: AccountId) -> Self {
        self.follows.push(FollowEdge::new(follower, following));
        self
    }

    fn post(mut self, post: Post) -> Self {
        self.posts.push(post);
        self
    }
}

#[async_trait]
impl FollowEdgeStore for MemStore {
    async fn followed_by(&self, follower: AccountId) -> StoreResult<Vec<AccountId>> {
        self.follows_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_follows {
            return Err(ConnectionRefused.into());
        }
        Ok(self
            .follows
            .iter()
            .filter(|edge| edge.follower_id == follower)
            .map(|edge| edge.following_id)
            .collect())
    }
}

#[async_trait]
impl ContentStore for MemStore {
    async fn query_feed(&self, query: &ContentQuery) -> StoreResult<Vec<Post>> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.content_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_content {
            return Err(ConnectionRefused.into());
        }
        let filter = query.filter();
        let mut posts: Vec<_> = self
            .posts
            .iter()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();
        posts.sort_by(feed_order);
        Ok(posts
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .collect())
    }
}

/// Ignores the query and returns whatever it holds
struct CarelessStore(Vec<Post>);

#[async_trait]
impl ContentStore for CarelessStore {
    async fn query_feed(&self, _query: &ContentQuery) -> StoreResult<Vec<Post>> {
        Ok(self.0.clone())
    }
}

type TestResolver = FeedResolver<Arc<MemStore>, Arc<MemStore>, FixedClock>;

fn mk_resolver(
    store: MemStore,
    now: Timestamp,
    config: FeedConfig,
) -> (TestResolver, Arc<MemStore>) {
    let store = Arc::new(store);
    (
        FeedResolver::new(
            FollowGraphReader::new(store.clone()),
            store.clone(),
            FixedClock(now),
            config,
        ),
        store,
    )
}

fn post(author: AccountId, published_at: Timestamp) -> Post {
    Post::builder()
        .id(PostId::random())
        .author_id(author)
        .published_at(published_at)
        .build()
}

fn now() -> Timestamp {
    Timestamp::from_secs(1_700_000_000)
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn follows_nobody_skips_content_store() {
    let viewer = AccountId::random();
    let someone = AccountId::random();
    let store = MemStore::default()
        .follow(someone, viewer)
        .post(post(viewer, now()));
    let (resolver, store) = mk_resolver(store, now(), FeedConfig::default());

    let page = resolver
        .resolve_page(&RequestCtx::new(), viewer, Some(PageRequest::new(3, 7)))
        .await
        .expect("empty feed is not an error");

    assert!(page.posts.is_empty());
    assert_eq!((page.page, page.page_size), (3, 7));
    assert_eq!(store.follows_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.content_calls.load(Ordering::SeqCst), 0);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn excludes_future_private_and_deleted_posts() {
    let viewer = AccountId::random();
    let a = AccountId::random();
    let b = AccountId::random();
    let stranger = AccountId::random();

    let p1 = post(a, now().saturating_sub(DAY));
    let p2 = post(a, now().saturating_add(DAY));
    let p3 = Post {
        visibility: Visibility::Private,
        ..post(b, now())
    };
    let p4 = Post {
        deleted_at: Some(now()),
        ..post(b, now())
    };
    let p5 = post(stranger, now());
    let draft = Post {
        published_at: None,
        ..post(a, now())
    };

    let store = MemStore::default()
        .follow(viewer, a)
        .follow(viewer, b)
        .follow(a, stranger)
        .post(p1.clone())
        .post(p2)
        .post(p3)
        .post(p4)
        .post(p5)
        .post(draft);
    let (resolver, _) = mk_resolver(store, now(), FeedConfig::default());

    let page = resolver
        .resolve_page(&RequestCtx::new(), viewer, Some(PageRequest::new(1, 10)))
        .await
        .expect("resolves");

    assert_eq!(page.posts, vec![p1]);
    assert_eq!((page.page, page.page_size), (1, 10));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn pages_newest_first() {
    let viewer = AccountId::random();
    let a = AccountId::random();
    let b = AccountId::random();
    let t1 = post(a, now().saturating_sub(2 * HOUR));
    let t2 = post(b, now().saturating_sub(HOUR));

    let store = MemStore::default()
        .follow(viewer, a)
        .follow(viewer, b)
        .post(t1.clone())
        .post(t2.clone());
    let (resolver, _) = mk_resolver(store, now(), FeedConfig::default());
    let ctx = RequestCtx::new();

    let first = resolver
        .resolve_page(&ctx, viewer, Some(PageRequest::new(1, 1)))
        .await
        .expect("resolves");
    let second = resolver
        .resolve_page(&ctx, viewer, Some(PageRequest::new(2, 1)))
        .await
        .expect("resolves");
    let third = resolver
        .resolve_page(&ctx, viewer, Some(PageRequest::new(3, 1)))
        .await
        .expect("resolves");

    assert_eq!(first.posts, vec![t2]);
    assert_eq!(second.posts, vec![t1]);
    assert!(third.posts.is_empty());
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn missing_request_uses_configured_defaults() {
    let viewer = AccountId::random();
    let author = AccountId::random();
    let mut store = MemStore::default().follow(viewer, author);
    for i in 0..15 {
        store = store.post(post(author, now().saturating_sub(Duration::from_secs(i))));
    }
    let (resolver, _) = mk_resolver(store, now(), FeedConfig::default());

    let page = resolver
        .resolve_page(&RequestCtx::new(), viewer, None)
        .await
        .expect("resolves");

    assert_eq!((page.page, page.page_size), (1, 10));
    assert_eq!(page.posts.len(), 10);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn page_size_limit_is_enforced() {
    let viewer = AccountId::random();
    let author = AccountId::random();
    let store = MemStore::default()
        .follow(viewer, author)
        .post(post(author, now()));
    let config = FeedConfig::builder().max_page_size(25).build();
    let (resolver, store) = mk_resolver(store, now(), config);
    let ctx = RequestCtx::new();

    let page = resolver
        .resolve_page(&ctx, viewer, Some(PageRequest::new(1, 25)))
        .await
        .expect("max page size is allowed");
    assert_eq!(page.posts.len(), 1);

    let err = resolver
        .resolve_page(&ctx, viewer, Some(PageRequest::new(1, 26)))
        .await
        .expect_err("one above max is rejected");
    assert!(matches!(
        err,
        FeedError::InvalidPageRequest {
            source: PageRequestError::PageSizeTooHigh {
                page_size: 26,
                max: 25
            }
        }
    ));
    assert!(err.is_caller_error());

    for request in [PageRequest::new(0, 10), PageRequest::new(1, 0)] {
        let err = resolver
            .resolve_page(&ctx, viewer, Some(request))
            .await
            .expect_err("must be rejected");
        assert!(matches!(err, FeedError::InvalidPageRequest { .. }));
    }

    // Invalid requests are rejected before touching any store
    assert_eq!(store.follows_calls.load(Ordering::SeqCst), 1);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn clamp_policy_pulls_values_into_range() {
    let viewer = AccountId::random();
    let author = AccountId::random();
    let store = MemStore::default()
        .follow(viewer, author)
        .post(post(author, now()));
    let config = FeedConfig::builder()
        .max_page_size(5)
        .page_policy(PagePolicy::Clamp)
        .build();
    let (resolver, _) = mk_resolver(store, now(), config);

    let page = resolver
        .resolve_page(&RequestCtx::new(), viewer, Some(PageRequest::new(0, 500)))
        .await
        .expect("clamped");

    assert_eq!((page.page, page.page_size), (1, 5));
    assert_eq!(page.posts.len(), 1);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn store_failures_propagate() {
    let viewer = AccountId::random();
    let author = AccountId::random();

    let store = MemStore {
        fail_follows: true,
        ..MemStore::default().follow(viewer, author)
    };
    let (failing, store) = mk_resolver(store, now(), FeedConfig::default());
    let err = failing
        .resolve_page(&RequestCtx::new(), viewer, None)
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        FeedError::StoreUnavailable {
            store: Stage::FollowGraph,
            ..
        }
    ));
    assert!(!err.is_caller_error());
    assert_eq!(store.content_calls.load(Ordering::SeqCst), 0);

    let store = MemStore {
        fail_content: true,
        ..MemStore::default()
            .follow(viewer, author)
            .post(post(author, now()))
    };
    let (failing, _) = mk_resolver(store, now(), FeedConfig::default());
    let err = failing
        .resolve_page(&RequestCtx::new(), viewer, None)
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        FeedError::StoreUnavailable {
            store: Stage::Content,
            ..
        }
    ));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn deadline_bounds_slow_store() {
    let viewer = AccountId::random();
    let author = AccountId::random();
    let store = MemStore {
        content_delay: Some(Duration::from_secs(30)),
        ..MemStore::default()
            .follow(viewer, author)
            .post(post(author, now()))
    };
    let (resolver, _) = mk_resolver(store, now(), FeedConfig::default());

    let ctx = RequestCtx::new().with_timeout(Duration::from_millis(50));
    let err = resolver
        .resolve_page(&ctx, viewer, None)
        .await
        .expect_err("must time out");

    assert!(matches!(
        err,
        FeedError::DeadlineExceeded {
            stage: Stage::Content
        }
    ));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn expired_deadline_fails_before_any_read() {
    let viewer = AccountId::random();
    let (resolver, store) = mk_resolver(MemStore::default(), now(), FeedConfig::default());

    let ctx = RequestCtx::new().with_deadline(tokio::time::Instant::now());
    let err = resolver
        .resolve_page(&ctx, viewer, None)
        .await
        .expect_err("must fail");

    assert!(matches!(
        err,
        FeedError::DeadlineExceeded {
            stage: Stage::FollowGraph
        }
    ));
    assert_eq!(store.follows_calls.load(Ordering::SeqCst), 0);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn cancellation_interrupts_store_read() {
    let viewer = AccountId::random();
    let author = AccountId::random();
    let store = MemStore {
        content_delay: Some(Duration::from_secs(30)),
        ..MemStore::default()
            .follow(viewer, author)
            .post(post(author, now()))
    };
    let (resolver, _) = mk_resolver(store, now(), FeedConfig::default());

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctx = RequestCtx::new().with_cancel(cancel_rx);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = cancel_tx.send(true);
    });

    let err = resolver
        .resolve_page(&ctx, viewer, None)
        .await
        .expect_err("must be cancelled");

    assert!(matches!(
        err,
        FeedError::Cancelled {
            stage: Stage::Content
        }
    ));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn dropped_cancel_sender_is_not_cancellation() {
    let viewer = AccountId::random();
    let author = AccountId::random();
    let p = post(author, now());
    let store = MemStore::default().follow(viewer, author).post(p.clone());
    let (resolver, _) = mk_resolver(store, now(), FeedConfig::default());

    let (cancel_tx, cancel_rx) = watch::channel(false);
    drop(cancel_tx);

    let page = resolver
        .resolve_page(&RequestCtx::new().with_cancel(cancel_rx), viewer, None)
        .await
        .expect("resolves");

    assert_eq!(page.posts, vec![p]);
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn store_contract_violation_is_store_failure() {
    let viewer = AccountId::random();
    let author = AccountId::random();
    let graph = Arc::new(MemStore::default().follow(viewer, author));

    let private = Post {
        visibility: Visibility::Private,
        ..post(author, now())
    };
    let resolver = FeedResolver::new(
        FollowGraphReader::new(graph),
        CarelessStore(vec![private]),
        FixedClock(now()),
        FeedConfig::default(),
    );

    let err = resolver
        .resolve_page(&RequestCtx::new(), viewer, None)
        .await
        .expect_err("must fail");

    assert!(matches!(
        err,
        FeedError::StoreUnavailable {
            store: Stage::Content,
            ..
        }
    ));
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn unsorted_store_answer_is_sorted() {
    let viewer = AccountId::random();
    let author = AccountId::random();
    let graph = Arc::new(MemStore::default().follow(viewer, author));

    let older = post(author, now().saturating_sub(HOUR));
    let newer = post(author, now());
    let resolver = FeedResolver::new(
        FollowGraphReader::new(graph),
        CarelessStore(vec![older.clone(), newer.clone()]),
        FixedClock(now()),
        FeedConfig::default(),
    );

    let page = resolver
        .resolve_page(&RequestCtx::new(), viewer, None)
        .await
        .expect("resolves");

    assert_eq!(page.posts, vec![newer, older]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn pages_concatenate_to_one_big_page(
        // Few distinct times, so ties are common
        times in proptest::collection::vec(0u64..6, 0..40),
        page_size in 1i64..6,
        pages in 1i64..8,
    ) {
        let viewer = AccountId::random();
        let authors = [AccountId::random(), AccountId::random(), AccountId::random()];

        let mut store = MemStore::default();
        for author in authors {
            store = store.follow(viewer, author);
        }
        for (i, t) in times.iter().enumerate() {
            store = store.post(post(authors[i % authors.len()], Timestamp::from_secs(*t)));
        }
        let (resolver, _) = mk_resolver(store, Timestamp::from_secs(4), FeedConfig::default());

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Can't fail");

        let (concatenated, big, big_again) = rt.block_on(async {
            let ctx = RequestCtx::new();
            let mut concatenated = vec![];
            for page in 1..=pages {
                let page = resolver
                    .resolve_page(&ctx, viewer, Some(PageRequest::new(page, page_size)))
                    .await
                    .expect("resolves");
                concatenated.extend(page.posts);
            }
            let big = resolver
                .resolve_page(&ctx, viewer, Some(PageRequest::new(1, pages * page_size)))
                .await
                .expect("resolves");
            let big_again = resolver
                .resolve_page(&ctx, viewer, Some(PageRequest::new(1, pages * page_size)))
                .await
                .expect("resolves");
            (concatenated, big.posts, big_again.posts)
        });

        prop_assert_eq!(&concatenated, &big);
        prop_assert_eq!(&big, &big_again);
        for post in &big {
            prop_assert!(post.published_at <= Some(Timestamp::from_secs(4)));
        }
    }
}

#[test]
fn config_defaults_must_fit_limits() {
    assert_eq!(FeedConfig::default().validate(), Ok(()));
    assert_eq!(
        FeedConfig::builder()
            .default_page_size(25)
            .max_page_size(25)
            .build()
            .validate(),
        Ok(())
    );

    assert_eq!(
        FeedConfig::builder().default_page_size(200).build().validate(),
        Err(FeedConfigError::DefaultPageSizeOutOfRange {
            default_page_size: 200,
            max_page_size: 100,
        })
    );
    assert_eq!(
        FeedConfig::builder().default_page_size(0).build().validate(),
        Err(FeedConfigError::DefaultPageSizeOutOfRange {
            default_page_size: 0,
            max_page_size: 100,
        })
    );
    assert_eq!(
        FeedConfig::builder()
            .default_page_size(0)
            .max_page_size(0)
            .build()
            .validate(),
        Err(FeedConfigError::MaxPageSizeZero)
    );
}
