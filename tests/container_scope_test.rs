// ABOUTME: Integration tests for container lifetime semantics under concurrency
// ABOUTME: Verifies scoped isolation across concurrent simulated requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

mod common;

use gitglance::container::{Container, Lifetime, Scope};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

struct Tagged {
    tag: u32,
}

fn counting_container() -> (Arc<Container>, Arc<AtomicU32>) {
    let constructed = Arc::new(AtomicU32::new(0));
    let counter = constructed.clone();

    let container = Container::new();
    container.register_factory("tagged", Lifetime::Scoped, move |_| {
        Ok(Tagged {
            tag: counter.fetch_add(1, Ordering::SeqCst),
        })
    });
    (Arc::new(container), constructed)
}

#[tokio::test]
async fn test_concurrent_scopes_receive_distinct_stable_instances() {
    common::init_test_logging();
    let (container, constructed) = counting_container();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let container = container.clone();
        handles.push(tokio::spawn(async move {
            let scope = Scope::new();
            let first: Arc<Tagged> = container.resolve_as("tagged", &scope).unwrap();
            // A request resolves its services repeatedly; the instance must
            // stay stable within the scope.
            for _ in 0..16 {
                tokio::task::yield_now().await;
                let again: Arc<Tagged> = container.resolve_as("tagged", &scope).unwrap();
                assert!(Arc::ptr_eq(&first, &again));
            }
            first.tag
        }));
    }

    let mut tags = Vec::new();
    for handle in handles {
        tags.push(handle.await.unwrap());
    }

    tags.sort_unstable();
    tags.dedup();
    assert_eq!(tags.len(), 8, "every simulated request got its own instance");
    assert_eq!(constructed.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn test_singleton_shared_across_concurrent_scopes() {
    common::init_test_logging();
    let container = Arc::new(Container::new());
    container.register_factory("shared", Lifetime::Singleton, |_| Ok(Tagged { tag: 7 }));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let container = container.clone();
        handles.push(tokio::spawn(async move {
            let instance: Arc<Tagged> = container.resolve_as("shared", &Scope::new()).unwrap();
            Arc::as_ptr(&instance) as usize
        }));
    }

    let mut pointers = Vec::new();
    for handle in handles {
        pointers.push(handle.await.unwrap());
    }
    pointers.dedup();
    assert_eq!(pointers.len(), 1, "all scopes observed the same singleton");
}

#[tokio::test]
async fn test_scoped_instances_dropped_with_scope() {
    common::init_test_logging();

    struct DropProbe {
        dropped: Arc<AtomicU32>,
    }
    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }

    let dropped = Arc::new(AtomicU32::new(0));
    let probe_counter = dropped.clone();

    let container = Container::new();
    container.register_factory("probe", Lifetime::Scoped, move |_| {
        Ok(DropProbe {
            dropped: probe_counter.clone(),
        })
    });

    {
        let scope = Scope::new();
        let _instance = container.resolve("probe", &scope).unwrap();
    }
    assert_eq!(
        dropped.load(Ordering::SeqCst),
        1,
        "scoped instance lives exactly as long as its scope"
    );
}
