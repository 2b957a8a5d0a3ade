#[cfg(test)]
mod bridge_router_tests {
    use crate::common::mocks::ScriptedEngine;
    use crate::common::mount;
    use std::sync::Arc;
    use std::time::Duration;
    use video_bridge::{
        BridgeError, Config, EventRouter, NativeCommand, OperationKind, Source, TrimRange,
        VideoInfo, ViewHandle,
    };

    const VIEW_A: ViewHandle = ViewHandle::new(11);
    const VIEW_B: ViewHandle = ViewHandle::new(12);

    fn engine(router: &EventRouter) -> ScriptedEngine {
        ScriptedEngine::new(router.clone())
            .with_info(VIEW_A, VideoInfo::new(1920.0, 1080.0, 12.5))
            .with_info(VIEW_B, VideoInfo::new(640.0, 360.0, 3.0))
    }

    #[tokio::test]
    async fn test_each_view_gets_its_own_replies() {
        let router = EventRouter::new();
        let engine = Arc::new(engine(&router));
        let config = Config::default();

        let a = mount(engine.clone(), &router, VIEW_A, &config, "/media/a.mp4").await;
        let b = mount(engine.clone(), &router, VIEW_B, &config, "https://cdn.example.com/b.mp4").await;
        assert_eq!(router.views().await, vec![VIEW_A, VIEW_B]);

        let (info_a, info_b) = tokio::join!(a.handle.fetch_info(), b.handle.fetch_info());
        assert_eq!(info_a.unwrap(), VideoInfo::new(1920.0, 1080.0, 12.5));
        assert_eq!(info_b.unwrap(), VideoInfo::new(640.0, 360.0, 3.0));

        let props_b = engine.props_for(b.view).unwrap();
        assert!(props_b.source.unwrap().is_network);
    }

    #[tokio::test]
    async fn test_trim_sends_one_command_and_returns_new_source() {
        let router = EventRouter::new();
        let engine = Arc::new(engine(&router));
        let bridge = mount(engine.clone(), &router, VIEW_A, &Config::default(), "/media/a.mp4").await;

        let trimmed = bridge.handle.trim(TrimRange::new(1.5, 4.0)).await.unwrap();
        assert_eq!(trimmed, Source::from("file:///tmp/trim-11-1.5-4.mp4"));

        let dispatched = engine.dispatched();
        assert_eq!(dispatched.len(), 1);
        assert!(matches!(
            dispatched[0],
            (view, NativeCommand::Trim { start_time, end_time, .. })
                if view == VIEW_A && start_time == 1.5 && end_time == 4.0
        ));

        // The trimmed clip can be loaded back into the view
        bridge.handle.set_source(trimmed.clone()).await.unwrap();
        assert_eq!(bridge.handle.compress().await.unwrap(), trimmed);
    }

    #[tokio::test]
    async fn test_overlapping_previews_are_correlated() {
        let router = EventRouter::new();
        let engine = Arc::new(engine(&router));
        let bridge = mount(engine, &router, VIEW_A, &Config::default(), "/media/a.mp4").await;

        let (first, second) = tokio::join!(
            bridge.handle.extract_preview_frame(1.0),
            bridge.handle.extract_preview_frame(3.0)
        );
        assert_eq!(first.unwrap().get("second").unwrap(), 1.0);
        assert_eq!(second.unwrap().get("second").unwrap(), 3.0);
        assert_eq!(bridge.handle.pending(OperationKind::Preview).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_engine_without_request_ids() {
        let router = EventRouter::new();
        let engine = Arc::new(engine(&router).without_request_ids());
        let bridge = mount(engine, &router, VIEW_B, &Config::default(), "/media/b.mp4").await;

        let frame = bridge.handle.extract_preview_frame(0.0).await.unwrap();
        assert_eq!(frame.get("second").unwrap(), 0.0);
        assert_eq!(
            bridge.handle.fetch_info().await.unwrap(),
            VideoInfo::new(640.0, 360.0, 3.0)
        );
    }

    #[tokio::test]
    async fn test_native_failure_rejects_instead_of_hanging() {
        let router = EventRouter::new();
        let engine = Arc::new(engine(&router));
        engine.inject_failure(OperationKind::Trim, "unsupported codec");
        let bridge = mount(engine, &router, VIEW_A, &Config::default(), "/media/a.mp4").await;

        let err = bridge.handle.trim((0.0, 2.0)).await.unwrap_err();
        match err {
            BridgeError::NativeEngineFailure { operation, message } => {
                assert_eq!(operation, OperationKind::Trim);
                assert_eq!(message, "unsupported codec");
            }
            other => panic!("unexpected error {other:?}"),
        }

        // Other operation kinds are unaffected
        assert!(bridge.handle.fetch_info().await.is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_error_fails_the_call() {
        let router = EventRouter::new();
        // No info registered for this view
        let engine = Arc::new(ScriptedEngine::new(router.clone()));
        let bridge = mount(engine, &router, VIEW_A, &Config::default(), "/media/a.mp4").await;

        let err = bridge.handle.fetch_info().await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::NativeEngineFailure {
                operation: OperationKind::Info,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_router_rejects_malformed_and_unknown_envelopes() {
        let router = EventRouter::new();

        assert!(matches!(
            router.route_json("{not json").await,
            Err(BridgeError::MalformedEvent(_))
        ));
        let delivered = router
            .route_json(r#"{"view": 99, "type": "onTrimmedSource", "source": "file://x"}"#)
            .await
            .unwrap();
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_router_forgets_views_that_shut_down() {
        let router = EventRouter::new();
        let engine = Arc::new(engine(&router));
        let bridge = mount(engine, &router, VIEW_A, &Config::default(), "/media/a.mp4").await;

        bridge.handle.shutdown().await.unwrap();
        while bridge.handle.is_connected() {
            tokio::task::yield_now().await;
        }

        let delivered = router
            .route_json(r#"{"view": 11, "type": "onVideoProgress", "currentTime": 1.0}"#)
            .await
            .unwrap();
        assert!(!delivered);
        assert!(router.views().await.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_abandons_unanswered_calls() {
        let router = EventRouter::new();
        let engine = Arc::new(engine(&router));
        engine.go_silent();
        let bridge = mount(engine.clone(), &router, VIEW_A, &Config::default(), "/media/a.mp4").await;

        let pending = tokio::spawn({
            let handle = bridge.handle.clone();
            async move { handle.fetch_info().await }
        });
        while engine.dispatched().is_empty() {
            tokio::task::yield_now().await;
        }

        bridge.handle.shutdown().await.unwrap();
        assert!(matches!(
            pending.await.unwrap(),
            Err(BridgeError::Abandoned {
                operation: OperationKind::Info
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_timeout_applies() {
        let router = EventRouter::new();
        let engine = Arc::new(engine(&router));
        engine.go_silent();
        let config = Config::from_toml_str("[bridge]\nreply_timeout_secs = 2\n").unwrap();
        let bridge = mount(engine.clone(), &router, VIEW_A, &config, "/media/a.mp4").await;

        let err = bridge.handle.extract_preview_frame(5.0).await.unwrap_err();
        match err {
            BridgeError::Timeout { operation, after } => {
                assert_eq!(operation, OperationKind::Preview);
                assert_eq!(after, Duration::from_secs(2));
            }
            other => panic!("unexpected error {other:?}"),
        }
        // A timed-out caller is not counted as waiting
        assert_eq!(bridge.handle.pending(OperationKind::Preview).await.unwrap(), 0);
    }
}
