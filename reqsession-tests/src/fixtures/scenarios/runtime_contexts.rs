#[cfg(test)]
mod tests {
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;

    use reqsession::Session;
    use serde_json::json;

    const PATH: &str = "scenarios/runtime_contexts";
    const WATCHDOG: Duration = Duration::from_secs(30);

    fn post_count(session: &Session, n: i64) -> i64 {
        session
            .post(PATH, &json!({ "n": n }))
            .unwrap()
            .find("body.n")
            .int()
    }

    /// Runs `calls` on a separate thread and fails instead of hanging when it stalls.
    fn with_watchdog(calls: impl FnOnce() -> Vec<i64> + Send + 'static) -> Vec<i64> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || tx.send(calls()));
        rx.recv_timeout(WATCHDOG)
            .expect("requests stalled across runtime contexts")
    }

    #[test]
    fn test_one_session_across_runtime_contexts() {
        let _handle = crate::add_hyper_fixture(PATH, crate::echo_handler);
        let session = Arc::new(crate::init_builder().unwrap().build().unwrap());

        let results = with_watchdog(move || {
            let mut results = vec![post_count(&session, 1)];

            let multi_thread = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();
            results.push(multi_thread.block_on(async { post_count(&session, 2) }));
            let spawned = Arc::clone(&session);
            results.push(
                multi_thread
                    .block_on(multi_thread.spawn(async move { post_count(&spawned, 3) }))
                    .unwrap(),
            );

            let current_thread = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            results.push(current_thread.block_on(async { post_count(&session, 4) }));
            results.push(multi_thread.block_on(async { post_count(&session, 5) }));
            results.push(post_count(&session, 6));
            results
        });

        assert_eq!(results, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_session_dropped_inside_runtime() {
        let _handle = crate::add_hyper_fixture(
            "scenarios/runtime_contexts/drop",
            crate::echo_handler,
        );
        let session = crate::init_builder().unwrap().build().unwrap();

        let results = with_watchdog(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let n = session
                    .post("scenarios/runtime_contexts/drop", &json!({"n": 7}))
                    .unwrap()
                    .find("body.n")
                    .int();
                drop(session);
                vec![n]
            })
        });

        assert_eq!(results, [7]);
    }
}
