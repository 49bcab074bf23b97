use super::*;
use price_hunter::models::{FailureKind, TaskEvent, TaskStatus};

fn fast_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        cooldown: Duration::ZERO,
        ..OrchestratorSettings::default()
    }
}

async fn collect_until_terminal(
    subscription: &mut price_hunter::core::Subscription,
) -> Vec<TaskEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_secs(5), subscription.recv()).await
    {
        let terminal = event.is_terminal();
        events.push(event);
        if terminal {
            break;
        }
    }
    events
}

#[tokio::test]
async fn test_run_all_event_stream() {
    let engine = Arc::new(priced_engine().with_delay(Duration::from_millis(20)));
    let probe = Arc::new(ScriptedProbe::new(true));
    let service = service_with_settings(fast_settings(), engine.clone(), probe);

    let task_id = service.start_search("rockerz", None).await.unwrap();
    let mut subscription = service.subscribe(&task_id).await;
    let events = collect_until_terminal(&mut subscription).await;

    let last = events.last().unwrap();
    assert_eq!(last.status, TaskStatus::Completed);
    assert_eq!(last.best.as_ref().unwrap().app, TargetApp::Amazon);
    assert_eq!(last.results.as_ref().unwrap().len(), 4);

    // Per-app completions arrive in priority order
    let completed: Vec<_> = events.iter().filter_map(|e| e.app_complete).collect();
    let expected: Vec<_> = TargetApp::PRIORITY
        .into_iter()
        .skip(TargetApp::PRIORITY.len() - completed.len())
        .collect();
    assert_eq!(completed, expected);

    assert_eq!(engine.calls().len(), 4);
    assert!(engine.calls().iter().all(|call| call.max_steps == 18));
}

#[tokio::test]
async fn test_device_unavailable_apps_are_not_attempted() {
    let engine = Arc::new(priced_engine());
    let probe = Arc::new(ScriptedProbe::new(false));
    let service = service_with_settings(fast_settings(), engine.clone(), probe);

    let task_id = service.start_search("rockerz", None).await.unwrap();
    assert!(wait_for_task(&service, &task_id).await);

    let task = service.get_task(&task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.best.is_none());
    for result in task.results.values() {
        assert!(!result.found);
        assert_eq!(result.error.as_deref(), Some("device disconnected"));
        assert_eq!(result.failure, Some(FailureKind::DeviceUnavailable));
    }
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_device_reconnect_between_runs() {
    let engine = Arc::new(priced_engine());
    let probe = Arc::new(ScriptedProbe::new(false));
    let service = service_with_settings(fast_settings(), engine.clone(), probe.clone());

    let task_id = service.start_search("rockerz", None).await.unwrap();
    assert!(wait_for_task(&service, &task_id).await);
    assert!(engine.calls().is_empty());

    probe.set_connected(true);
    let task_id = service.start_search("rockerz", None).await.unwrap();
    assert!(wait_for_task(&service, &task_id).await);
    assert!(service.get_task(&task_id).await.unwrap().best.is_some());
}

#[tokio::test]
async fn test_engine_failures_are_recorded_per_app() {
    let long_error = format!("LLM provider returned 429 {}", "retry later ".repeat(20));
    let engine = Arc::new(
        priced_engine()
            .fail(TargetApp::Amazon, &long_error)
            .reply(TargetApp::Zepto, "no results on screen"),
    );
    let service = service_with_settings(fast_settings(), engine, Arc::new(ScriptedProbe::new(true)));

    let task_id = service.start_search("rockerz", None).await.unwrap();
    assert!(wait_for_task(&service, &task_id).await);

    let task = service.get_task(&task_id).await.unwrap();
    let amazon = &task.results[&TargetApp::Amazon];
    assert!(!amazon.found);
    assert_eq!(amazon.failure, Some(FailureKind::AgentFailure));
    assert_eq!(amazon.error.as_ref().unwrap().chars().count(), 50);
    assert!(amazon.error.as_ref().unwrap().starts_with("LLM provider returned 429"));

    let zepto = &task.results[&TargetApp::Zepto];
    assert_eq!(zepto.error.as_deref(), Some("price not found"));

    // Best among the apps that did report a price
    let best = task.best.unwrap();
    assert_eq!(best.app, TargetApp::Flipkart);
    assert_eq!(best.price, "1299");
}

#[tokio::test]
async fn test_failed_order_ends_in_error() {
    let engine = Arc::new(ScriptedEngine::new().fail(TargetApp::Blinkit, "Checkout button not found"));
    let service = service_with_settings(fast_settings(), engine.clone(), Arc::new(ScriptedProbe::new(true)));

    let task_id = service.place_order("milk", TargetApp::Blinkit).await.unwrap();
    assert!(wait_for_task(&service, &task_id).await);

    let task = service.get_task(&task_id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Error);
    assert_eq!(task.message.as_deref(), Some("Checkout button not found"));

    let calls = engine.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].max_steps, 40);
    assert!(calls[0].script.contains("Cash on Delivery"));
}

#[tokio::test]
async fn test_concurrent_tasks_do_not_interfere() {
    let engine = Arc::new(priced_engine().with_delay(Duration::from_millis(5)));
    let service = service_with_settings(fast_settings(), engine, Arc::new(ScriptedProbe::new(true)));

    let mut ids = Vec::new();
    for product in ["soap", "milk", "headphones"] {
        ids.push(service.start_search(product, None).await.unwrap());
    }
    let order_id = service.place_order("pen", TargetApp::Amazon).await.unwrap();

    for id in &ids {
        assert!(wait_for_task(&service, id).await);
        let task = service.get_task(id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.results.len(), 4);
    }
    assert!(wait_for_task(&service, &order_id).await);
    assert_eq!(service.running_jobs().await, 0);
}

#[tokio::test]
async fn test_closed_subscriber_does_not_stop_the_run() {
    let engine = Arc::new(priced_engine().with_delay(Duration::from_millis(10)));
    let service = service_with_settings(fast_settings(), engine, Arc::new(ScriptedProbe::new(true)));

    let task_id = service.start_search("rockerz", None).await.unwrap();
    let dropped = service.subscribe(&task_id).await;
    let mut kept = service.subscribe(&task_id).await;
    drop(dropped);

    let events = collect_until_terminal(&mut kept).await;
    assert_eq!(events.last().unwrap().status, TaskStatus::Completed);
    assert_eq!(service.broadcaster().subscriber_count(&task_id).await, 1);

    service.unsubscribe(&task_id, kept.id).await;
    service.unsubscribe(&task_id, kept.id).await;
    assert_eq!(service.broadcaster().subscriber_count(&task_id).await, 0);
}

#[tokio::test]
async fn test_unsubscribe_mid_run_leaves_other_subscribers_intact() {
    let engine = Arc::new(priced_engine().with_delay(Duration::from_millis(50)));
    let service = service_with_settings(fast_settings(), engine, Arc::new(ScriptedProbe::new(true)));

    let task_id = service.start_search("rockerz", None).await.unwrap();
    let mut leaving = service.subscribe(&task_id).await;
    let mut kept = service.subscribe(&task_id).await;

    let poller = tokio::spawn({
        let service = service.clone();
        let task_id = task_id.clone();
        async move {
            let mut ranks = Vec::new();
            loop {
                let status = service.get_task(&task_id).await.unwrap().status;
                ranks.push(status.rank());
                if status.is_terminal() {
                    return ranks;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    });

    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), leaving.recv())
            .await
            .unwrap()
            .unwrap();
        if event.app_complete.is_some() {
            assert_eq!(event.app_complete, Some(TargetApp::Flipkart));
            break;
        }
    }
    service.unsubscribe(&task_id, leaving.id).await;

    // Only events queued before the unsubscribe remain, then the stream ends
    let leftover = tokio::time::timeout(Duration::from_secs(5), async {
        let mut events = Vec::new();
        while let Some(event) = leaving.recv().await {
            events.push(event);
        }
        events
    })
    .await
    .unwrap();
    assert!(leftover.iter().all(|e| !e.is_terminal() && e.app_complete.is_none()));
    assert!(leaving.recv().await.is_none());

    let events = collect_until_terminal(&mut kept).await;
    let completed: Vec<_> = events.iter().filter_map(|e| e.app_complete).collect();
    assert_eq!(completed, TargetApp::PRIORITY.to_vec());
    assert_eq!(events.last().unwrap().status, TaskStatus::Completed);
    assert_eq!(service.broadcaster().subscriber_count(&task_id).await, 1);

    let ranks = poller.await.unwrap();
    assert!(ranks.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(ranks.last(), Some(&TaskStatus::Completed.rank()));
}
