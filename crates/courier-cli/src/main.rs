use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use courier_core::dispatch_service;
use courier_core::impls::InMemoryQueueProvider;
use courier_core::{CallContext, DispatchClientBuilder, DispatchConfig, DispatchError, QueueSubmitter};

#[derive(Debug, Serialize, Deserialize)]
struct Ping {
    user: String,
    message: String,
}

dispatch_service! {
    /// Demo notification service.
    trait Notifier => NotifierService {
        fn notify(ping: Ping);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 第 1 引数に DispatchConfig の JSON ファイルを渡せる（省略時はデフォルト）
fn load_config() -> Result<DispatchConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(DispatchConfig::from_json(&std::fs::read_to_string(path)?)?),
        None => Ok(DispatchConfig::default()),
    }
}

fn ping(user: &str, message: &str) -> Ping {
    Ping {
        user: user.to_string(),
        message: message.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // (A) プロバイダとクライアントを用意
    let config = load_config()?;
    let provider = Arc::new(InMemoryQueueProvider::new());
    let notifier = DispatchClientBuilder::<NotifierService>::from_config(config)
        .build(QueueSubmitter::new(provider.clone()))?;
    let queue = notifier.queue_name().to_string();

    // (B) バッチ外の呼び出し: 即時投入
    notifier.notify(ping("alice", "hello")).await?;

    // (C) バッチ: body が Ok で終わったときだけまとめて投入
    let cx = CallContext::new();
    cx.run_batched(|| async {
        notifier.within(&cx).notify(ping("bob", "first")).await?;
        notifier.within(&cx).notify(ping("carol", "second")).await?;
        Ok::<_, DispatchError>(())
    })
    .await?;

    // (D) 下流の実行側の代わりに、キューに入ったタスクを JSON で出す
    while let Some(task) = provider.pop(&queue, Duration::from_millis(50)).await? {
        println!("{}", serde_json::to_string(&task)?);
    }
    for submission in provider.submissions() {
        info!(queue = %submission.queue, tasks = submission.tasks, "provider accepted batch");
    }
    Ok(())
}
