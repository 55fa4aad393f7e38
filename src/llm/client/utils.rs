use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::LLMConfig;
use crate::error::ResearchError;
use crate::llm::client::types::ModelTier;

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// 按档位选出模型名称
pub fn model_for_tier(llm_config: &LLMConfig, tier: ModelTier) -> &str {
    match tier {
        ModelTier::Efficient => &llm_config.model_efficient,
        ModelTier::Powerful => &llm_config.model_powerful,
    }
}

/// 将推理模型输出中的思考过程与正文分离，返回 (thinking, content)
///
/// 只认 `</think>` 结束标签：没有结束标签时整段都视为正文。
pub fn split_reasoning(raw: &str) -> (String, String) {
    match raw.split_once(THINK_CLOSE) {
        Some((thinking, content)) => {
            let thinking = thinking.trim();
            let thinking = thinking.strip_prefix(THINK_OPEN).unwrap_or(thinking);
            (thinking.trim().to_string(), content.trim().to_string())
        }
        None => (String::new(), raw.to_string()),
    }
}

/// 为单次调用加上超时限制
pub async fn with_timeout<T, Fut>(what: &str, seconds: u64, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_secs(seconds), fut).await {
        Ok(result) => result,
        Err(_) => Err(ResearchError::CallTimedOut {
            what: what.to_string(),
            seconds,
        }
        .into()),
    }
}

/// 通用重试逻辑：每次调用都受 `timeout_seconds` 限制，失败后固定间隔重试
pub async fn retry_with_backoff<T, F, Fut>(
    llm_config: &LLMConfig,
    what: &str,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_retries = llm_config.retry_attempts.max(1);
    let mut retries = 0;

    loop {
        match with_timeout(what, llm_config.timeout_seconds, operation()).await {
            Ok(result) => return Ok(result),
            Err(err) => {
                retries += 1;
                warn!(
                    call = what,
                    attempt = retries,
                    max_attempts = max_retries,
                    "model call failed: {:#}",
                    err
                );
                if retries >= max_retries {
                    return Err(err);
                }
                tokio::time::sleep(Duration::from_millis(llm_config.retry_delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(retry_attempts: u32) -> LLMConfig {
        LLMConfig {
            retry_attempts,
            retry_delay_ms: 0,
            timeout_seconds: 1,
            ..LLMConfig::default()
        }
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let err = with_timeout("compose (slow)", 1, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, anyhow::Error>("late")
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ResearchError>(),
            Some(ResearchError::CallTimedOut { seconds: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failure() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_with_backoff(&fast_config(3), "summarize", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(anyhow!("connection reset"))
            } else {
                Ok("summary")
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "summary");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_configured_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let err = retry_with_backoff(&fast_config(3), "review", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<String, _>(anyhow!("service unavailable"))
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(err.to_string().contains("service unavailable"));
    }

    #[tokio::test]
    async fn test_timed_out_attempts_are_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let err = retry_with_backoff(&fast_config(2), "compose", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, anyhow::Error>(())
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            err.downcast_ref::<ResearchError>(),
            Some(ResearchError::CallTimedOut { .. })
        ));
    }

    #[test]
    fn test_split_reasoning_with_trace() {
        let raw = "<think>\nweigh the sources first\n</think>\n\nTides are caused by gravity [1].";
        let (thinking, content) = split_reasoning(raw);

        assert_eq!(thinking, "weigh the sources first");
        assert_eq!(content, "Tides are caused by gravity [1].");
    }

    #[test]
    fn test_split_reasoning_without_trace() {
        let raw = "  plain answer  ";
        let (thinking, content) = split_reasoning(raw);

        assert!(thinking.is_empty());
        assert_eq!(content, raw);
    }

    #[test]
    fn test_split_reasoning_only_first_close_tag_counts() {
        let (thinking, content) = split_reasoning("a</think>b</think>c");

        assert_eq!(thinking, "a");
        assert_eq!(content, "b</think>c");
    }

    #[test]
    fn test_model_for_tier() {
        let config = LLMConfig::default();
        assert_eq!(
            model_for_tier(&config, ModelTier::Efficient),
            config.model_efficient
        );
        assert_eq!(
            model_for_tier(&config, ModelTier::Powerful),
            config.model_powerful
        );
    }
}
