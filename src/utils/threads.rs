use futures::StreamExt;
use futures::stream;
use std::future::Future;

/// 以限定的并发度执行一组future，全部完成后返回
///
/// 返回结果按完成先后排列，与输入顺序无关；需要稳定顺序的调用方应当在结果中自带位置信息。
pub async fn do_parallel_with_limit<F, T>(futures: Vec<F>, max_concurrent: usize) -> Vec<T>
where
    F: Future<Output = T>,
{
    let limit = max_concurrent.max(1);
    stream::iter(futures)
        .buffer_unordered(limit)
        .collect::<Vec<T>>()
        .await
}
