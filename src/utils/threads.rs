use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// 以最大并发数`max_parallels`执行一组future
///
/// 返回结果与输入顺序一致，与各任务的完成先后无关。
pub async fn do_parallel_with_limit<F, T>(futures: Vec<F>, max_parallels: usize) -> Vec<T>
where
    F: Future<Output = T>,
{
    let semaphore = Arc::new(Semaphore::new(max_parallels.max(1)));

    let guarded = futures.into_iter().map(|fut| {
        let semaphore = semaphore.clone();
        async move {
            // 信号量从不关闭，acquire只会在关闭时失败
            let _permit = semaphore.acquire().await.ok();
            fut.await
        }
    });

    join_all(guarded).await
}
