use std::{
    future::Future,
    path::{Path, PathBuf},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::channel::oneshot;

use crate::model::Model;

/// Produces models from asset paths. Runs on worker threads.
pub trait AssetSource: Send + Sync + 'static {
    fn load(&self, path: &Path) -> anyhow::Result<Model>;
}

pub struct GltfFileSource;

impl AssetSource for GltfFileSource {
    fn load(&self, path: &Path) -> anyhow::Result<Model> {
        Model::load(path)
    }
}

/// Shared loader that parses assets on the rayon pool.
#[derive(Clone)]
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
}

impl AssetLoader {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }

    pub fn load(&self, path: impl Into<PathBuf>) -> PendingLoad {
        let path = path.into();
        let source = self.source.clone();
        let (sender, receiver) = oneshot::channel();

        rayon::spawn(move || {
            log::debug!("Loading asset {}", path.display());
            let result = source.load(&path);
            // The receiver may already be gone if nobody cares about the result anymore.
            let _ = sender.send(result);
        });

        PendingLoad { receiver }
    }
}

/// Completion handle for an in-flight load.
#[derive(Debug)]
pub struct PendingLoad {
    receiver: oneshot::Receiver<anyhow::Result<Model>>,
}

impl PendingLoad {
    /// Returns the result if the load has finished, without blocking.
    pub fn try_take(&mut self) -> Option<anyhow::Result<Model>> {
        match self.receiver.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(anyhow::anyhow!(
                "Asset load was dropped before it completed"
            ))),
        }
    }

    /// Blocks the current thread until the load finishes.
    pub fn wait(self) -> anyhow::Result<Model> {
        pollster::block_on(self)
    }
}

impl Future for PendingLoad {
    type Output = anyhow::Result<Model>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(anyhow::anyhow!(
                "Asset load was dropped before it completed"
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Hands out test triangles and fails on the configured call numbers.
    pub struct ScriptedSource {
        calls: AtomicUsize,
        failing_calls: Vec<usize>,
        pub requested_paths: Mutex<Vec<PathBuf>>,
    }

    impl ScriptedSource {
        pub fn succeeding() -> Arc<Self> {
            Self::failing_at(&[])
        }

        pub fn failing_at(calls: &[usize]) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failing_calls: calls.to_vec(),
                requested_paths: Mutex::new(Vec::new()),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AssetSource for ScriptedSource {
        fn load(&self, path: &Path) -> anyhow::Result<Model> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested_paths.lock().unwrap().push(path.to_owned());

            if self.failing_calls.contains(&call) {
                anyhow::bail!("Scripted failure on load #{call}");
            }

            let mut model = Model::test_triangle();
            model.name = format!("Load #{call}");
            Ok(model)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedSource;
    use super::*;

    #[test]
    fn load_resolves_with_model() {
        let loader = AssetLoader::new(ScriptedSource::succeeding());
        let model = loader.load("cube.glb").wait().unwrap();
        assert_eq!(model.name, "Load #0");
    }

    #[test]
    fn load_failure_fails_the_handle() {
        let loader = AssetLoader::new(ScriptedSource::failing_at(&[0]));
        let error = loader.load("cube.glb").wait().unwrap_err();
        assert!(error.to_string().contains("Scripted failure"));
    }

    #[test]
    fn try_take_eventually_yields_result() {
        let loader = AssetLoader::new(ScriptedSource::succeeding());
        let mut pending = loader.load("cube.glb");

        let result = loop {
            if let Some(result) = pending.try_take() {
                break result;
            }
            std::thread::yield_now();
        };

        assert!(result.is_ok());
    }

    #[test]
    fn gltf_source_reads_real_asset() {
        let loader = AssetLoader::new(Arc::new(GltfFileSource));
        let model = loader.load("assets/objects/cube.glb").wait().unwrap();
        assert_eq!(model.primitives.len(), 1);
    }
}
