//! Asynchronous asset loading.
//!
//! Mesh and environment data come from a host-provided [`AssetSource`]. An
//! [`AssetLoader`] runs the source on a worker thread and hands finished
//! payloads back over a channel; the view polls the channel at frame
//! boundaries and applies whatever has arrived. A scene renders fine before
//! any asset lands, so arrival order does not matter.
//!
//! Dropping the loader disconnects the channel. The worker notices on its
//! next send and exits; results for an unmounted scene are discarded.

use std::sync::mpsc;
use std::thread;

use crate::environment::EnvironmentImage;
use crate::error::AssetError;
use crate::model::MeshData;

/// Produces asset payloads by path.
///
/// Implementations decide what a path means: a file below some root, an
/// embedded resource, or procedural data. Mesh parsing is the source's
/// responsibility; the crate only defines the in-memory format.
pub trait AssetSource: Send {
    /// Load raw encoded bytes, e.g. a PNG environment map.
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>, AssetError>;

    /// Load and parse a mesh.
    fn load_mesh(&self, path: &str) -> Result<MeshData, AssetError>;
}

/// One asset the loader should fetch.
#[derive(Debug, Clone)]
pub enum AssetRequest {
    Mesh(String),
    Environment(String),
}

impl AssetRequest {
    fn path(&self) -> &str {
        match self {
            AssetRequest::Mesh(p) | AssetRequest::Environment(p) => p,
        }
    }
}

/// A finished asset payload.
pub enum AssetPayload {
    Mesh(MeshData),
    /// Decoded and prefiltered on the worker thread.
    Environment(EnvironmentImage),
}

/// A payload together with the path it was requested under.
pub struct AssetEvent {
    pub path: String,
    pub payload: AssetPayload,
}

/// Background asset fetcher.
pub struct AssetLoader {
    rx: mpsc::Receiver<AssetEvent>,
}

impl AssetLoader {
    /// Spawn a worker that serves `requests` from `source`.
    ///
    /// Failed requests are logged and skipped; later requests still run.
    pub fn spawn(source: Box<dyn AssetSource>, requests: Vec<AssetRequest>) -> Self {
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("vitrine-assets".into())
            .spawn(move || {
                for request in requests {
                    let result = match &request {
                        AssetRequest::Mesh(path) => source.load_mesh(path).map(|mesh| AssetEvent {
                            path: path.clone(),
                            payload: AssetPayload::Mesh(mesh),
                        }),
                        AssetRequest::Environment(path) => source
                            .load_bytes(path)
                            .and_then(|bytes| EnvironmentImage::decode(&bytes))
                            .map(|env| AssetEvent {
                                path: path.clone(),
                                payload: AssetPayload::Environment(env),
                            }),
                    };

                    match result {
                        Ok(event) => {
                            // Receiver gone means the scene unmounted.
                            if tx.send(event).is_err() {
                                return;
                            }
                        }
                        Err(e) => log::warn!("asset '{}' failed to load: {}", request.path(), e),
                    }
                }
            });

        if let Err(e) = spawned {
            log::warn!("failed to spawn asset worker: {}", e);
        }

        Self { rx }
    }

    /// Take the next finished asset, if any. Never blocks.
    pub fn poll(&mut self) -> Option<AssetEvent> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct StubSource;

    impl AssetSource for StubSource {
        fn load_bytes(&self, path: &str) -> Result<Vec<u8>, AssetError> {
            if path.ends_with(".png") {
                let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([40, 80, 120, 255]));
                let mut bytes = Vec::new();
                img.write_to(
                    &mut std::io::Cursor::new(&mut bytes),
                    image::ImageFormat::Png,
                )
                .map_err(AssetError::Decode)?;
                Ok(bytes)
            } else {
                Err(AssetError::Source(format!("unknown path {}", path)))
            }
        }

        fn load_mesh(&self, path: &str) -> Result<MeshData, AssetError> {
            if path == "missing" {
                return Err(AssetError::Source("mesh not found".into()));
            }
            Ok(MeshData {
                positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                normals: vec![[0.0, 0.0, 1.0]; 3],
                indices: vec![0, 1, 2],
            })
        }
    }

    fn wait_for_event(loader: &mut AssetLoader) -> AssetEvent {
        for _ in 0..400 {
            if let Some(event) = loader.poll() {
                return event;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("no asset event within timeout");
    }

    #[test]
    fn test_loader_delivers_mesh_and_environment() {
        let mut loader = AssetLoader::spawn(
            Box::new(StubSource),
            vec![
                AssetRequest::Mesh("portrait".into()),
                AssetRequest::Environment("studio.png".into()),
            ],
        );

        let first = wait_for_event(&mut loader);
        assert_eq!(first.path, "portrait");
        assert!(matches!(first.payload, AssetPayload::Mesh(_)));

        let second = wait_for_event(&mut loader);
        assert_eq!(second.path, "studio.png");
        match second.payload {
            AssetPayload::Environment(env) => assert_eq!(env.dimensions(), (2, 2)),
            _ => panic!("expected environment payload"),
        }
    }

    #[test]
    fn test_failed_request_is_skipped_not_fatal() {
        let mut loader = AssetLoader::spawn(
            Box::new(StubSource),
            vec![
                AssetRequest::Mesh("missing".into()),
                AssetRequest::Mesh("portrait".into()),
            ],
        );

        // The bad request produces no event; the next one still lands.
        let event = wait_for_event(&mut loader);
        assert_eq!(event.path, "portrait");
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_dropping_loader_detaches_worker() {
        let loader = AssetLoader::spawn(
            Box::new(StubSource),
            vec![AssetRequest::Mesh("portrait".into())],
        );
        drop(loader);
        // The worker exits on its next send; nothing to observe beyond
        // not panicking or hanging.
        thread::sleep(Duration::from_millis(20));
    }
}
