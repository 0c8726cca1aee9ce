use crate::core::camera::Camera;
use crate::core::engine::{MatrixEngine, MatrixOutcome, MatrixPair, VectorEngine, VectorOutcome};
use crate::core::event::EventBus;
use crate::core::history::{Confirm, FileStorage, HistoryStore, MemoryStorage, Storage};
use crate::core::prelude::*;
use crate::core::render::Renderer;
use crate::util::canvas::Canvas;

/// Everything one user works with, wired together: the engines report to the history and the
/// renderer through a shared [`EventBus`].
pub struct Session {
    settings: Settings,
    bus: UniqueShared<EventBus>,
    history: UniqueShared<HistoryStore>,
    renderer: UniqueShared<Renderer>,
    matrix_engine: MatrixEngine,
    vector_engine: VectorEngine,
    matrices: MatrixPair,
}

impl Session {
    pub fn new(settings: Settings, storage: Box<dyn Storage>) -> Self {
        let bus = UniqueShared::new(EventBus::new());
        let history = UniqueShared::new(HistoryStore::open(storage));
        let renderer = UniqueShared::new(Renderer::new(&settings));
        {
            let mut bus = bus.get();
            bus.subscribe_operations(history.clone());
            bus.subscribe_vector_updates(renderer.clone());
        }
        Self {
            settings,
            matrix_engine: MatrixEngine::new(bus.clone()),
            vector_engine: VectorEngine::new(bus.clone()),
            bus,
            history,
            renderer,
            matrices: MatrixPair::default(),
        }
    }

    /// A session whose history lives under `settings.data_dir`.
    pub fn open(settings: Settings) -> Self {
        let storage = FileStorage::new(&settings.data_dir);
        info!("history directory: {}", storage.dir().display());
        Self::new(settings, Box::new(storage))
    }

    pub fn in_memory(settings: Settings) -> Self {
        Self::new(settings, Box::new(MemoryStorage::new()))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    pub fn history(&self) -> &UniqueShared<HistoryStore> {
        &self.history
    }
    pub fn renderer(&self) -> &UniqueShared<Renderer> {
        &self.renderer
    }
    pub fn bus(&self) -> &UniqueShared<EventBus> {
        &self.bus
    }

    pub fn matrices(&self) -> &MatrixPair {
        &self.matrices
    }
    pub fn matrices_mut(&mut self) -> &mut MatrixPair {
        &mut self.matrices
    }

    pub fn vector_operation(&self, name: &str, a: Vec3, b: Vec3) -> Result<VectorOutcome> {
        self.vector_engine.perform(name, a, b)
    }

    pub fn matrix_operation(&self, name: &str) -> Result<MatrixOutcome> {
        self.matrix_engine.perform(name, &self.matrices)
    }

    /// Shows `a` and `b` without computing anything.
    pub fn show_vectors(&self, a: Vec3, b: Vec3) {
        self.vector_engine.show(a, b);
    }

    /// Loads a vector entry's operands and result back into the view. Returns `None` if `id` is
    /// unknown or not a vector entry.
    pub fn reuse(&self, id: u64) -> Option<VectorUpdate> {
        let update = self.history.get().reuse(id)?;
        self.bus.get().publish_vector_update(&update);
        Some(update)
    }

    pub fn clear_history(&self, confirm: &mut dyn Confirm) -> bool {
        self.history.get().clear(confirm)
    }

    /// Applies a camera interaction; see [`Renderer::with_camera`].
    pub fn camera(&self, f: impl FnOnce(&mut Camera) -> bool) -> bool {
        self.renderer.get().with_camera(f)
    }

    /// The most recently rendered frame.
    pub fn frame(&self) -> Canvas {
        self.renderer.get().canvas().clone()
    }
}
