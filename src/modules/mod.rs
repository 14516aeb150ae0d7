pub mod authors;
pub mod bookinstances;
pub mod books;
pub mod catalog;
pub mod genres;

use library_kernel::ModuleRegistry;
use serde::Serialize;

use crate::state::AppState;

/// Register all catalog modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) -> anyhow::Result<()> {
    registry.register(catalog::create_module(state.clone()))?;
    registry.register(authors::create_module(state.clone()))?;
    registry.register(books::create_module(state.clone()))?;
    registry.register(genres::create_module(state.clone()))?;
    registry.register(bookinstances::create_module(state.clone()))?;
    Ok(())
}

/// Records that have a canonical detail location.
pub trait Routable {
    fn url(&self) -> String;
}

/// A record serialized together with its detail location.
#[derive(Debug, Clone, Serialize)]
pub struct Linked<T> {
    #[serde(flatten)]
    pub record: T,
    pub url: String,
}

impl<T: Routable> Linked<T> {
    pub fn new(record: T) -> Self {
        let url = record.url();
        Self { record, url }
    }
}

pub fn linked<T: Routable>(records: Vec<T>) -> Vec<Linked<T>> {
    records.into_iter().map(Linked::new).collect()
}
