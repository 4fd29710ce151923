use std::collections::HashMap;

use rand::rngs::StdRng;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::kind::{ArchSpec, ModelKind};
use crate::model::pixel::PixelDualHead;
use crate::model::ChangeModel;

/// Builds a model from its architecture parameters and the run's RNG.
pub type ModelConstructor = fn(&ArchSpec, &mut StdRng) -> Box<dyn ChangeModel>;

fn pixel_dual_head(spec: &ArchSpec, rng: &mut StdRng) -> Box<dyn ChangeModel> {
    Box::new(PixelDualHead::new(spec.clone(), rng))
}

/// Name → constructor lookup for the model kinds a config may select.
pub struct ModelRegistry {
    constructors: HashMap<ModelKind, ModelConstructor>,
}

impl ModelRegistry {
    /// A registry with no constructors.
    pub fn empty() -> ModelRegistry {
        ModelRegistry { constructors: HashMap::new() }
    }

    /// Binds every kind to the reference [`PixelDualHead`].
    pub fn with_defaults() -> ModelRegistry {
        let mut registry = ModelRegistry::empty();
        for kind in ModelKind::ALL {
            registry.register(kind, pixel_dual_head);
        }
        registry
    }

    /// Replaces the constructor for `kind`.
    pub fn register(&mut self, kind: ModelKind, constructor: ModelConstructor) {
        self.constructors.insert(kind, constructor);
    }

    /// Resolves `name` and constructs the model with `num_classes` outputs on
    /// the 2-D head. Unknown names and unbound kinds are fatal.
    pub fn build(&self, name: &str, num_classes: usize, rng: &mut StdRng) -> Result<Box<dyn ChangeModel>> {
        let kind: ModelKind = name.parse()?;
        let constructor = self
            .constructors
            .get(&kind)
            .ok_or_else(|| Error::model(format!("no constructor registered for {}", kind)))?;
        let spec = kind.arch_spec().with_classes(num_classes);
        info!(model = %kind, embed_dim = spec.embed_dim, classes = spec.output_nc, "Model selected");
        Ok(constructor(&spec, rng))
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        ModelRegistry::with_defaults()
    }
}
