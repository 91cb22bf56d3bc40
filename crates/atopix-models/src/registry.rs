//! Name → engine lookup.

use atopix_common::{AtopixError, Result};

use crate::engine::PredictionEngine;
use crate::engines::{LogisticRegressionModel, NeuralNetworkModel, RandomForestModel, SvmModel};

/// Advertised model names, in listing order.
pub const MODEL_NAMES: [&str; 4] = ["svm", "neural_network", "random_forest", "logistic_regression"];

pub struct ModelRegistry {
    engines: Vec<Box<dyn PredictionEngine>>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            engines: vec![
                Box::new(SvmModel),
                Box::new(NeuralNetworkModel),
                Box::new(RandomForestModel),
                Box::new(LogisticRegressionModel),
            ],
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    pub fn get(&self, name: &str) -> Result<&dyn PredictionEngine> {
        self.engines
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
            .ok_or_else(|| {
                AtopixError::validation(format!(
                    "Invalid model type '{}'. Must be one of: {}",
                    name,
                    self.names().join(", ")
                ))
            })
    }

    pub fn engines(&self) -> impl Iterator<Item = &dyn PredictionEngine> + '_ {
        self.engines.iter().map(|e| e.as_ref())
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry").field("models", &self.names()).finish()
    }
}
