//! The four interchangeable engines.

pub mod svm;
pub mod neural_network;
pub mod random_forest;
pub mod logistic_regression;

pub use logistic_regression::LogisticRegressionModel;
pub use neural_network::NeuralNetworkModel;
pub use random_forest::RandomForestModel;
pub use svm::SvmModel;
