pub mod signal_classifier;
