pub mod formatter;
pub mod normalizer;
pub mod pricing;
pub mod view;
