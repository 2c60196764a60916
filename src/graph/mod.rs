pub mod model_graph;

pub use model_graph::{EdgeSummary, GraphSummary, ModelGraph, TraceSummary};
