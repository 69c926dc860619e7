//! Export of the comparison as a static artifact

pub mod dataset;
pub mod html;
pub mod writer;

pub use dataset::{
    select_players, CurveExport, DatasetBuilder, Divergence, ExportDataset, ModelExport,
    PlayerExport, ScenarioExport,
};
pub use html::{escape_script_json, render_html};
pub use writer::{render, write_dataset, write_atomically, OutputFormat};
