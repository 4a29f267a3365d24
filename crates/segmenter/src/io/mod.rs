//! Reading and writing corpora, segmentations and models.
//!
//! Text formats (corpus, segmentation, edit report, word lists) live in
//! [`corpus`], [`output`] and [`maps`]; trained models are saved and loaded
//! through [`ModelSaver`] and [`ModelLoader`].

pub mod corpus;
pub mod format;
pub mod load;
pub mod maps;
pub mod output;
pub mod save;

pub use corpus::{parse_corpus, read_corpus, CorpusFormat};
pub use format::{ModelFormat, ModelHeader, FORMAT_VERSION};
pub use load::ModelLoader;
pub use maps::{
    extract_seg_maps, merge_word_lists, read_cognate_list, read_seg_maps, read_word_counts,
    write_merged, write_seg_maps, CognateCandidate, MergeConfig, MergedEntry, SegMaps,
};
pub use output::{
    format_segmentation, read_segmentations, save_segmentations, write_edit_report,
    write_segmentations,
};
pub use save::ModelSaver;
