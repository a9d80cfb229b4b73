pub mod bucket;
pub mod lexicon;
pub mod mention;
